//! Discovery of backend modules and their capability extensions.
//!
//! The registry never inspects how modules are found. It sees them through
//! the narrow [`ExtensionLoader`] interface: a list of loaded module
//! descriptors and, per capability kind, the discovered extensions paired
//! with the module that contributed them. Extensions whose origin cannot be
//! established carry no owner and are skipped by the registry.

mod linked;
mod static_loader;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::capability::{ConnectionCapability, SearchCapability, WriteCapability};
use crate::failure::backend_failure;

pub use linked::{BACKEND_MODULES, LinkedModule, LinkedModuleLoader, ModuleContext};
pub use static_loader::{BackendModule, StaticExtensionLoader};

/// Unique identifier of a loaded backend module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(String);

impl ModuleId {
    /// Wraps an identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl From<&str> for ModuleId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ModuleId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

backend_failure!(
    /// Error raised when a module fails to shut down cleanly.
    ModuleStopError
);

/// Shutdown hook exposed by modules that hold resources.
pub trait ModuleLifecycle: Send + Sync {
    /// Releases the module's resources.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleStopError`] when teardown fails. Callers log the
    /// failure and carry on stopping the remaining modules.
    fn stop(&self) -> Result<(), ModuleStopError>;
}

impl fmt::Debug for dyn ModuleLifecycle {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("ModuleLifecycle")
    }
}

/// Loaded module as reported by a loader.
#[derive(Debug, Clone)]
pub struct ModuleDescriptor {
    id: ModuleId,
    lifecycle: Option<Arc<dyn ModuleLifecycle>>,
}

impl ModuleDescriptor {
    /// Describes a module without a shutdown hook.
    #[must_use]
    pub fn new(id: impl Into<ModuleId>) -> Self {
        Self {
            id: id.into(),
            lifecycle: None,
        }
    }

    /// Attaches a shutdown hook.
    #[must_use]
    pub fn with_lifecycle(mut self, lifecycle: Arc<dyn ModuleLifecycle>) -> Self {
        self.lifecycle = Some(lifecycle);
        self
    }

    /// Module identifier.
    #[must_use]
    pub const fn id(&self) -> &ModuleId {
        &self.id
    }

    /// Shutdown hook, when the module registered one.
    #[must_use]
    pub const fn lifecycle(&self) -> Option<&Arc<dyn ModuleLifecycle>> {
        self.lifecycle.as_ref()
    }
}

/// Capability instance paired with the module that contributed it.
#[derive(Debug)]
pub struct Extension<T: ?Sized> {
    instance: Arc<T>,
    owner: Option<ModuleId>,
    label: String,
}

impl<T: ?Sized> Extension<T> {
    /// Extension attributed to `owner`.
    #[must_use]
    pub fn owned(instance: Arc<T>, owner: ModuleId, label: impl Into<String>) -> Self {
        Self {
            instance,
            owner: Some(owner),
            label: label.into(),
        }
    }

    /// Extension whose contributing module is unknown.
    #[must_use]
    pub fn unattributed(instance: Arc<T>, label: impl Into<String>) -> Self {
        Self {
            instance,
            owner: None,
            label: label.into(),
        }
    }

    /// Shared handle to the capability instance.
    #[must_use]
    pub const fn instance(&self) -> &Arc<T> {
        &self.instance
    }

    /// Owning module, if known.
    #[must_use]
    pub const fn owner(&self) -> Option<&ModuleId> {
        self.owner.as_ref()
    }

    /// Diagnostic label used in log lines.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl<T: ?Sized> Clone for Extension<T> {
    fn clone(&self) -> Self {
        Self {
            instance: Arc::clone(&self.instance),
            owner: self.owner.clone(),
            label: self.label.clone(),
        }
    }
}

/// Source of backend modules and their capability extensions.
///
/// Each enumeration returns extensions in discovery order; the registry
/// connects and indexes them in that order.
pub trait ExtensionLoader: Send + Sync {
    /// Modules currently loaded.
    fn loaded_modules(&self) -> Vec<ModuleDescriptor>;

    /// Discovered connection capabilities.
    fn connection_extensions(&self) -> Vec<Extension<dyn ConnectionCapability>>;

    /// Discovered search capabilities.
    fn search_extensions(&self) -> Vec<Extension<dyn SearchCapability>>;

    /// Discovered write capabilities.
    fn write_extensions(&self) -> Vec<Extension<dyn WriteCapability>>;
}

/// Errors raised while assembling a loader.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoaderError {
    /// Two modules claimed the same identifier.
    #[error("backend module '{0}' is already registered")]
    DuplicateModule(ModuleId),
    /// A module identifier was empty.
    #[error("backend module identifiers must not be empty")]
    EmptyModuleId,
}
