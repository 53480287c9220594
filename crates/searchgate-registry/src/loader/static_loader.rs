//! In-process loader assembled from statically linked backend modules.

use std::sync::Arc;

use super::{
    Extension, ExtensionLoader, LoaderError, ModuleDescriptor, ModuleId, ModuleLifecycle,
};
use crate::capability::{
    CapabilityKind, ConnectionCapability, SearchCapability, WriteCapability,
};

/// Backend module contributed to a [`StaticExtensionLoader`].
///
/// ```
/// use std::sync::Arc;
/// use searchgate_registry::BackendModule;
/// # use searchgate_config::ConnectionConfig;
/// # use searchgate_registry::{ConnectionCapability, ConnectionError};
/// # struct Client;
/// # impl ConnectionCapability for Client {
/// #     fn connect(&self, _: &ConnectionConfig) -> Result<(), ConnectionError> { Ok(()) }
/// # }
///
/// let module = BackendModule::new("elasticsearch-es85-plugin")
///     .with_connection(Arc::new(Client));
/// assert_eq!(module.id().as_str(), "elasticsearch-es85-plugin");
/// ```
#[derive(Debug, Clone)]
pub struct BackendModule {
    id: ModuleId,
    connections: Vec<Arc<dyn ConnectionCapability>>,
    searches: Vec<Arc<dyn SearchCapability>>,
    writes: Vec<Arc<dyn WriteCapability>>,
    lifecycle: Option<Arc<dyn ModuleLifecycle>>,
}

impl BackendModule {
    /// Starts an empty module with the given identifier.
    #[must_use]
    pub fn new(id: impl Into<ModuleId>) -> Self {
        Self {
            id: id.into(),
            connections: Vec::new(),
            searches: Vec::new(),
            writes: Vec::new(),
            lifecycle: None,
        }
    }

    /// Adds a connection capability.
    #[must_use]
    pub fn with_connection(mut self, capability: Arc<dyn ConnectionCapability>) -> Self {
        self.connections.push(capability);
        self
    }

    /// Adds a search capability.
    #[must_use]
    pub fn with_search(mut self, capability: Arc<dyn SearchCapability>) -> Self {
        self.searches.push(capability);
        self
    }

    /// Adds a write capability.
    #[must_use]
    pub fn with_write(mut self, capability: Arc<dyn WriteCapability>) -> Self {
        self.writes.push(capability);
        self
    }

    /// Installs the module's shutdown hook.
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
}

/// Loader over modules registered in process.
///
/// Extensions are reported in registration order: every capability of the
/// first module, then the second, followed by any unattributed extensions.
#[derive(Debug, Clone, Default)]
pub struct StaticExtensionLoader {
    modules: Vec<BackendModule>,
    unattributed_connections: Vec<Arc<dyn ConnectionCapability>>,
    unattributed_searches: Vec<Arc<dyn SearchCapability>>,
    unattributed_writes: Vec<Arc<dyn WriteCapability>>,
}

impl StaticExtensionLoader {
    /// Creates an empty loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a backend module.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::DuplicateModule`] when a module with the same
    /// identifier is already registered and [`LoaderError::EmptyModuleId`]
    /// for a blank identifier.
    pub fn register(&mut self, module: BackendModule) -> Result<(), LoaderError> {
        if module.id.as_str().trim().is_empty() {
            return Err(LoaderError::EmptyModuleId);
        }
        if self.contains(&module.id) {
            return Err(LoaderError::DuplicateModule(module.id));
        }
        self.modules.push(module);
        Ok(())
    }

    /// Builder-style variant of [`Self::register`].
    ///
    /// # Errors
    ///
    /// Propagates the [`LoaderError`] from [`Self::register`].
    pub fn with_module(mut self, module: BackendModule) -> Result<Self, LoaderError> {
        self.register(module)?;
        Ok(self)
    }

    /// Adds a connection capability with no owning module.
    #[must_use]
    pub fn with_unattributed_connection(
        mut self,
        capability: Arc<dyn ConnectionCapability>,
    ) -> Self {
        self.unattributed_connections.push(capability);
        self
    }

    /// Adds a search capability with no owning module.
    #[must_use]
    pub fn with_unattributed_search(mut self, capability: Arc<dyn SearchCapability>) -> Self {
        self.unattributed_searches.push(capability);
        self
    }

    /// Adds a write capability with no owning module.
    #[must_use]
    pub fn with_unattributed_write(mut self, capability: Arc<dyn WriteCapability>) -> Self {
        self.unattributed_writes.push(capability);
        self
    }

    /// Returns `true` when a module with `id` is registered.
    #[must_use]
    pub fn contains(&self, id: &ModuleId) -> bool {
        self.modules.iter().any(|module| &module.id == id)
    }
}

fn collect<T: ?Sized>(
    kind: CapabilityKind,
    modules: &[BackendModule],
    select: impl Fn(&BackendModule) -> &[Arc<T>],
    unattributed: &[Arc<T>],
) -> Vec<Extension<T>> {
    let owned = modules.iter().flat_map(|module| {
        select(module).iter().enumerate().map(move |(index, instance)| {
            Extension::owned(
                Arc::clone(instance),
                module.id.clone(),
                format!("{}/{kind}#{index}", module.id),
            )
        })
    });
    let orphans = unattributed.iter().enumerate().map(|(index, instance)| {
        Extension::unattributed(Arc::clone(instance), format!("unattributed/{kind}#{index}"))
    });
    owned.chain(orphans).collect()
}

impl ExtensionLoader for StaticExtensionLoader {
    fn loaded_modules(&self) -> Vec<ModuleDescriptor> {
        self.modules
            .iter()
            .map(|module| ModuleDescriptor {
                id: module.id.clone(),
                lifecycle: module.lifecycle.clone(),
            })
            .collect()
    }

    fn connection_extensions(&self) -> Vec<Extension<dyn ConnectionCapability>> {
        collect(
            CapabilityKind::Connection,
            &self.modules,
            |module| module.connections.as_slice(),
            &self.unattributed_connections,
        )
    }

    fn search_extensions(&self) -> Vec<Extension<dyn SearchCapability>> {
        collect(
            CapabilityKind::Search,
            &self.modules,
            |module| module.searches.as_slice(),
            &self.unattributed_searches,
        )
    }

    fn write_extensions(&self) -> Vec<Extension<dyn WriteCapability>> {
        collect(
            CapabilityKind::Write,
            &self.modules,
            |module| module.writes.as_slice(),
            &self.unattributed_writes,
        )
    }
}
