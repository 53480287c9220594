//! Compile-time discovery of backend modules.
//!
//! Backend crates linked into the daemon announce themselves by adding a
//! [`LinkedModule`] entry to the [`BACKEND_MODULES`] distributed slice:
//!
//! ```ignore
//! #[linkme::distributed_slice(searchgate_registry::BACKEND_MODULES)]
//! static ES85: LinkedModule = LinkedModule {
//!     id: "elasticsearch-es85-plugin",
//!     description: "Elasticsearch 8.5 client",
//!     factory: es85::contribute,
//! };
//! ```
//!
//! The linker gathers every entry into one slice, so discovery needs no
//! runtime scanning. Slice order is unspecified; the loader sorts entries by
//! identifier to keep discovery order stable between builds.

use tracing::{info, warn};

use super::{
    BackendModule, Extension, ExtensionLoader, ModuleDescriptor, ModuleId, StaticExtensionLoader,
};
use crate::capability::{ConnectionCapability, SearchCapability, WriteCapability};

/// Context handed to module factories during discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleContext {
    plugin_dir: String,
}

impl ModuleContext {
    /// Builds a context rooted at `plugin_dir`.
    #[must_use]
    pub fn new(plugin_dir: impl Into<String>) -> Self {
        Self {
            plugin_dir: plugin_dir.into(),
        }
    }

    /// Configured plugin directory.
    #[must_use]
    pub fn plugin_dir(&self) -> &str {
        &self.plugin_dir
    }
}

/// Registration entry for a statically linked backend module.
#[derive(Debug)]
pub struct LinkedModule {
    /// Unique module identifier, matched against the version table.
    pub id: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// Populates the module's capabilities.
    pub factory: fn(BackendModule, &ModuleContext) -> BackendModule,
}

/// Every backend module linked into the current binary.
#[linkme::distributed_slice]
pub static BACKEND_MODULES: [LinkedModule] = [..];

/// Loader over the modules in [`BACKEND_MODULES`].
#[derive(Debug, Clone, Default)]
pub struct LinkedModuleLoader {
    inner: StaticExtensionLoader,
}

impl LinkedModuleLoader {
    /// Instantiates every linked module.
    #[must_use]
    pub fn discover(context: &ModuleContext) -> Self {
        Self::discover_from(&BACKEND_MODULES, context)
    }

    /// Instantiates the given entries.
    ///
    /// Entries sharing an identifier after the first are skipped with a
    /// warning, as are entries with a blank identifier.
    #[must_use]
    pub fn discover_from(entries: &[LinkedModule], context: &ModuleContext) -> Self {
        let mut sorted: Vec<&LinkedModule> = entries.iter().collect();
        sorted.sort_by_key(|entry| entry.id);

        let mut inner = StaticExtensionLoader::new();
        for entry in sorted {
            let module = (entry.factory)(BackendModule::new(entry.id), context);
            if module.id().as_str() != entry.id {
                warn!(
                    target: crate::REGISTRY_TARGET,
                    module = entry.id,
                    reported = %module.id(),
                    "module factory changed its identifier; skipping",
                );
                continue;
            }
            match inner.register(module) {
                Ok(()) => info!(
                    target: crate::REGISTRY_TARGET,
                    module = entry.id,
                    description = entry.description,
                    "discovered backend module",
                ),
                Err(error) => {
                    warn!(
                        target: crate::REGISTRY_TARGET,
                        module = entry.id,
                        %error,
                        "ignoring linked backend module",
                    );
                }
            }
        }
        Self { inner }
    }

    /// Identifiers and descriptions of every linked module.
    #[must_use]
    pub fn available() -> Vec<(&'static str, &'static str)> {
        let mut modules: Vec<_> = BACKEND_MODULES
            .iter()
            .map(|entry| (entry.id, entry.description))
            .collect();
        modules.sort_unstable();
        modules
    }

    /// Identifiers of the discovered modules in discovery order.
    #[must_use]
    pub fn module_ids(&self) -> Vec<ModuleId> {
        self.inner
            .loaded_modules()
            .into_iter()
            .map(|descriptor| descriptor.id().clone())
            .collect()
    }
}

impl ExtensionLoader for LinkedModuleLoader {
    fn loaded_modules(&self) -> Vec<ModuleDescriptor> {
        self.inner.loaded_modules()
    }

    fn connection_extensions(&self) -> Vec<Extension<dyn ConnectionCapability>> {
        self.inner.connection_extensions()
    }

    fn search_extensions(&self) -> Vec<Extension<dyn SearchCapability>> {
        self.inner.search_extensions()
    }

    fn write_extensions(&self) -> Vec<Extension<dyn WriteCapability>> {
        self.inner.write_extensions()
    }
}
