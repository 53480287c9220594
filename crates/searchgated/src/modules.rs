//! Discovery of the backend modules the gateway routes to.

use std::sync::Arc;

use searchgate_config::Config;
use searchgate_registry::{ExtensionLoader, LinkedModuleLoader, ModuleContext};

/// Produces the extension loader for a resolved configuration.
pub trait ModuleDiscovery: Send + Sync {
    /// Discovers the modules available under `config`.
    fn discover(&self, config: &Config) -> Arc<dyn ExtensionLoader>;
}

/// Discovers modules linked into the binary through `BACKEND_MODULES`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinkedModuleDiscovery;

impl ModuleDiscovery for LinkedModuleDiscovery {
    fn discover(&self, config: &Config) -> Arc<dyn ExtensionLoader> {
        let context = ModuleContext::new(config.plugin_dir());
        Arc::new(LinkedModuleLoader::discover(&context))
    }
}

/// Hands out a loader assembled ahead of time, ignoring configuration.
#[derive(Clone)]
pub struct PreloadedModules {
    loader: Arc<dyn ExtensionLoader>,
}

impl PreloadedModules {
    /// Wraps an existing loader.
    #[must_use]
    pub fn new(loader: impl ExtensionLoader + 'static) -> Self {
        Self {
            loader: Arc::new(loader),
        }
    }
}

impl ModuleDiscovery for PreloadedModules {
    fn discover(&self, _config: &Config) -> Arc<dyn ExtensionLoader> {
        Arc::clone(&self.loader)
    }
}
