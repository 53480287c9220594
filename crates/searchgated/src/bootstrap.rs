//! Gateway bootstrap: configuration, telemetry and the service registry.

use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;

use searchgate_config::{Config, ConnectionConfigError, SocketPreparationError};
use searchgate_registry::{
    ExtensionLoader, ModuleId, RegistryError, ServiceRegistry, StopSummary,
    VersionResolver, stop_modules,
};

use crate::health::HealthReporter;
use crate::modules::ModuleDiscovery;
use crate::telemetry::{self, TelemetryError};

/// Source of the gateway configuration.
pub trait ConfigLoader: Send + Sync {
    /// Loads the configuration.
    ///
    /// # Errors
    ///
    /// Returns the loader's error when no configuration can be assembled.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loads layered configuration from defaults, files, environment and CLI.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Returns a configuration that has already been resolved.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps `config`.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Reasons bootstrap aborts.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// The tracing subscriber could not be installed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// Backend connection parameters were rejected.
    #[error("invalid backend connection settings: {source}")]
    ConnectionConfig {
        /// Validation error.
        #[source]
        source: ConnectionConfigError,
    },
    /// A backend module failed to connect.
    #[error("failed to build the service registry: {source}")]
    Registry {
        /// Registry construction error.
        #[source]
        source: RegistryError,
    },
    /// The listening socket's directory could not be prepared.
    #[error("failed to prepare gateway socket: {source}")]
    Socket {
        /// Filesystem error.
        #[source]
        source: SocketPreparationError,
    },
}

/// A bootstrapped gateway, ready to bind its listener.
pub struct Gateway {
    config: Config,
    registry: Arc<ServiceRegistry>,
    modules: Arc<dyn ExtensionLoader>,
    reporter: Arc<dyn HealthReporter>,
}

impl Gateway {
    /// Resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Routable registry shared with request handlers.
    #[must_use]
    pub const fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    /// Runs every module's shutdown hook, reporting failures.
    #[must_use]
    pub fn stop_modules(&self) -> StopSummary {
        shut_down(self.modules.as_ref(), self.reporter.as_ref())
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Gateway")
            .field("listen", self.config.listen())
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Bootstraps the gateway with the built-in version table.
///
/// Steps run in order: load configuration, install telemetry, validate the
/// connection settings, discover modules and build the registry, then
/// prepare the socket directory. The reporter sees every outcome.
///
/// # Errors
///
/// Returns the first [`BootstrapError`] encountered. Once modules have been
/// discovered, a registry or socket failure stops them before returning.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    discovery: &dyn ModuleDiscovery,
    reporter: Arc<dyn HealthReporter>,
) -> Result<Gateway, BootstrapError> {
    reporter.bootstrap_starting();
    let outcome = assemble(loader, discovery, reporter.as_ref());
    match outcome {
        Ok((config, registry, modules)) => {
            reporter.bootstrap_succeeded(&config);
            Ok(Gateway {
                config,
                registry: Arc::new(registry),
                modules,
                reporter,
            })
        }
        Err(error) => {
            reporter.bootstrap_failed(&error);
            Err(error)
        }
    }
}

type Assembled = (Config, ServiceRegistry, Arc<dyn ExtensionLoader>);

fn assemble(
    loader: &dyn ConfigLoader,
    discovery: &dyn ModuleDiscovery,
    reporter: &dyn HealthReporter,
) -> Result<Assembled, BootstrapError> {
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;
    telemetry::initialise(&config).map_err(|source| BootstrapError::Telemetry { source })?;
    let connection = config
        .connection_config()
        .map_err(|source| BootstrapError::ConnectionConfig { source })?;

    let modules = discovery.discover(&config);
    let ids: Vec<ModuleId> = modules
        .loaded_modules()
        .into_iter()
        .map(|descriptor| descriptor.id().clone())
        .collect();
    reporter.registry_building(&ids);

    let registry =
        match ServiceRegistry::build(modules.as_ref(), &VersionResolver::builtin(), &connection) {
            Ok(registry) => registry,
            Err(source) => {
                let _summary = shut_down(modules.as_ref(), reporter);
                return Err(BootstrapError::Registry { source });
            }
        };
    reporter.registry_ready(&registry);

    if let Err(source) = config.listen().prepare_filesystem() {
        let _summary = shut_down(modules.as_ref(), reporter);
        return Err(BootstrapError::Socket { source });
    }

    Ok((config, registry, modules))
}

#[must_use]
pub(crate) fn shut_down(
    modules: &dyn ExtensionLoader,
    reporter: &dyn HealthReporter,
) -> StopSummary {
    reporter.modules_stopping();
    let summary = stop_modules(modules);
    for (module, error) in &summary.failures {
        reporter.module_stop_failed(module, error);
    }
    summary
}
