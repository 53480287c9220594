//! Lifecycle events surfaced to operators.

use std::sync::Arc;

use searchgate_config::Config;
use searchgate_registry::{ModuleId, ModuleStopError, ServiceRegistry};

use crate::bootstrap::BootstrapError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer notified as the gateway starts and stops.
pub trait HealthReporter: Send + Sync {
    /// Bootstrap is about to load configuration.
    fn bootstrap_starting(&self);

    /// Bootstrap finished and the gateway is about to listen.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Bootstrap aborted.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Backend modules were discovered and are about to connect.
    fn registry_building(&self, modules: &[ModuleId]);

    /// Every module connected and the registry is routable.
    fn registry_ready(&self, registry: &ServiceRegistry);

    /// Module teardown is starting.
    fn modules_stopping(&self);

    /// A module's shutdown hook reported an error.
    fn module_stop_failed(&self, module: &ModuleId, error: &ModuleStopError);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn registry_building(&self, modules: &[ModuleId]) {
        (**self).registry_building(modules);
    }

    fn registry_ready(&self, registry: &ServiceRegistry) {
        (**self).registry_ready(registry);
    }

    fn modules_stopping(&self) {
        (**self).modules_stopping();
    }

    fn module_stop_failed(&self, module: &ModuleId, error: &ModuleStopError) {
        (**self).module_stop_failed(module, error);
    }
}

/// Reporter that writes each event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting gateway bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            listen = %config.listen(),
            backend = %format_args!(
                "{}://{}:{}",
                config.backend_scheme,
                config.backend_host,
                config.backend_port
            ),
            "gateway bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "gateway bootstrap failed"
        );
    }

    fn registry_building(&self, modules: &[ModuleId]) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "registry_building",
            modules = ?modules.iter().map(ModuleId::as_str).collect::<Vec<_>>(),
            "connecting backend modules"
        );
        if modules.is_empty() {
            tracing::warn!(
                target: HEALTH_TARGET,
                event = "registry_building",
                "no backend modules were discovered; every version will be rejected"
            );
        }
    }

    fn registry_ready(&self, registry: &ServiceRegistry) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "registry_ready",
            versions = ?registry.available_versions(),
            skipped = registry.skipped().len(),
            "service registry is routable"
        );
    }

    fn modules_stopping(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "modules_stopping",
            "stopping backend modules"
        );
    }

    fn module_stop_failed(&self, module: &ModuleId, error: &ModuleStopError) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "module_stop_failed",
            module = %module,
            error = %error,
            "backend module did not stop cleanly"
        );
    }
}
