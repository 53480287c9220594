//! Loaders, reporters and modules shared by the gateway test suites.

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use ortho_config::{OrthoConfig, OrthoError};
use tempfile::TempDir;

use searchgate_config::{Config, SocketEndpoint};
use searchgate_registry::test_support::{
    EventLog, FakeConnection, FakeLifecycle, FakeSearch, FakeWrite,
};
use searchgate_registry::{BackendModule, ModuleId, ModuleStopError, ServiceRegistry};

use crate::bootstrap::{BootstrapError, ConfigLoader};
use crate::health::HealthReporter;

pub(crate) const ES85: &str = "elasticsearch-es85-plugin";
pub(crate) const ES813: &str = "elasticsearch-es813-plugin";

/// Serves a default configuration listening under a private temp dir.
pub(crate) struct TestConfigLoader {
    socket_dir: TempDir,
}

impl TestConfigLoader {
    pub(crate) fn new() -> Self {
        Self {
            socket_dir: TempDir::new().expect("socket temp dir"),
        }
    }

    pub(crate) fn socket_path(&self) -> PathBuf {
        self.socket_dir.path().join("searchgated.sock")
    }

    pub(crate) fn config(&self) -> Config {
        Config {
            listen: SocketEndpoint::unix(
                self.socket_path()
                    .to_str()
                    .expect("utf8 socket path")
                    .to_owned(),
            ),
            ..Config::default()
        }
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config())
    }
}

/// Fails the way a bad `--listen` flag does.
pub(crate) struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_iter(vec![
            OsString::from("searchgated"),
            OsString::from("--listen"),
            OsString::from("invalid://socket"),
        ])
    }
}

/// Health events in the order they were reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    RegistryBuilding(Vec<String>),
    RegistryReady(Vec<String>),
    ModulesStopping,
    ModuleStopFailed(String),
}

impl HealthEvent {
    pub(crate) const fn name(&self) -> &'static str {
        match self {
            Self::BootstrapStarting => "bootstrap_starting",
            Self::BootstrapSucceeded => "bootstrap_succeeded",
            Self::BootstrapFailed(_) => "bootstrap_failed",
            Self::RegistryBuilding(_) => "registry_building",
            Self::RegistryReady(_) => "registry_ready",
            Self::ModulesStopping => "modules_stopping",
            Self::ModuleStopFailed(_) => "module_stop_failed",
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    pub(crate) fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(HealthEvent::name).collect()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn registry_building(&self, modules: &[ModuleId]) {
        self.record(HealthEvent::RegistryBuilding(
            modules.iter().map(ToString::to_string).collect(),
        ));
    }

    fn registry_ready(&self, registry: &ServiceRegistry) {
        self.record(HealthEvent::RegistryReady(
            registry.available_versions().into_iter().collect(),
        ));
    }

    fn modules_stopping(&self) {
        self.record(HealthEvent::ModulesStopping);
    }

    fn module_stop_failed(&self, module: &ModuleId, _error: &ModuleStopError) {
        self.record(HealthEvent::ModuleStopFailed(module.to_string()));
    }
}

/// Module with every capability and a shutdown hook, all logging to `log`.
pub(crate) fn full_module(id: &str, log: &EventLog) -> BackendModule {
    BackendModule::new(id)
        .with_connection(Arc::new(FakeConnection::new(id, log.clone())))
        .with_search(Arc::new(FakeSearch::new(id)))
        .with_write(Arc::new(FakeWrite::new(id)))
        .with_lifecycle(Arc::new(FakeLifecycle::new(id, log.clone())))
}

/// Like [`full_module`] but its connection is refused.
pub(crate) fn unreachable_module(id: &str, log: &EventLog) -> BackendModule {
    BackendModule::new(id)
        .with_connection(Arc::new(FakeConnection::failing(
            id,
            "connection refused",
            log.clone(),
        )))
        .with_search(Arc::new(FakeSearch::new(id)))
        .with_lifecycle(Arc::new(FakeLifecycle::new(id, log.clone())))
}
