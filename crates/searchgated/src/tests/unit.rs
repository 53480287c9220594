//! Unit tests for bootstrap sequencing and teardown reporting.

use std::ffi::OsString;
use std::fs;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use rstest::rstest;
use tempfile::TempDir;

use searchgate_config::{Config, SocketEndpoint};
use searchgate_registry::test_support::{EventLog, FakeLifecycle};
use searchgate_registry::{BackendModule, StaticExtensionLoader};

use crate::bootstrap::{BootstrapError, ConfigLoader, StaticConfigLoader, bootstrap_with};
use crate::health::HealthReporter;
use crate::modules::PreloadedModules;
use crate::tests::support::{
    ES85, ES813, HealthEvent, RecordingHealthReporter, TestConfigLoader, full_module,
};

/// Points the socket below a regular file so its directory cannot exist.
struct BlockedSocketLoader {
    dir: TempDir,
}

impl BlockedSocketLoader {
    fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        fs::write(dir.path().join("blocker"), b"").expect("blocker file");
        Self { dir }
    }
}

impl ConfigLoader for BlockedSocketLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let path = self.dir.path().join("blocker/nested/searchgated.sock");
        Ok(Config {
            listen: SocketEndpoint::unix(path.to_str().expect("utf8 path").to_owned()),
            ..Config::default()
        })
    }
}

/// Resolves the layered configuration from a command line naming only the
/// listen socket.
struct CommandLineLoader {
    socket: TestConfigLoader,
}

impl ConfigLoader for CommandLineLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let listen = format!("unix://{}", self.socket.socket_path().display());
        Config::load_from_iter(["searchgated", "--listen", listen.as_str()].map(OsString::from))
    }
}

fn two_modules(log: &EventLog) -> StaticExtensionLoader {
    StaticExtensionLoader::new()
        .with_module(full_module(ES85, log))
        .and_then(|loader| loader.with_module(full_module(ES813, log)))
        .expect("modules register")
}

#[test]
fn reports_discovered_modules_and_routable_versions() {
    let log = EventLog::default();
    let reporter = Arc::new(RecordingHealthReporter::default());

    let gateway = bootstrap_with(
        &TestConfigLoader::new(),
        &PreloadedModules::new(two_modules(&log)),
        Arc::clone(&reporter) as Arc<dyn HealthReporter>,
    )
    .expect("bootstrap succeeds");

    assert_eq!(
        reporter.events(),
        vec![
            HealthEvent::BootstrapStarting,
            HealthEvent::RegistryBuilding(vec![ES85.to_owned(), ES813.to_owned()]),
            HealthEvent::RegistryReady(vec!["8.13".to_owned(), "8.5".to_owned()]),
            HealthEvent::BootstrapSucceeded,
        ]
    );
    assert_eq!(
        log.events(),
        vec![format!("connect:{ES85}"), format!("connect:{ES813}")]
    );
    assert!(gateway.registry().write_handler("8.13").is_ok());
}

#[test]
fn layered_defaults_bootstrap_without_other_settings() {
    let log = EventLog::default();
    let loader = CommandLineLoader {
        socket: TestConfigLoader::new(),
    };

    let gateway = bootstrap_with(
        &loader,
        &PreloadedModules::new(two_modules(&log)),
        Arc::new(RecordingHealthReporter::default()),
    )
    .expect("defaults are complete");

    let config = gateway.config();
    assert_eq!(config.backend_host, "localhost");
    assert_eq!(config.backend_port, 9200);
    assert_eq!(config.connect_timeout_ms, 5000);
    assert_eq!(
        config.listen().unix_path().map(|path| path.as_std_path().to_owned()),
        Some(loader.socket.socket_path())
    );
    assert_eq!(gateway.registry().available_versions().len(), 2);
}

#[test]
fn socket_preparation_failure_stops_connected_modules() {
    let log = EventLog::default();
    let reporter = Arc::new(RecordingHealthReporter::default());

    let error = bootstrap_with(
        &BlockedSocketLoader::new(),
        &PreloadedModules::new(two_modules(&log)),
        Arc::clone(&reporter) as Arc<dyn HealthReporter>,
    )
    .expect_err("socket directory cannot be created");

    assert!(matches!(error, BootstrapError::Socket { .. }), "{error:?}");
    assert_eq!(
        reporter.names(),
        vec![
            "bootstrap_starting",
            "registry_building",
            "registry_ready",
            "modules_stopping",
            "bootstrap_failed",
        ]
    );
    assert_eq!(log.count(&format!("stop:{ES85}")), 1);
    assert_eq!(log.count(&format!("stop:{ES813}")), 1);
}

#[test]
fn invalid_backend_settings_fail_before_discovery() {
    let log = EventLog::default();
    let loader = TestConfigLoader::new();
    let config = Config {
        backend_port: 0,
        ..loader.config()
    };

    let error = bootstrap_with(
        &StaticConfigLoader::new(config),
        &PreloadedModules::new(two_modules(&log)),
        Arc::new(RecordingHealthReporter::default()),
    )
    .expect_err("port zero is rejected");

    assert!(matches!(error, BootstrapError::ConnectionConfig { .. }));
    assert!(log.events().is_empty(), "no module should connect");
}

#[rstest]
#[case::clean(false, Vec::new())]
#[case::failing(true, vec![HealthEvent::ModuleStopFailed(ES85.to_owned())])]
fn stop_failures_reach_the_reporter(#[case] fail: bool, #[case] expected: Vec<HealthEvent>) {
    let log = EventLog::default();
    let lifecycle = if fail {
        FakeLifecycle::failing(ES85, log.clone())
    } else {
        FakeLifecycle::new(ES85, log.clone())
    };
    let loader = StaticExtensionLoader::new()
        .with_module(BackendModule::new(ES85).with_lifecycle(Arc::new(lifecycle)))
        .expect("module registers");
    let reporter = Arc::new(RecordingHealthReporter::default());
    let gateway = bootstrap_with(
        &TestConfigLoader::new(),
        &PreloadedModules::new(loader),
        Arc::clone(&reporter) as Arc<dyn HealthReporter>,
    )
    .expect("bootstrap succeeds");

    let summary = gateway.stop_modules();

    assert_eq!(summary.is_clean(), !fail);
    let after_stop: Vec<HealthEvent> = reporter
        .events()
        .into_iter()
        .skip_while(|event| *event != HealthEvent::ModulesStopping)
        .skip(1)
        .collect();
    assert_eq!(after_stop, expected);
}
