//! Gateway process lifecycle.
//!
//! [`run_gateway`] bootstraps the gateway, serves requests until the
//! [`ShutdownSignal`] fires, then stops the listener and, once its accept
//! thread has exited, every backend module.

mod shutdown;

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::bootstrap::{BootstrapError, ConfigLoader, Gateway, SystemConfigLoader, bootstrap_with};
use crate::dispatch::DispatchConnectionHandler;
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::modules::{LinkedModuleDiscovery, ModuleDiscovery};
use crate::transport::{GatewayListener, ListenerError};

pub use self::shutdown::{ShutdownError, ShutdownSignal, SystemShutdownSignal};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

/// Reasons the gateway process exits with an error.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Bootstrap failed before the listener was bound.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    /// The listener could not be bound or its thread panicked.
    #[error("gateway listener failed: {0}")]
    Listener(#[from] ListenerError),
    /// Waiting for the shutdown signal failed.
    #[error(transparent)]
    Shutdown(#[from] ShutdownError),
}

/// Runs the gateway with the system configuration, the modules linked into
/// the binary and signal-driven shutdown.
///
/// # Errors
///
/// See [`run_gateway`].
pub fn run() -> Result<(), LaunchError> {
    run_gateway(
        &SystemConfigLoader,
        &LinkedModuleDiscovery,
        Arc::new(StructuredHealthReporter::new()),
        &SystemShutdownSignal::new(),
    )
}

/// Bootstraps, serves until `shutdown` returns, then tears down.
///
/// Modules are stopped whenever bootstrap succeeded, including when binding
/// the listener fails, and always after the listener thread has been joined.
///
/// # Errors
///
/// Returns [`LaunchError`] for bootstrap, listener or signal failures. When
/// both waiting and joining fail, the wait error is reported.
pub fn run_gateway(
    loader: &dyn ConfigLoader,
    discovery: &dyn ModuleDiscovery,
    reporter: Arc<dyn HealthReporter>,
    shutdown: &dyn ShutdownSignal,
) -> Result<(), LaunchError> {
    let gateway = bootstrap_with(loader, discovery, reporter)?;
    let served = serve(&gateway, shutdown);
    let summary = gateway.stop_modules();
    if summary.is_clean() {
        info!(
            target: PROCESS_TARGET,
            stopped = summary.stopped.len(),
            "shutdown sequence completed"
        );
    } else {
        warn!(
            target: PROCESS_TARGET,
            stopped = summary.stopped.len(),
            failed = summary.failures.len(),
            "shutdown sequence completed with module failures"
        );
    }
    served
}

fn serve(gateway: &Gateway, shutdown: &dyn ShutdownSignal) -> Result<(), LaunchError> {
    let endpoint = gateway.config().listen();
    let listener = GatewayListener::bind(endpoint)?;
    let handler = Arc::new(DispatchConnectionHandler::new(Arc::clone(
        gateway.registry(),
    )));
    let handle = listener.start(handler)?;
    info!(
        target: PROCESS_TARGET,
        endpoint = %endpoint,
        versions = ?gateway.registry().available_versions(),
        "gateway ready"
    );

    let waited = shutdown.wait();
    info!(target: PROCESS_TARGET, "stopping gateway listener");
    handle.shutdown();
    let joined = handle.join();
    waited?;
    joined?;
    Ok(())
}
