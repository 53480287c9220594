//! Best-effort teardown of loaded backend modules.

use tracing::{info, warn};

use crate::REGISTRY_TARGET;
use crate::loader::{ExtensionLoader, ModuleId, ModuleStopError};

/// Outcome of [`stop_modules`].
#[derive(Debug, Default)]
pub struct StopSummary {
    /// Modules whose shutdown hook succeeded.
    pub stopped: Vec<ModuleId>,
    /// Modules whose shutdown hook failed, with the reported error.
    pub failures: Vec<(ModuleId, ModuleStopError)>,
}

impl StopSummary {
    /// Returns `true` when every hook succeeded.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Stops every loaded module that registered a shutdown hook.
///
/// Failures are logged and collected; they never prevent later modules from
/// stopping. Modules without a hook are left alone.
#[must_use]
pub fn stop_modules(loader: &dyn ExtensionLoader) -> StopSummary {
    let mut summary = StopSummary::default();
    for descriptor in loader.loaded_modules() {
        let Some(lifecycle) = descriptor.lifecycle() else {
            continue;
        };
        match lifecycle.stop() {
            Ok(()) => {
                info!(
                    target: REGISTRY_TARGET,
                    module = %descriptor.id(),
                    "stopped backend module",
                );
                summary.stopped.push(descriptor.id().clone());
            }
            Err(error) => {
                warn!(
                    target: REGISTRY_TARGET,
                    module = %descriptor.id(),
                    %error,
                    "backend module failed to stop",
                );
                summary.failures.push((descriptor.id().clone(), error));
            }
        }
    }
    summary
}
