//! Version-routing search gateway daemon.
//!
//! `searchgated` loads its configuration, installs structured telemetry,
//! discovers the backend modules linked into the binary and builds a
//! [`searchgate_registry::ServiceRegistry`] from them. Every module connects
//! to its search engine before any handler becomes routable; a single
//! connection failure aborts startup.
//!
//! Once bootstrapped, the gateway listens on the configured socket and
//! answers one JSONL request per connection by routing it to the search or
//! write handler registered for the requested version (see [`dispatch`]).
//! Termination signals stop the listener and then every backend module.
//!
//! Lifecycle events flow through a [`HealthReporter`] so operators can see
//! which modules were discovered, which versions became routable and why a
//! startup failed.

mod bootstrap;
pub mod dispatch;
mod health;
mod modules;
mod process;
pub mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Gateway, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use modules::{LinkedModuleDiscovery, ModuleDiscovery, PreloadedModules};
pub use process::{
    LaunchError, ShutdownError, ShutdownSignal, SystemShutdownSignal, run, run_gateway,
};
pub use telemetry::TelemetryError;
pub use transport::ListenerError;

#[cfg(test)]
mod tests;
