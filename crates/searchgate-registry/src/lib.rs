//! Version-keyed service registry over pluggable search backends.
//!
//! Backend modules each speak to one major version of the search engine and
//! contribute capability extensions: a [`ConnectionCapability`] that sets up
//! their client plus [`SearchCapability`] and [`WriteCapability`] handlers.
//! An [`ExtensionLoader`] enumerates those extensions together with the
//! module that owns them, a [`VersionResolver`] maps each module to the
//! user-facing version it serves, and [`ServiceRegistry::build`] connects
//! every module before exposing an immutable `version -> handler` table.
//!
//! ```
//! use std::sync::Arc;
//! use searchgate_config::ConnectionConfig;
//! use searchgate_registry::{
//!     BackendModule, ServiceRegistry, StaticExtensionLoader, VersionResolver,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let loader = StaticExtensionLoader::new()
//!     .with_module(BackendModule::new("elasticsearch-es85-plugin"))?;
//! let config = ConnectionConfig::builder("localhost").build()?;
//! let registry = ServiceRegistry::build(&loader, &VersionResolver::builtin(), &config)?;
//! assert!(registry.search_handler("8.5").is_err());
//! # Ok(())
//! # }
//! ```

mod capability;
mod error;
mod failure;
mod lifecycle;
mod loader;
mod model;
mod registry;
mod resolver;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

#[cfg(test)]
mod tests;

pub use capability::{
    BackendError, CapabilityKind, ConnectionCapability, ConnectionError, SearchCapability,
    WriteCapability,
};
pub use error::{LookupError, RegistryError, UnresolvedModule};
pub use lifecycle::{StopSummary, stop_modules};
pub use loader::{
    BACKEND_MODULES, BackendModule, Extension, ExtensionLoader, LinkedModule,
    LinkedModuleLoader, LoaderError, ModuleContext, ModuleDescriptor, ModuleId, ModuleLifecycle,
    ModuleStopError, StaticExtensionLoader,
};
pub use model::{
    BulkDocument, BulkIndexRequest, BulkIndexResponse, BulkItemResult, IndexRequest,
    IndexResponse, SearchHit, SearchRequest, SearchResponse,
};
pub use registry::ServiceRegistry;
pub use resolver::{BUILTIN_VERSION_TABLE, VersionResolver, VersionTableError};

/// Tracing target used by registry construction and teardown.
pub const REGISTRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::registry");
