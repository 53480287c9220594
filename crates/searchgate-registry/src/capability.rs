//! Capability contracts implemented by backend modules.
//!
//! The registry depends on nothing but these three traits. A backend module
//! contributes one [`ConnectionCapability`] to establish its client and any
//! number of [`SearchCapability`] and [`WriteCapability`] handlers that use
//! the connected client afterwards. Handlers are shared across request
//! threads, so every capability is `Send + Sync` and takes `&self`.

use std::fmt;

use searchgate_config::ConnectionConfig;

use crate::failure::backend_failure;
use crate::model::{
    BulkIndexRequest, BulkIndexResponse, IndexRequest, IndexResponse, SearchRequest,
    SearchResponse,
};

/// Kinds of capability a backend module may register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CapabilityKind {
    /// Connection setup.
    Connection,
    /// Query execution.
    Search,
    /// Document indexing.
    Write,
}

impl CapabilityKind {
    /// Lower-case label used in logs and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::Search => "search",
            Self::Write => "write",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

backend_failure!(
    /// Error reported by a backend that could not establish its client.
    ConnectionError
);

backend_failure!(
    /// Error reported by a connected backend while executing a request.
    BackendError
);

/// Establishes a backend module's client before any handler is exposed.
pub trait ConnectionCapability: Send + Sync {
    /// Connects using the shared connection parameters.
    ///
    /// Implementations honour the connect and socket timeouts carried by
    /// `config`; the registry imposes none of its own.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] when the client cannot be initialised.
    fn connect(&self, config: &ConnectionConfig) -> Result<(), ConnectionError>;
}

/// Executes search queries against one engine version.
pub trait SearchCapability: Send + Sync {
    /// Runs a search.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the engine rejects or fails the query.
    fn search(&self, request: SearchRequest) -> Result<SearchResponse, BackendError>;
}

/// Writes documents to one engine version.
pub trait WriteCapability: Send + Sync {
    /// Indexes a single document.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the engine rejects the write.
    fn index(&self, request: IndexRequest) -> Result<IndexResponse, BackendError>;

    /// Indexes a batch of documents.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the batch cannot be submitted at all;
    /// per-document failures are reported in the response items.
    fn bulk_index(&self, request: BulkIndexRequest) -> Result<BulkIndexResponse, BackendError>;
}

impl fmt::Debug for dyn ConnectionCapability {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("ConnectionCapability")
    }
}

impl fmt::Debug for dyn SearchCapability {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("SearchCapability")
    }
}

impl fmt::Debug for dyn WriteCapability {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("WriteCapability")
    }
}
