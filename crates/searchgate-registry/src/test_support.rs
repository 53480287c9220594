//! Fake capabilities and loaders for exercising the registry.
//!
//! Compiled for this crate's own tests and, through the `test-support`
//! feature, for downstream test suites.

use std::sync::{Arc, Mutex, PoisonError};

use searchgate_config::ConnectionConfig;
use serde_json::json;

use crate::capability::{
    BackendError, ConnectionCapability, ConnectionError, SearchCapability, WriteCapability,
};
use crate::loader::{
    Extension, ExtensionLoader, ModuleDescriptor, ModuleLifecycle, ModuleStopError,
};
use crate::model::{
    BulkIndexRequest, BulkIndexResponse, BulkItemResult, IndexRequest, IndexResponse,
    SearchHit, SearchRequest, SearchResponse,
};

/// Shared, ordered record of calls made against fakes.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    /// Appends an event.
    pub fn record(&self, event: impl Into<String>) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.into());
    }

    /// Snapshot of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of recorded events equal to `event`.
    #[must_use]
    pub fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|recorded| *recorded == event).count()
    }
}

/// Connection capability that records `connect:<name>` and optionally fails.
#[derive(Debug)]
pub struct FakeConnection {
    name: String,
    failure: Option<String>,
    log: EventLog,
}

impl FakeConnection {
    /// Connection that always succeeds.
    #[must_use]
    pub fn new(name: impl Into<String>, log: EventLog) -> Self {
        Self {
            name: name.into(),
            failure: None,
            log,
        }
    }

    /// Connection that always fails with `message`.
    #[must_use]
    pub fn failing(name: impl Into<String>, message: impl Into<String>, log: EventLog) -> Self {
        Self {
            name: name.into(),
            failure: Some(message.into()),
            log,
        }
    }
}

impl ConnectionCapability for FakeConnection {
    fn connect(&self, _config: &ConnectionConfig) -> Result<(), ConnectionError> {
        self.log.record(format!("connect:{}", self.name));
        self.failure
            .as_ref()
            .map_or(Ok(()), |message| Err(ConnectionError::new(message.clone())))
    }
}

/// Search capability that answers with a single hit named after itself.
#[derive(Debug)]
pub struct FakeSearch {
    name: String,
    failure: Option<String>,
}

impl FakeSearch {
    /// Search handler that succeeds.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            failure: None,
        }
    }

    /// Search handler that always fails with `message`.
    #[must_use]
    pub fn failing(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            failure: Some(message.into()),
        }
    }
}

impl SearchCapability for FakeSearch {
    fn search(&self, request: SearchRequest) -> Result<SearchResponse, BackendError> {
        if let Some(message) = &self.failure {
            return Err(BackendError::new(message.clone()));
        }
        Ok(SearchResponse {
            took_ms: 1,
            total_hits: 1,
            hits: vec![SearchHit {
                id: self.name.clone(),
                score: Some(1.0),
                source: json!({ "index": request.index, "query": request.query }),
            }],
        })
    }
}

/// Write capability that acknowledges every document.
#[derive(Debug)]
pub struct FakeWrite {
    name: String,
}

impl FakeWrite {
    /// Write handler named `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl WriteCapability for FakeWrite {
    fn index(&self, request: IndexRequest) -> Result<IndexResponse, BackendError> {
        Ok(IndexResponse {
            index: request.index,
            id: request.id.unwrap_or_else(|| self.name.clone()),
            result: "created".to_owned(),
            version: Some(1),
        })
    }

    fn bulk_index(&self, request: BulkIndexRequest) -> Result<BulkIndexResponse, BackendError> {
        let items = request
            .documents
            .into_iter()
            .map(|document| BulkItemResult {
                id: document.id,
                status: 201,
                error: None,
            })
            .collect();
        Ok(BulkIndexResponse {
            took_ms: 1,
            errors: false,
            items,
        })
    }
}

/// Shutdown hook that records `stop:<name>` and optionally fails.
#[derive(Debug)]
pub struct FakeLifecycle {
    name: String,
    fail: bool,
    log: EventLog,
}

impl FakeLifecycle {
    /// Hook that stops cleanly.
    #[must_use]
    pub fn new(name: impl Into<String>, log: EventLog) -> Self {
        Self {
            name: name.into(),
            fail: false,
            log,
        }
    }

    /// Hook whose teardown fails.
    #[must_use]
    pub fn failing(name: impl Into<String>, log: EventLog) -> Self {
        Self {
            name: name.into(),
            fail: true,
            log,
        }
    }
}

impl ModuleLifecycle for FakeLifecycle {
    fn stop(&self) -> Result<(), ModuleStopError> {
        self.log.record(format!("stop:{}", self.name));
        if self.fail {
            return Err(ModuleStopError::new(format!("{} refused to stop", self.name)));
        }
        Ok(())
    }
}

/// Loader wrapper that records every enumeration in an [`EventLog`].
#[derive(Debug, Clone)]
pub struct RecordingLoader<L> {
    inner: L,
    log: EventLog,
}

impl<L> RecordingLoader<L> {
    /// Wraps `inner`, recording into `log`.
    #[must_use]
    pub fn new(inner: L, log: EventLog) -> Self {
        Self { inner, log }
    }
}

impl<L: ExtensionLoader> ExtensionLoader for RecordingLoader<L> {
    fn loaded_modules(&self) -> Vec<ModuleDescriptor> {
        self.log.record("enumerate:modules");
        self.inner.loaded_modules()
    }

    fn connection_extensions(&self) -> Vec<Extension<dyn ConnectionCapability>> {
        self.log.record("enumerate:connection");
        self.inner.connection_extensions()
    }

    fn search_extensions(&self) -> Vec<Extension<dyn SearchCapability>> {
        self.log.record("enumerate:search");
        self.inner.search_extensions()
    }

    fn write_extensions(&self) -> Vec<Extension<dyn WriteCapability>> {
        self.log.record("enumerate:write");
        self.inner.write_extensions()
    }
}

/// Connection parameters pointing at a local engine.
#[must_use]
#[expect(
    clippy::expect_used,
    reason = "the default parameters are statically valid"
)]
pub fn local_connection() -> ConnectionConfig {
    ConnectionConfig::builder("localhost")
        .build()
        .expect("default connection parameters are valid")
}
