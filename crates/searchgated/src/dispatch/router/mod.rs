//! Maps request paths onto registry handlers.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use searchgate_registry::ServiceRegistry;

use super::DISPATCH_TARGET;
use super::errors::DispatchError;
use super::request::GatewayRequest;
use super::response::GatewayResponse;

const API_PREFIX: &str = "/api/es";

/// A resolved gateway route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `GET /versions`.
    Versions,
    /// `POST /{version}/search`.
    Search {
        /// Requested version.
        version: String,
    },
    /// `POST /{version}/index`.
    Index {
        /// Requested version.
        version: String,
    },
    /// `POST /{version}/bulk-index`.
    BulkIndex {
        /// Requested version.
        version: String,
    },
}

impl Route {
    /// Resolves `method` and `path`, accepting an optional `/api/es` prefix.
    ///
    /// `/{version}/versions` is an alias of `/versions`; the version segment
    /// is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::NotFound`] for unknown paths and
    /// [`DispatchError::MethodNotAllowed`] when the path is known but the
    /// method is not the one it accepts.
    pub fn resolve(method: &str, path: &str) -> Result<Self, DispatchError> {
        let route = Self::from_path(path).ok_or_else(|| DispatchError::not_found(path))?;
        if method.trim().eq_ignore_ascii_case(route.method()) {
            Ok(route)
        } else {
            Err(DispatchError::method_not_allowed(method, path))
        }
    }

    fn from_path(path: &str) -> Option<Self> {
        let relative = path
            .strip_prefix(API_PREFIX)
            .filter(|rest| rest.is_empty() || rest.starts_with('/'))
            .unwrap_or(path);
        let segments: Vec<&str> = relative
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();
        match segments.as_slice() {
            ["versions"] | [_, "versions"] => Some(Self::Versions),
            [version, "search"] => Some(Self::Search {
                version: (*version).to_owned(),
            }),
            [version, "index"] => Some(Self::Index {
                version: (*version).to_owned(),
            }),
            [version, "bulk-index"] => Some(Self::BulkIndex {
                version: (*version).to_owned(),
            }),
            _ => None,
        }
    }

    /// Method the route accepts.
    #[must_use]
    pub const fn method(&self) -> &'static str {
        match self {
            Self::Versions => "GET",
            Self::Search { .. } | Self::Index { .. } | Self::BulkIndex { .. } => "POST",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Versions => write!(formatter, "GET /versions"),
            Self::Search { version } => write!(formatter, "POST /{version}/search"),
            Self::Index { version } => write!(formatter, "POST /{version}/index"),
            Self::BulkIndex { version } => write!(formatter, "POST /{version}/bulk-index"),
        }
    }
}

/// Dispatches requests against a shared registry.
#[derive(Debug, Clone)]
pub struct Router {
    registry: Arc<ServiceRegistry>,
}

impl Router {
    /// Routes against `registry`.
    #[must_use]
    pub const fn new(registry: Arc<ServiceRegistry>) -> Self {
        Self { registry }
    }

    /// Answers `request`.
    ///
    /// The version's handler is looked up before the body is decoded, so an
    /// unknown version is reported even when the body is also wrong.
    ///
    /// # Errors
    ///
    /// Returns the [`DispatchError`] describing why the request could not be
    /// served; callers turn it into an error response.
    pub fn dispatch(&self, request: GatewayRequest) -> Result<GatewayResponse, DispatchError> {
        let route = Route::resolve(&request.method, &request.path)?;
        debug!(target: DISPATCH_TARGET, route = %route, "dispatching request");
        match &route {
            Route::Versions => Ok(GatewayResponse::ok(json!({
                "availableVersions": self.registry.available_versions(),
            }))),
            Route::Search { version } => {
                let handler = self.registry.search_handler(version)?;
                let result = handler
                    .search(decode(&route, request.body)?)
                    .map_err(|source| DispatchError::backend(version, source))?;
                GatewayResponse::from_payload(&result)
            }
            Route::Index { version } => {
                let handler = self.registry.write_handler(version)?;
                let result = handler
                    .index(decode(&route, request.body)?)
                    .map_err(|source| DispatchError::backend(version, source))?;
                GatewayResponse::from_payload(&result)
            }
            Route::BulkIndex { version } => {
                let handler = self.registry.write_handler(version)?;
                let result = handler
                    .bulk_index(decode(&route, request.body)?)
                    .map_err(|source| DispatchError::backend(version, source))?;
                GatewayResponse::from_payload(&result)
            }
        }
    }
}

fn decode<T: DeserializeOwned>(route: &Route, body: Value) -> Result<T, DispatchError> {
    serde_json::from_value(body)
        .map_err(|error| DispatchError::invalid_body(route.to_string(), error.to_string()))
}
