//! Request failures and their response status codes.

use std::io;

use serde_json::{Value, json};
use thiserror::Error;

use searchgate_registry::{BackendError, LookupError};

/// Failures while reading, routing or answering a request.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The request line is not a valid request document.
    #[error("malformed request: {message}")]
    Malformed {
        /// Parser diagnostic.
        message: String,
        /// JSON error, when parsing produced one.
        #[source]
        source: Option<serde_json::Error>,
    },
    /// The body does not match what the route expects.
    #[error("invalid body for {route}: {message}")]
    InvalidBody {
        /// Route that rejected the body.
        route: String,
        /// Decoder diagnostic.
        message: String,
    },
    /// No handler serves the requested version.
    #[error(transparent)]
    UnknownVersion(#[from] LookupError),
    /// No route matches the path.
    #[error("no route for path '{path}'")]
    NotFound {
        /// Requested path.
        path: String,
    },
    /// The route exists but not for this method.
    #[error("method {method} is not allowed for '{path}'")]
    MethodNotAllowed {
        /// Requested method.
        method: String,
        /// Requested path.
        path: String,
    },
    /// The request line exceeded the size limit.
    #[error("request of at least {size} bytes exceeds the {max_size} byte limit")]
    RequestTooLarge {
        /// Bytes read before giving up.
        size: usize,
        /// Configured limit.
        max_size: usize,
    },
    /// The backend handler reported a failure.
    #[error("backend for version '{version}' failed: {source}")]
    Backend {
        /// Version whose handler failed.
        version: String,
        /// Handler error.
        #[source]
        source: BackendError,
    },
    /// Reading or writing the connection failed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    /// A handler result could not be serialised.
    #[error("failed to serialise response: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl DispatchError {
    /// HTTP-style status code reported to the client.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::Malformed { .. } | Self::InvalidBody { .. } | Self::UnknownVersion(_) => 400,
            Self::NotFound { .. } => 404,
            Self::MethodNotAllowed { .. } => 405,
            Self::RequestTooLarge { .. } => 413,
            Self::Backend { .. } => 502,
            Self::Io(_) | Self::Serialize(_) => 500,
        }
    }

    /// Response body describing the failure.
    ///
    /// Unknown-version failures also list the versions that are routable.
    #[must_use]
    pub fn body(&self) -> Value {
        match self {
            Self::UnknownVersion(lookup) => json!({
                "error": self.to_string(),
                "availableVersions": lookup.available(),
            }),
            _ => json!({ "error": self.to_string() }),
        }
    }

    /// Malformed request carrying the JSON parser error.
    #[must_use]
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::Malformed {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Malformed request with a custom message.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
            source: None,
        }
    }

    /// Body rejected by `route`.
    #[must_use]
    pub fn invalid_body(route: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidBody {
            route: route.into(),
            message: message.into(),
        }
    }

    /// Unmatched path.
    #[must_use]
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Known path requested with the wrong method.
    #[must_use]
    pub fn method_not_allowed(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self::MethodNotAllowed {
            method: method.into(),
            path: path.into(),
        }
    }

    /// Oversized request line.
    #[must_use]
    pub const fn request_too_large(size: usize, max_size: usize) -> Self {
        Self::RequestTooLarge { size, max_size }
    }

    /// Handler failure for `version`.
    #[must_use]
    pub fn backend(version: impl Into<String>, source: BackendError) -> Self {
        Self::Backend {
            version: version.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use searchgate_registry::CapabilityKind;

    use super::*;

    #[rstest]
    #[case(DispatchError::malformed("empty"), 400)]
    #[case(DispatchError::invalid_body("POST /8.5/search", "missing field"), 400)]
    #[case(DispatchError::not_found("/nope"), 404)]
    #[case(DispatchError::method_not_allowed("DELETE", "/versions"), 405)]
    #[case(DispatchError::request_too_large(2_000_000, 1_048_576), 413)]
    #[case(DispatchError::backend("8.5", BackendError::new("cluster red")), 502)]
    #[case(DispatchError::Io(io::Error::other("reset")), 500)]
    fn maps_failures_to_status(#[case] error: DispatchError, #[case] status: u16) {
        assert_eq!(error.status(), status);
        assert_eq!(error.body()["error"], json!(error.to_string()));
    }

    #[test]
    fn unknown_version_body_lists_available_versions() {
        let error = DispatchError::from(LookupError::unknown_version(
            CapabilityKind::Search,
            "7.10",
            ["8.13".to_owned(), "8.5".to_owned()],
        ));

        assert_eq!(error.status(), 400);
        let body = error.body();
        assert_eq!(body["availableVersions"], json!(["8.13", "8.5"]));
        assert!(
            body["error"]
                .as_str()
                .is_some_and(|message| message.contains("7.10"))
        );
    }
}
