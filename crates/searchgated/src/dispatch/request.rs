//! Parsing of the single request line sent by a client.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::DispatchError;

/// One gateway request.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayRequest {
    /// HTTP-style method, matched case-insensitively.
    pub method: String,
    /// Route path such as `/8.13/search`.
    pub path: String,
    /// JSON payload; `null` when absent.
    #[serde(default)]
    pub body: Value,
}

impl GatewayRequest {
    /// Builds a request.
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>, body: Value) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            body,
        }
    }

    /// Parses a request line, ignoring surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Malformed`] for blank lines, invalid JSON,
    /// unknown fields, a blank method or a path without a leading `/`.
    pub fn parse(line: &[u8]) -> Result<Self, DispatchError> {
        let trimmed = line.trim_ascii();
        if trimmed.is_empty() {
            return Err(DispatchError::malformed("empty request line"));
        }
        let request: Self =
            serde_json::from_slice(trimmed).map_err(DispatchError::from_json_error)?;
        request.validate()?;
        Ok(request)
    }

    fn validate(&self) -> Result<(), DispatchError> {
        if self.method.trim().is_empty() {
            return Err(DispatchError::malformed("method must not be empty"));
        }
        if !self.path.starts_with('/') {
            return Err(DispatchError::malformed(format!(
                "path '{}' must start with '/'",
                self.path
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_request_with_trailing_newline() {
        let request = GatewayRequest::parse(
            b"{\"method\":\"POST\",\"path\":\"/8.5/search\",\"body\":{\"index\":\"products\"}}\n",
        )
        .expect("request parses");

        assert_eq!(
            request,
            GatewayRequest::new("POST", "/8.5/search", json!({"index": "products"}))
        );
    }

    #[test]
    fn missing_body_defaults_to_null() {
        let request = GatewayRequest::parse(br#"{"method":"GET","path":"/versions"}"#)
            .expect("request parses");
        assert_eq!(request.body, Value::Null);
    }

    #[rstest]
    #[case::blank(b"   \n".as_slice())]
    #[case::not_json(b"GET /versions".as_slice())]
    #[case::missing_path(br#"{"method":"GET"}"#.as_slice())]
    #[case::unknown_field(br#"{"method":"GET","path":"/versions","verb":"x"}"#.as_slice())]
    #[case::blank_method(br#"{"method":" ","path":"/versions"}"#.as_slice())]
    #[case::relative_path(br#"{"method":"GET","path":"versions"}"#.as_slice())]
    fn rejects_malformed_lines(#[case] line: &[u8]) {
        let error = GatewayRequest::parse(line).expect_err("line should be rejected");
        assert!(matches!(error, DispatchError::Malformed { .. }), "{error:?}");
        assert_eq!(error.status(), 400);
    }
}
