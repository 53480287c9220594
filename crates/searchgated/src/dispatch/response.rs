//! Response lines written back to clients.

use std::io::Write;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::DispatchError;

/// One gateway response.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GatewayResponse {
    /// HTTP-style status code.
    pub status: u16,
    /// JSON payload.
    pub body: Value,
}

impl GatewayResponse {
    /// Successful response carrying `body`.
    #[must_use]
    pub const fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    /// Successful response carrying a serialised handler result.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Serialize`] when `payload` cannot be turned
    /// into JSON.
    pub fn from_payload<T: Serialize>(payload: &T) -> Result<Self, DispatchError> {
        Ok(Self::ok(serde_json::to_value(payload)?))
    }

    /// Failure response for `error`.
    #[must_use]
    pub fn from_error(error: &DispatchError) -> Self {
        Self {
            status: error.status(),
            body: error.body(),
        }
    }

    /// Returns `true` for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Writes responses as newline-terminated JSON.
#[derive(Debug)]
pub struct ResponseWriter<W> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    /// Wraps `writer`.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes `response` as one line and flushes.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when serialisation or the write fails.
    pub fn write(&mut self, response: &GatewayResponse) -> Result<(), DispatchError> {
        serde_json::to_writer(&mut self.writer, response)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}
