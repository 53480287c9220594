//! Connection handler answering one request per connection.

use std::io::{BufRead, BufReader, Read};
use std::sync::Arc;

use tracing::{debug, warn};

use searchgate_registry::ServiceRegistry;

use crate::transport::{ConnectionHandler, ConnectionStream};

use super::errors::DispatchError;
use super::request::GatewayRequest;
use super::response::{GatewayResponse, ResponseWriter};
use super::router::Router;
use super::{DISPATCH_TARGET, MAX_REQUEST_BYTES};

/// Reads a request line, routes it and writes the response line.
#[derive(Debug, Clone)]
pub(crate) struct DispatchConnectionHandler {
    router: Router,
}

impl DispatchConnectionHandler {
    pub(crate) const fn new(registry: Arc<ServiceRegistry>) -> Self {
        Self {
            router: Router::new(registry),
        }
    }

    fn respond(&self, line: &[u8]) -> GatewayResponse {
        let outcome =
            GatewayRequest::parse(line).and_then(|request| self.router.dispatch(request));
        outcome.unwrap_or_else(|error| {
            debug!(
                target: DISPATCH_TARGET,
                status = error.status(),
                %error,
                "request failed"
            );
            GatewayResponse::from_error(&error)
        })
    }
}

impl ConnectionHandler for DispatchConnectionHandler {
    fn handle(&self, mut stream: ConnectionStream) {
        let response = match read_request_line(&mut stream, MAX_REQUEST_BYTES) {
            Ok(Some(line)) => self.respond(&line),
            Ok(None) => {
                debug!(target: DISPATCH_TARGET, "client closed without sending a request");
                return;
            }
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "failed to read request");
                GatewayResponse::from_error(&error)
            }
        };
        if let Err(error) = ResponseWriter::new(&mut stream).write(&response) {
            warn!(target: DISPATCH_TARGET, %error, "failed to write response");
        }
    }
}

/// Reads up to and including the first newline.
///
/// Returns `None` when the peer closes before sending anything. A final line
/// without a newline is accepted.
fn read_request_line<R: Read>(
    reader: &mut R,
    limit: usize,
) -> Result<Option<Vec<u8>>, DispatchError> {
    let cap = u64::try_from(limit).map_or(u64::MAX, |bytes| bytes.saturating_add(1));
    let mut bounded = BufReader::new(reader.take(cap));
    let mut line = Vec::new();
    if bounded.read_until(b'\n', &mut line)? == 0 {
        return Ok(None);
    }
    if line.len() > limit {
        return Err(DispatchError::request_too_large(line.len(), limit));
    }
    Ok(Some(line))
}
