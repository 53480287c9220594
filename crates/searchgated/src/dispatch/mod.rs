//! Routing of gateway requests to version-specific handlers.
//!
//! Each connection carries exactly one request line and receives exactly
//! one response line:
//!
//! ```json
//! {"method":"POST","path":"/8.13/search","body":{"index":"products","query":{"match_all":{}}}}
//! {"status":200,"body":{"tookMs":3,"totalHits":1,"hits":[...]}}
//! ```
//!
//! Paths may carry an `/api/es` prefix. Supported routes:
//!
//! | method | path                    | action                               |
//! |--------|-------------------------|--------------------------------------|
//! | `GET`  | `/versions`             | list versions with a search handler  |
//! | `GET`  | `/{version}/versions`   | same as `/versions`                  |
//! | `POST` | `/{version}/search`     | run a search                         |
//! | `POST` | `/{version}/index`      | index one document                   |
//! | `POST` | `/{version}/bulk-index` | index a batch of documents           |
//!
//! Failures become a response with an HTTP-style status and an
//! `{"error": ...}` body; see [`DispatchError::status`].

mod errors;
mod handler;
mod request;
mod response;
mod router;

pub use self::errors::DispatchError;
pub(crate) use self::handler::DispatchConnectionHandler;
pub use self::request::GatewayRequest;
pub use self::response::{GatewayResponse, ResponseWriter};
pub use self::router::{Route, Router};

/// Largest request line accepted, newline included.
pub const MAX_REQUEST_BYTES: usize = 1024 * 1024;

pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
