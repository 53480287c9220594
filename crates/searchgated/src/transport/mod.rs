//! Socket transport carrying JSONL gateway requests.
//!
//! A [`GatewayListener`] binds the configured endpoint, accepts connections
//! on a background thread and hands each one to a [`ConnectionHandler`] on
//! its own thread.

mod errors;
mod listener;
mod stream;

pub use self::errors::ListenerError;
pub(crate) use self::listener::{GatewayListener, ListenerHandle};
pub(crate) use self::stream::{ConnectionHandler, ConnectionStream};

pub(crate) const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
