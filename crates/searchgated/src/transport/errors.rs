//! Listener failures.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Failures while binding or running the gateway listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The TCP host name did not resolve.
    #[error("failed to resolve {host}:{port}: {source}")]
    Resolve {
        /// Configured host.
        host: String,
        /// Configured port.
        port: u16,
        /// Resolver error.
        #[source]
        source: io::Error,
    },
    /// Resolution succeeded but produced no addresses.
    #[error("{host}:{port} resolved to no addresses")]
    NoAddress {
        /// Configured host.
        host: String,
        /// Configured port.
        port: u16,
    },
    /// Binding the TCP socket failed.
    #[error("failed to bind TCP listener on {addr}: {source}")]
    BindTcp {
        /// Address that was attempted.
        addr: SocketAddr,
        /// Bind error.
        #[source]
        source: io::Error,
    },
    /// The listener could not be switched to non-blocking accepts.
    #[error("failed to make listener non-blocking: {source}")]
    NonBlocking {
        /// Socket option error.
        #[source]
        source: io::Error,
    },
    /// Unix sockets are not available on this platform.
    #[cfg(not(unix))]
    #[error("unix socket endpoint {endpoint} is not supported on this platform")]
    UnsupportedUnix {
        /// Endpoint as configured.
        endpoint: String,
    },
    /// Binding the Unix socket failed.
    #[cfg(unix)]
    #[error("failed to bind unix listener at {path}: {source}")]
    BindUnix {
        /// Socket path.
        path: String,
        /// Bind error.
        #[source]
        source: io::Error,
    },
    /// Another process is serving the socket path.
    #[cfg(unix)]
    #[error("unix socket {path} is already being served")]
    UnixInUse {
        /// Socket path.
        path: String,
    },
    /// A non-socket file occupies the socket path.
    #[cfg(unix)]
    #[error("{path} exists and is not a unix socket")]
    UnixNotSocket {
        /// Occupied path.
        path: String,
    },
    /// A leftover socket file could not be inspected or removed.
    #[cfg(unix)]
    #[error("failed to reclaim stale unix socket {path} while {action}: {source}")]
    UnixReclaim {
        /// Socket path.
        path: String,
        /// Step that failed.
        action: &'static str,
        /// Filesystem or connect error.
        #[source]
        source: io::Error,
    },
    /// The accept thread panicked.
    #[error("listener thread panicked")]
    ThreadPanic,
}
