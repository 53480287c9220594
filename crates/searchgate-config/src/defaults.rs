//! Built-in configuration defaults.

#[cfg(unix)]
use std::env;

#[cfg(unix)]
use camino::Utf8PathBuf;
#[cfg(unix)]
use dirs::runtime_dir;
#[cfg(unix)]
use libc::geteuid;

use crate::socket::SocketEndpoint;

/// Default TCP port used when Unix domain sockets are not available.
pub const DEFAULT_TCP_PORT: u16 = 9780;

/// Directory scanned for backend modules when none is configured.
pub const DEFAULT_PLUGIN_DIR: &str = "plugins";

/// Search engine host used when none is configured.
pub const DEFAULT_BACKEND_HOST: &str = "localhost";

/// Search engine port used when none is configured.
pub const DEFAULT_BACKEND_PORT: u16 = 9200;

/// Connect timeout applied when none is configured.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

/// Socket timeout applied when none is configured.
pub const DEFAULT_SOCKET_TIMEOUT_MS: u64 = 30_000;

/// Default module directory.
#[must_use]
pub fn default_plugin_dir() -> String {
    DEFAULT_PLUGIN_DIR.to_owned()
}

/// Default search engine host.
#[must_use]
pub fn default_backend_host() -> String {
    DEFAULT_BACKEND_HOST.to_owned()
}

/// Computes the default listening endpoint for the daemon.
#[must_use]
pub fn default_socket_endpoint() -> SocketEndpoint {
    default_socket_endpoint_inner()
}

#[cfg(unix)]
fn default_socket_endpoint_inner() -> SocketEndpoint {
    let (mut base, apply_namespace) = match runtime_base_directory() {
        Some(dir) => (dir, false),
        None => (fallback_base_directory(), true),
    };

    base.push("searchgate");
    if apply_namespace {
        base.push(user_namespace());
    }

    SocketEndpoint::unix(base.join("searchgated.sock"))
}

#[cfg(unix)]
fn runtime_base_directory() -> Option<Utf8PathBuf> {
    runtime_dir().and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
}

#[cfg(unix)]
fn fallback_base_directory() -> Utf8PathBuf {
    let candidate = env::temp_dir();
    Utf8PathBuf::from_path_buf(candidate).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}

#[cfg(unix)]
fn user_namespace() -> String {
    // SAFETY: `geteuid` has no preconditions and cannot fail.
    let uid = unsafe { geteuid() };
    format!("uid-{uid}")
}

#[cfg(not(unix))]
fn default_socket_endpoint_inner() -> SocketEndpoint {
    SocketEndpoint::tcp("127.0.0.1", DEFAULT_TCP_PORT)
}
