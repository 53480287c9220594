//! Layered configuration shared by the searchgate daemon and its embedders.
//!
//! Values are resolved through `ortho_config` in increasing precedence:
//! built-in defaults, a configuration file, `SEARCHGATE_*` environment
//! variables and finally command-line flags. The resolved [`Config`] is read
//! once at startup and never mutated afterwards; the backend connection
//! settings it carries are validated into an immutable [`ConnectionConfig`]
//! that every backend connector receives.

mod connection;
mod defaults;
mod socket;
mod telemetry;

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use connection::{ConnectionConfig, ConnectionConfigBuilder, ConnectionConfigError, Scheme};
pub use defaults::{
    DEFAULT_BACKEND_HOST, DEFAULT_BACKEND_PORT, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_PLUGIN_DIR,
    DEFAULT_SOCKET_TIMEOUT_MS, DEFAULT_TCP_PORT, default_backend_host, default_plugin_dir,
    default_socket_endpoint,
};
pub use socket::{SocketEndpoint, SocketParseError, SocketPreparationError};
pub use telemetry::{DEFAULT_LOG_FILTER, LogFormat};

/// Resolved process configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "SEARCHGATE")]
pub struct Config {
    /// Socket the daemon listens on for dispatch requests.
    #[ortho_config(default = default_socket_endpoint())]
    pub listen: SocketEndpoint,
    /// Directory backend modules are discovered from.
    #[ortho_config(default = default_plugin_dir())]
    pub plugin_dir: String,
    /// Search engine host every backend connects to.
    #[ortho_config(default = default_backend_host())]
    pub backend_host: String,
    /// Search engine port.
    #[ortho_config(default = DEFAULT_BACKEND_PORT)]
    pub backend_port: u16,
    /// Transport scheme used to reach the search engine.
    #[ortho_config(default = Scheme::Http)]
    pub backend_scheme: Scheme,
    /// Optional username for basic authentication.
    pub backend_username: Option<String>,
    /// Optional password for basic authentication.
    pub backend_password: Option<String>,
    /// Connection establishment timeout in milliseconds.
    #[ortho_config(default = DEFAULT_CONNECT_TIMEOUT_MS)]
    pub connect_timeout_ms: u64,
    /// Socket read timeout in milliseconds.
    #[ortho_config(default = DEFAULT_SOCKET_TIMEOUT_MS)]
    pub socket_timeout_ms: u64,
    /// `tracing` filter expression applied to daemon telemetry.
    #[ortho_config(default = DEFAULT_LOG_FILTER.to_owned())]
    pub log_filter: String,
    /// Output format for daemon telemetry.
    #[ortho_config(default = LogFormat::Json)]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_socket_endpoint(),
            plugin_dir: default_plugin_dir(),
            backend_host: default_backend_host(),
            backend_port: DEFAULT_BACKEND_PORT,
            backend_scheme: Scheme::Http,
            backend_username: None,
            backend_password: None,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            socket_timeout_ms: DEFAULT_SOCKET_TIMEOUT_MS,
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
            log_format: LogFormat::Json,
        }
    }
}

impl Config {
    /// Socket endpoint the daemon binds.
    #[must_use]
    pub fn listen(&self) -> &SocketEndpoint {
        &self.listen
    }

    /// Directory backend modules are discovered from.
    #[must_use]
    pub fn plugin_dir(&self) -> &str {
        self.plugin_dir.as_str()
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Validates the backend settings into the immutable connection value
    /// shared by every connector.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionConfigError`] when the host is blank, the port is
    /// zero, or only one half of the credentials is configured.
    pub fn connection_config(&self) -> Result<ConnectionConfig, ConnectionConfigError> {
        let mut builder = ConnectionConfig::builder(self.backend_host.as_str())
            .port(self.backend_port)
            .scheme(self.backend_scheme)
            .connect_timeout(Duration::from_millis(self.connect_timeout_ms))
            .socket_timeout(Duration::from_millis(self.socket_timeout_ms));
        if let Some(username) = &self.backend_username {
            builder = builder.username(username.as_str());
        }
        if let Some(password) = &self.backend_password {
            builder = builder.password(password.as_str());
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let config = Config::default();
        assert_eq!(config.plugin_dir(), "plugins");
        assert_eq!(config.backend_host, "localhost");
        assert_eq!(config.backend_port, 9200);
        assert_eq!(config.backend_scheme, Scheme::Http);
        assert_eq!(config.connect_timeout_ms, 5000);
        assert_eq!(config.socket_timeout_ms, 30_000);
        assert_eq!(config.log_filter(), "info");
        assert_eq!(config.log_format(), LogFormat::Json);
    }

    #[test]
    fn connection_config_carries_backend_settings() {
        let config = Config {
            backend_host: "search.internal".to_owned(),
            backend_port: 9243,
            backend_scheme: Scheme::Https,
            backend_username: Some("elastic".to_owned()),
            backend_password: Some("changeme".to_owned()),
            connect_timeout_ms: 250,
            ..Config::default()
        };

        let connection = config
            .connection_config()
            .expect("connection config should validate");
        assert_eq!(connection.host(), "search.internal");
        assert_eq!(connection.port(), 9243);
        assert_eq!(connection.scheme(), Scheme::Https);
        assert_eq!(connection.username(), Some("elastic"));
        assert_eq!(connection.password(), Some("changeme"));
        assert_eq!(connection.connect_timeout(), Duration::from_millis(250));
        assert_eq!(connection.socket_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn connection_config_rejects_zero_port() {
        let config = Config {
            backend_port: 0,
            ..Config::default()
        };
        let error = config
            .connection_config()
            .expect_err("port zero must be rejected");
        assert!(matches!(error, ConnectionConfigError::InvalidPort));
    }
}
