//! Immutable connection parameters handed to every backend connector.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::defaults::{DEFAULT_BACKEND_PORT, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_SOCKET_TIMEOUT_MS};

/// Transport scheme used to reach the search engine.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Scheme {
    /// Plain HTTP.
    #[default]
    Http,
    /// HTTP over TLS.
    Https,
}

/// Errors raised while validating connection parameters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectionConfigError {
    /// The host name was empty or whitespace.
    #[error("backend host must not be empty")]
    EmptyHost,
    /// Port zero cannot be connected to.
    #[error("backend port must be between 1 and 65535")]
    InvalidPort,
    /// A password was configured without a username.
    #[error("backend password is set but no username was configured")]
    PasswordWithoutUsername,
    /// A username was configured without a password.
    #[error("backend username '{username}' is set but no password was configured")]
    UsernameWithoutPassword {
        /// Username lacking a password.
        username: String,
    },
}

#[derive(Clone, PartialEq, Eq)]
struct Credentials {
    username: String,
    password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Connection parameters shared read-only by every backend connector.
///
/// Values are validated once by [`ConnectionConfigBuilder::build`] and cannot
/// change afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    host: String,
    port: u16,
    scheme: Scheme,
    credentials: Option<Credentials>,
    connect_timeout: Duration,
    socket_timeout: Duration,
}

impl ConnectionConfig {
    /// Starts a builder targeting the supplied host.
    #[must_use]
    pub fn builder(host: impl Into<String>) -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::new(host)
    }

    /// Host name of the search engine.
    #[must_use]
    pub fn host(&self) -> &str {
        self.host.as_str()
    }

    /// Port of the search engine.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Transport scheme.
    #[must_use]
    pub const fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Username for basic authentication, when configured.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.credentials
            .as_ref()
            .map(|credentials| credentials.username.as_str())
    }

    /// Password for basic authentication, when configured.
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.credentials
            .as_ref()
            .map(|credentials| credentials.password.as_str())
    }

    /// Timeout for establishing a connection.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Timeout for socket reads.
    #[must_use]
    pub const fn socket_timeout(&self) -> Duration {
        self.socket_timeout
    }
}

/// Renders the base URL, `scheme://host:port`.
impl fmt::Display for ConnectionConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}://{}:{}", self.scheme, self.host, self.port)
    }
}

/// Builder for [`ConnectionConfig`].
#[derive(Debug, Clone)]
pub struct ConnectionConfigBuilder {
    host: String,
    port: u16,
    scheme: Scheme,
    username: Option<String>,
    password: Option<String>,
    connect_timeout: Duration,
    socket_timeout: Duration,
}

impl ConnectionConfigBuilder {
    fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_BACKEND_PORT,
            scheme: Scheme::default(),
            username: None,
            password: None,
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            socket_timeout: Duration::from_millis(DEFAULT_SOCKET_TIMEOUT_MS),
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the scheme.
    #[must_use]
    pub const fn scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Sets the username.
    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Sets the password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the socket timeout.
    #[must_use]
    pub const fn socket_timeout(mut self, timeout: Duration) -> Self {
        self.socket_timeout = timeout;
        self
    }

    /// Validates the collected values.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionConfigError`] when the host is blank, the port is
    /// zero, or only one half of the credentials was supplied.
    pub fn build(self) -> Result<ConnectionConfig, ConnectionConfigError> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(ConnectionConfigError::EmptyHost);
        }
        if self.port == 0 {
            return Err(ConnectionConfigError::InvalidPort);
        }
        let credentials = match (self.username, self.password) {
            (Some(username), Some(password)) => Some(Credentials { username, password }),
            (None, None) => None,
            (None, Some(_)) => return Err(ConnectionConfigError::PasswordWithoutUsername),
            (Some(username), None) => {
                return Err(ConnectionConfigError::UsernameWithoutPassword { username });
            }
        };

        Ok(ConnectionConfig {
            host: host.to_owned(),
            port: self.port,
            scheme: self.scheme,
            credentials,
            connect_timeout: self.connect_timeout,
            socket_timeout: self.socket_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn builder_applies_defaults() {
        let config = ConnectionConfig::builder("localhost")
            .build()
            .expect("defaults are valid");
        assert_eq!(config.port(), 9200);
        assert_eq!(config.scheme(), Scheme::Http);
        assert_eq!(config.username(), None);
        assert_eq!(config.connect_timeout(), Duration::from_millis(5000));
        assert_eq!(config.socket_timeout(), Duration::from_millis(30_000));
        assert_eq!(config.to_string(), "http://localhost:9200");
    }

    #[test]
    fn debug_output_redacts_password() {
        let config = ConnectionConfig::builder("localhost")
            .username("elastic")
            .password("hunter2")
            .build()
            .expect("credentials are complete");
        let rendered = format!("{config:?}");
        assert!(rendered.contains("elastic"));
        assert!(!rendered.contains("hunter2"), "password leaked: {rendered}");
    }

    #[rstest]
    #[case::blank_host(ConnectionConfig::builder("  "), ConnectionConfigError::EmptyHost)]
    #[case::zero_port(
        ConnectionConfig::builder("localhost").port(0),
        ConnectionConfigError::InvalidPort
    )]
    #[case::orphan_password(
        ConnectionConfig::builder("localhost").password("secret"),
        ConnectionConfigError::PasswordWithoutUsername
    )]
    #[case::orphan_username(
        ConnectionConfig::builder("localhost").username("elastic"),
        ConnectionConfigError::UsernameWithoutPassword { username: "elastic".to_owned() }
    )]
    fn builder_rejects_invalid_values(
        #[case] builder: ConnectionConfigBuilder,
        #[case] expected: ConnectionConfigError,
    ) {
        let error = builder.build().expect_err("builder should reject input");
        assert_eq!(error, expected);
    }

    #[rstest]
    #[case("http", Scheme::Http)]
    #[case("HTTPS", Scheme::Https)]
    fn scheme_parses_case_insensitively(#[case] input: &str, #[case] expected: Scheme) {
        assert_eq!(input.parse::<Scheme>().expect("scheme parses"), expected);
    }
}
