//! The address `searchgated` accepts dispatch connections on.
//!
//! Endpoints are written as URLs everywhere: `unix:///run/searchgate.sock`
//! or `tcp://127.0.0.1:9780`. The same text form is used on the command line,
//! in `SEARCHGATE_LISTEN` and in configuration files.

use std::fmt;
use std::fs::DirBuilder;
use std::io::ErrorKind;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Listening endpoint of the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum SocketEndpoint {
    /// Unix domain socket at `path`.
    Unix {
        /// Socket file.
        path: Utf8PathBuf,
    },
    /// TCP socket; port zero binds an ephemeral port.
    Tcp {
        /// Host name or address.
        host: String,
        /// Port number.
        port: u16,
    },
}

impl SocketEndpoint {
    /// Unix socket endpoint at `path`.
    #[must_use]
    pub fn unix(path: impl Into<Utf8PathBuf>) -> Self {
        Self::Unix { path: path.into() }
    }

    /// TCP endpoint at `host:port`.
    #[must_use]
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::Tcp {
            host: host.into(),
            port,
        }
    }

    /// Socket file, for Unix endpoints.
    #[must_use]
    pub fn unix_path(&self) -> Option<&Utf8Path> {
        match self {
            Self::Unix { path } => Some(path),
            Self::Tcp { .. } => None,
        }
    }

    /// Creates the directory that will hold a Unix socket.
    ///
    /// Missing directories are created owner-only (`0700`); an existing
    /// directory is left as it is. TCP endpoints need nothing.
    ///
    /// # Errors
    ///
    /// Returns [`SocketPreparationError`] when the socket path has no parent
    /// or the directory cannot be created.
    pub fn prepare_filesystem(&self) -> Result<(), SocketPreparationError> {
        let Some(path) = self.unix_path() else {
            return Ok(());
        };
        let parent = path
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .ok_or_else(|| SocketPreparationError::MissingParent {
                path: path.to_path_buf(),
            })?;
        if parent.is_dir() {
            return Ok(());
        }

        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        std::os::unix::fs::DirBuilderExt::mode(&mut builder, 0o700);

        match builder.create(parent) {
            Err(source) if source.kind() != ErrorKind::AlreadyExists => {
                Err(SocketPreparationError::CreateDirectory {
                    path: parent.to_path_buf(),
                    source,
                })
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for SocketEndpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix { path } => write!(formatter, "unix://{path}"),
            Self::Tcp { host, port } => write!(formatter, "tcp://{host}:{port}"),
        }
    }
}

impl FromStr for SocketEndpoint {
    type Err = SocketParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| SocketParseError {
            input: input.to_owned(),
            reason,
        };
        let url = Url::parse(input).map_err(|error| invalid(error.to_string()))?;
        match url.scheme() {
            "unix" if url.path().is_empty() => Err(invalid("no socket path".to_owned())),
            "unix" => Ok(Self::unix(url.path())),
            "tcp" => {
                let host = url
                    .host_str()
                    .ok_or_else(|| invalid("no host".to_owned()))?;
                let port = url.port().ok_or_else(|| invalid("no port".to_owned()))?;
                Ok(Self::tcp(host, port))
            }
            other => Err(invalid(format!(
                "scheme '{other}' is neither 'unix' nor 'tcp'"
            ))),
        }
    }
}

impl TryFrom<String> for SocketEndpoint {
    type Error = SocketParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SocketEndpoint> for String {
    fn from(endpoint: SocketEndpoint) -> Self {
        endpoint.to_string()
    }
}

/// A listen address that is not a `unix://` or `tcp://` URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid listen endpoint '{input}': {reason}")]
pub struct SocketParseError {
    /// Text that failed to parse.
    pub input: String,
    /// What was wrong with it.
    pub reason: String,
}

/// Failure to create the directory holding a Unix socket.
#[derive(Debug, Error)]
pub enum SocketPreparationError {
    /// The socket path has no parent directory.
    #[error("socket path '{path}' has no parent directory")]
    MissingParent {
        /// Socket path.
        path: Utf8PathBuf,
    },
    /// The parent directory could not be created.
    #[error("failed to create socket directory '{path}': {source}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Filesystem error.
        #[source]
        source: std::io::Error,
    },
}
