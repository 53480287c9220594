//! Errors raised while building and querying the service registry.

use thiserror::Error;

use crate::capability::{CapabilityKind, ConnectionError};
use crate::loader::ModuleId;

/// Fatal failures while constructing the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A backend module could not connect to its engine.
    #[error("backend module '{module}' for version '{version}' failed to connect: {source}")]
    Connection {
        /// Version the module serves.
        version: String,
        /// Module whose connection failed.
        module: ModuleId,
        /// Failure reported by the module.
        #[source]
        source: ConnectionError,
    },
}

/// Recoverable failure when no handler serves the requested version.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The requested version has no handler of the needed kind.
    #[error(
        "no {kind} handler available for version '{version}'; available versions: [{}]",
        .available.join(", ")
    )]
    UnknownVersion {
        /// Capability kind the caller needed.
        kind: CapabilityKind,
        /// Version the caller asked for.
        version: String,
        /// Versions that do have a handler of this kind, in sorted order.
        available: Vec<String>,
    },
}

impl LookupError {
    /// Builds an [`LookupError::UnknownVersion`].
    #[must_use]
    pub fn unknown_version(
        kind: CapabilityKind,
        version: impl Into<String>,
        available: impl IntoIterator<Item = String>,
    ) -> Self {
        Self::UnknownVersion {
            kind,
            version: version.into(),
            available: available.into_iter().collect(),
        }
    }

    /// Versions available for the requested capability kind.
    #[must_use]
    pub fn available(&self) -> &[String] {
        match self {
            Self::UnknownVersion { available, .. } => available,
        }
    }
}

/// Extension excluded from the registry because it could not be routed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UnresolvedModule {
    /// The loader could not tell which module contributed the extension.
    #[error("{kind} extension '{extension}' has no owning module")]
    Unattributed {
        /// Capability kind of the extension.
        kind: CapabilityKind,
        /// Loader-provided label.
        extension: String,
    },
    /// The owning module is not in the version table.
    #[error("{kind} extension '{extension}' belongs to unmapped module '{module}'")]
    Unmapped {
        /// Capability kind of the extension.
        kind: CapabilityKind,
        /// Loader-provided label.
        extension: String,
        /// Owning module.
        module: ModuleId,
    },
}

impl UnresolvedModule {
    /// Capability kind of the skipped extension.
    #[must_use]
    pub const fn kind(&self) -> CapabilityKind {
        match self {
            Self::Unattributed { kind, .. } | Self::Unmapped { kind, .. } => *kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_version_lists_available_versions() {
        let error = LookupError::unknown_version(
            CapabilityKind::Search,
            "9.1",
            ["8.13".to_owned(), "8.5".to_owned()],
        );
        assert_eq!(
            error.to_string(),
            "no search handler available for version '9.1'; available versions: [8.13, 8.5]"
        );
    }

    #[test]
    fn connection_error_names_module_and_version() {
        let error = RegistryError::Connection {
            version: "8.13".to_owned(),
            module: ModuleId::new("elasticsearch-es813-plugin"),
            source: ConnectionError::new("connection refused"),
        };
        let message = error.to_string();
        assert!(message.contains("elasticsearch-es813-plugin"));
        assert!(message.contains("8.13"));
        assert!(message.contains("connection refused"));
    }
}
