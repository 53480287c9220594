//! Static mapping between user-facing versions and backend module ids.

use thiserror::Error;

use crate::loader::ModuleId;

/// Versions the gateway knows how to route, paired with the module that
/// serves each one.
///
/// `9.1` is reserved: no module for it ships yet, so it resolves but never
/// appears among the available versions until one is installed.
pub const BUILTIN_VERSION_TABLE: &[(&str, &str)] = &[
    ("8.5", "elasticsearch-es85-plugin"),
    ("8.13", "elasticsearch-es813-plugin"),
    ("9.1", "elasticsearch-es91-plugin"),
];

/// Errors raised when a version table is malformed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VersionTableError {
    /// A version key was empty or whitespace.
    #[error("version keys must not be empty")]
    EmptyVersion,
    /// A module identifier was empty or whitespace.
    #[error("version '{version}' maps to an empty module identifier")]
    EmptyModule {
        /// Version whose module id was empty.
        version: String,
    },
    /// The same version appeared twice.
    #[error("version '{version}' is mapped more than once")]
    DuplicateVersion {
        /// Repeated version key.
        version: String,
    },
}

/// Reverse lookup from module identifier to version.
///
/// Each module is expected to serve at most one version. Should a table map
/// two versions to the same module, the entry listed first wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionResolver {
    entries: Vec<(String, ModuleId)>,
}

impl VersionResolver {
    /// Resolver over [`BUILTIN_VERSION_TABLE`].
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN_VERSION_TABLE
                .iter()
                .map(|(version, module)| ((*version).to_owned(), ModuleId::new(*module)))
                .collect(),
        }
    }

    /// Builds a resolver from explicit `(version, module)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`VersionTableError`] for empty keys, empty module ids, or
    /// repeated versions.
    pub fn from_entries<I, V, M>(entries: I) -> Result<Self, VersionTableError>
    where
        I: IntoIterator<Item = (V, M)>,
        V: Into<String>,
        M: Into<ModuleId>,
    {
        let mut table: Vec<(String, ModuleId)> = Vec::new();
        for (raw_version, raw_module) in entries {
            let version = raw_version.into();
            let module = raw_module.into();
            if version.trim().is_empty() {
                return Err(VersionTableError::EmptyVersion);
            }
            if module.as_str().trim().is_empty() {
                return Err(VersionTableError::EmptyModule { version });
            }
            if table.iter().any(|(existing, _)| *existing == version) {
                return Err(VersionTableError::DuplicateVersion { version });
            }
            table.push((version, module));
        }
        Ok(Self { entries: table })
    }

    /// Returns the version served by `module`, if it is mapped.
    #[must_use]
    pub fn resolve_version(&self, module: &ModuleId) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, candidate)| candidate == module)
            .map(|(version, _)| version.as_str())
    }

    /// Returns the module expected to serve `version`.
    #[must_use]
    pub fn module_for(&self, version: &str) -> Option<&ModuleId> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == version)
            .map(|(_, module)| module)
    }
}

impl Default for VersionResolver {
    fn default() -> Self {
        Self::builtin()
    }
}
