//! Version-keyed registry of connected search and write handlers.
//!
//! Construction happens in two phases. Every discovered connection
//! capability is first attributed to a module, resolved to a version and
//! connected; a single failure aborts construction. Only once every
//! connection has succeeded are the search and write capabilities indexed
//! by version. The resulting registry is immutable and can be shared
//! behind an `Arc` by any number of request threads.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use searchgate_config::ConnectionConfig;
use tracing::{debug, error, info, warn};

use crate::REGISTRY_TARGET;
use crate::capability::{CapabilityKind, SearchCapability, WriteCapability};
use crate::error::{LookupError, RegistryError, UnresolvedModule};
use crate::loader::{Extension, ExtensionLoader, ModuleId};
use crate::resolver::VersionResolver;

/// Immutable lookup table from version to handler.
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    search: BTreeMap<String, Arc<dyn SearchCapability>>,
    write: BTreeMap<String, Arc<dyn WriteCapability>>,
    skipped: Vec<UnresolvedModule>,
}

impl ServiceRegistry {
    /// Connects every discovered module and indexes its handlers.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Connection`] for the first module whose
    /// connection fails. No registry is produced in that case.
    pub fn build(
        loader: &dyn ExtensionLoader,
        resolver: &VersionResolver,
        config: &ConnectionConfig,
    ) -> Result<Self, RegistryError> {
        let mut skipped = Vec::new();

        connect_all(loader, resolver, config, &mut skipped)?;

        let search = index_extensions(
            CapabilityKind::Search,
            loader.search_extensions(),
            resolver,
            &mut skipped,
        );
        let write = index_extensions(
            CapabilityKind::Write,
            loader.write_extensions(),
            resolver,
            &mut skipped,
        );

        info!(
            target: REGISTRY_TARGET,
            search_versions = ?search.keys().collect::<Vec<_>>(),
            write_versions = ?write.keys().collect::<Vec<_>>(),
            skipped = skipped.len(),
            "service registry ready",
        );

        Ok(Self {
            search,
            write,
            skipped,
        })
    }

    /// Returns the search handler for `version`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::UnknownVersion`] listing every version with a
    /// search handler when `version` has none.
    pub fn search_handler(&self, version: &str) -> Result<Arc<dyn SearchCapability>, LookupError> {
        lookup(CapabilityKind::Search, &self.search, version)
    }

    /// Returns the write handler for `version`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::UnknownVersion`] listing every version with a
    /// write handler when `version` has none.
    pub fn write_handler(&self, version: &str) -> Result<Arc<dyn WriteCapability>, LookupError> {
        lookup(CapabilityKind::Write, &self.write, version)
    }

    /// Versions that have a registered search handler.
    #[must_use]
    pub fn available_versions(&self) -> BTreeSet<String> {
        self.search.keys().cloned().collect()
    }

    /// Versions that have a registered write handler.
    #[must_use]
    pub fn write_versions(&self) -> BTreeSet<String> {
        self.write.keys().cloned().collect()
    }

    /// Extensions excluded during construction.
    #[must_use]
    pub fn skipped(&self) -> &[UnresolvedModule] {
        &self.skipped
    }
}

fn resolve_owner<T: ?Sized>(
    kind: CapabilityKind,
    extension: &Extension<T>,
    resolver: &VersionResolver,
) -> Result<(ModuleId, String), UnresolvedModule> {
    let Some(owner) = extension.owner() else {
        return Err(UnresolvedModule::Unattributed {
            kind,
            extension: extension.label().to_owned(),
        });
    };
    resolver
        .resolve_version(owner)
        .map(|version| (owner.clone(), version.to_owned()))
        .ok_or_else(|| UnresolvedModule::Unmapped {
            kind,
            extension: extension.label().to_owned(),
            module: owner.clone(),
        })
}

fn skip(skipped: &mut Vec<UnresolvedModule>, unresolved: UnresolvedModule) {
    warn!(
        target: REGISTRY_TARGET,
        kind = %unresolved.kind(),
        reason = %unresolved,
        "skipping extension",
    );
    skipped.push(unresolved);
}

fn connect_all(
    loader: &dyn ExtensionLoader,
    resolver: &VersionResolver,
    config: &ConnectionConfig,
    skipped: &mut Vec<UnresolvedModule>,
) -> Result<(), RegistryError> {
    for extension in loader.connection_extensions() {
        let (module, version) =
            match resolve_owner(CapabilityKind::Connection, &extension, resolver) {
                Ok(resolved) => resolved,
                Err(unresolved) => {
                    skip(skipped, unresolved);
                    continue;
                }
            };

        info!(
            target: REGISTRY_TARGET,
            module = %module,
            version = %version,
            endpoint = %config,
            "connecting backend module",
        );
        if let Err(source) = extension.instance().connect(config) {
            error!(
                target: REGISTRY_TARGET,
                module = %module,
                version = %version,
                error = %source,
                "backend module failed to connect",
            );
            return Err(RegistryError::Connection {
                version,
                module,
                source,
            });
        }
    }
    Ok(())
}

fn index_extensions<T: ?Sized>(
    kind: CapabilityKind,
    extensions: Vec<Extension<T>>,
    resolver: &VersionResolver,
    skipped: &mut Vec<UnresolvedModule>,
) -> BTreeMap<String, Arc<T>> {
    let mut handlers = BTreeMap::new();
    for extension in extensions {
        let (module, version) = match resolve_owner(kind, &extension, resolver) {
            Ok(resolved) => resolved,
            Err(unresolved) => {
                skip(skipped, unresolved);
                continue;
            }
        };
        debug!(
            target: REGISTRY_TARGET,
            kind = %kind,
            module = %module,
            version = %version,
            "registered handler",
        );
        if handlers
            .insert(version.clone(), Arc::clone(extension.instance()))
            .is_some()
        {
            warn!(
                target: REGISTRY_TARGET,
                kind = %kind,
                module = %module,
                version = %version,
                "handler replaced an earlier registration for the same version",
            );
        }
    }
    handlers
}

fn lookup<T: ?Sized>(
    kind: CapabilityKind,
    handlers: &BTreeMap<String, Arc<T>>,
    version: &str,
) -> Result<Arc<T>, LookupError> {
    handlers.get(version).map(Arc::clone).ok_or_else(|| {
        LookupError::unknown_version(kind, version, handlers.keys().cloned())
    })
}
