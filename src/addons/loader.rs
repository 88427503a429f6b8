//! Addon loading.
//!
//! # Responsibilities
//! - Read `addons.yml` and resolve every descriptor to an implementation
//! - Attach each addon to the route table in manifest order
//!
//! # Design Decisions
//! - All or nothing: addons attach to a staged copy of the route table,
//!   committed only when every addon succeeded
//! - Failures name the addon that caused them
//! - An absent or empty manifest is not an error

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::addons::error::AddonError;
use crate::addons::host::{Addon, AddonHost};
use crate::addons::manifest::{AddonDescriptor, AddonManifest, AddonSource};
use crate::addons::registry::AddonRegistry;
use crate::config::Settings;
use crate::observability::metrics;
use crate::routing::RouteTable;

/// A descriptor bound to its implementation, ready to attach.
struct ResolvedAddon {
    descriptor: AddonDescriptor,
    source: AddonSource,
    addon: Arc<dyn Addon>,
}

pub struct AddonLoader {
    registry: AddonRegistry,
    config_dir: PathBuf,
}

impl AddonLoader {
    pub fn new(registry: AddonRegistry, config_dir: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            config_dir: config_dir.into(),
        }
    }

    pub fn registry(&self) -> &AddonRegistry {
        &self.registry
    }

    /// Load every addon listed in `manifest_path` into `routes`.
    ///
    /// Returns the names of the attached addons, in manifest order. On error
    /// `routes` is left exactly as it was.
    pub fn load_all(
        &self,
        manifest_path: &Path,
        routes: &mut RouteTable,
        settings: &Settings,
    ) -> Result<Vec<String>, AddonError> {
        let Some(manifest) = AddonManifest::read(manifest_path)? else {
            tracing::debug!(path = %manifest_path.display(), "No addon manifest, skipping addons");
            return Ok(Vec::new());
        };
        self.load_manifest(&manifest, routes, settings)
    }

    /// Resolve and attach an already parsed manifest.
    pub fn load_manifest(
        &self,
        manifest: &AddonManifest,
        routes: &mut RouteTable,
        settings: &Settings,
    ) -> Result<Vec<String>, AddonError> {
        let resolved = manifest
            .entries()
            .iter()
            .map(|descriptor| self.resolve(descriptor))
            .collect::<Result<Vec<_>, _>>()?;

        let mut staged = routes.clone();
        let mut attached = Vec::with_capacity(resolved.len());
        for entry in &resolved {
            tracing::info!(addon = %entry.descriptor.name, module = %entry.descriptor.module, "Loading addon");
            let mut host = AddonHost {
                descriptor: &entry.descriptor,
                source: &entry.source,
                routes: &mut staged,
                settings,
                config_dir: &self.config_dir,
            };
            entry
                .addon
                .attach(&mut host)
                .map_err(|source| AddonError::Attach {
                    addon: entry.descriptor.name.clone(),
                    source,
                })?;
            attached.push(entry.descriptor.name.clone());
        }

        *routes = staged;
        metrics::record_addons_loaded(attached.len());
        Ok(attached)
    }

    fn resolve(&self, descriptor: &AddonDescriptor) -> Result<ResolvedAddon, AddonError> {
        let source = descriptor.source(&self.config_dir);
        if let AddonSource::Local(path) = &source {
            if !path.exists() {
                return Err(AddonError::MissingPath {
                    addon: descriptor.name.clone(),
                    path: path.clone(),
                });
            }
        }

        let addon = self
            .registry
            .get(&descriptor.module)
            .cloned()
            .ok_or_else(|| AddonError::UnknownModule {
                addon: descriptor.name.clone(),
                module: descriptor.module.clone(),
            })?;

        Ok(ResolvedAddon {
            descriptor: descriptor.clone(),
            source,
            addon,
        })
    }
}
