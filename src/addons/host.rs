//! The capability surface addons attach to.

use std::path::Path;
use std::sync::Arc;

use crate::addons::error::AttachError;
use crate::addons::manifest::{AddonDescriptor, AddonSource};
use crate::config::Settings;
use crate::routing::{Handler, Matcher, RouteTable};

/// A unit of behavior attached to the server at startup.
///
/// Implementations are registered in an
/// [`AddonRegistry`](crate::addons::AddonRegistry) under a module identifier
/// and referenced by that identifier from `addons.yml`.
pub trait Addon: Send + Sync {
    fn attach(&self, host: &mut AddonHost<'_>) -> Result<(), AttachError>;
}

/// Server APIs granted to an addon while it attaches.
pub struct AddonHost<'a> {
    pub(crate) descriptor: &'a AddonDescriptor,
    pub(crate) source: &'a AddonSource,
    pub(crate) routes: &'a mut RouteTable,
    pub(crate) settings: &'a Settings,
    pub(crate) config_dir: &'a Path,
}

impl AddonHost<'_> {
    /// Name the addon was listed under in the manifest.
    pub fn addon_name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn source(&self) -> &AddonSource {
        self.source
    }

    /// Install location for locally installed addons.
    pub fn addon_dir(&self) -> Option<&Path> {
        match self.source {
            AddonSource::Local(path) => Some(path),
            AddonSource::Package(_) => None,
        }
    }

    pub fn settings(&self) -> &Settings {
        self.settings
    }

    pub fn config_dir(&self) -> &Path {
        self.config_dir
    }

    /// Routes registered so far, built-in ones included.
    pub fn routes(&self) -> &RouteTable {
        self.routes
    }

    pub fn add_route<M, H>(&mut self, matcher: M, handler: H)
    where
        M: Matcher + 'static,
        H: Handler + 'static,
    {
        self.routes.add_route(matcher, handler);
    }

    pub fn add_pattern<H>(&mut self, pattern: &str, handler: H) -> Result<(), regex::Error>
    where
        H: Handler + 'static,
    {
        self.routes.add_pattern(pattern, handler)
    }

    pub fn push_route(&mut self, matcher: Arc<dyn Matcher>, handler: Arc<dyn Handler>) {
        self.routes.push(matcher, handler);
    }
}
