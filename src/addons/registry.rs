//! Registry of capability modules available to `addons.yml`.
//!
//! The [`AddonRegistry`] maps module identifiers to addon implementations.
//! Duplicate registrations for the same identifier are rejected.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::addons::builtin::StatusAddon;
use crate::addons::error::AddonError;
use crate::addons::host::Addon;

#[derive(Clone, Default)]
pub struct AddonRegistry {
    modules: HashMap<String, Arc<dyn Addon>>,
}

impl AddonRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the modules shipped with the server.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .modules
            .insert(StatusAddon::MODULE.to_string(), Arc::new(StatusAddon));
        registry
    }

    /// Registers an addon implementation under `module`.
    pub fn register<A>(&mut self, module: impl Into<String>, addon: A) -> Result<(), AddonError>
    where
        A: Addon + 'static,
    {
        let module = module.into();
        if self.modules.contains_key(&module) {
            return Err(AddonError::DuplicateModule { module });
        }
        self.modules.insert(module, Arc::new(addon));
        Ok(())
    }

    pub fn get(&self, module: &str) -> Option<&Arc<dyn Addon>> {
        self.modules.get(module)
    }

    pub fn contains(&self, module: &str) -> bool {
        self.modules.contains_key(module)
    }

    /// Registered module identifiers, sorted.
    pub fn modules(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for AddonRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddonRegistry")
            .field("modules", &self.modules())
            .finish()
    }
}
