//! Addon manifest (`addons.yml`).
//!
//! The manifest maps addon names to descriptors:
//!
//! ```yaml
//! status:
//!   module: Status
//! my_addon:
//!   module: MyAddon
//!   path: addons/my_addon
//! ```
//!
//! Entries keep the order they have in the file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::Value;

use crate::addons::error::AddonError;
use crate::config::loader::is_blank_document;
use crate::config::schema::scalar_to_string;

/// One addon entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonDescriptor {
    pub name: String,
    /// Identifier of the capability module the addon provides.
    pub module: String,
    /// Location relative to the configuration directory, for local installs.
    pub path: Option<String>,
}

/// Where the addon's code comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddonSource {
    /// Installed under the configuration directory.
    Local(PathBuf),
    /// Shipped as a package, compiled into the server.
    Package(String),
}

impl AddonDescriptor {
    pub fn source(&self, config_dir: &Path) -> AddonSource {
        match &self.path {
            Some(path) => AddonSource::Local(config_dir.join(path)),
            None => AddonSource::Package(self.name.clone()),
        }
    }
}

/// Keys other than `module` and `path` are left to the addon.
#[derive(Debug, Deserialize)]
struct RawDescriptor {
    module: String,
    #[serde(default)]
    path: Option<String>,
}

/// Parsed `addons.yml`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddonManifest {
    entries: Vec<AddonDescriptor>,
}

impl AddonManifest {
    /// Read the manifest. A missing file yields `Ok(None)`.
    pub fn read(path: &Path) -> Result<Option<Self>, AddonError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(AddonError::ReadManifest {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::parse(&content, path).map(Some)
    }

    /// Parse manifest text. `origin` is only used in error messages.
    pub fn parse(content: &str, origin: &Path) -> Result<Self, AddonError> {
        if is_blank_document(content) {
            return Ok(Self::default());
        }

        let value: Value = serde_yaml::from_str(content).map_err(|source| AddonError::ParseManifest {
            path: origin.to_path_buf(),
            source,
        })?;

        let mapping = match value {
            Value::Null => return Ok(Self::default()),
            Value::Mapping(mapping) => mapping,
            _ => {
                return Err(AddonError::InvalidManifest {
                    path: origin.to_path_buf(),
                })
            }
        };

        let mut entries = Vec::with_capacity(mapping.len());
        for (key, value) in mapping {
            let name = scalar_to_string(&key).ok_or_else(|| AddonError::InvalidManifest {
                path: origin.to_path_buf(),
            })?;
            let raw: RawDescriptor = serde_yaml::from_value(value).map_err(|source| {
                AddonError::InvalidDescriptor {
                    addon: name.clone(),
                    source,
                }
            })?;
            entries.push(AddonDescriptor {
                name,
                module: raw.module,
                path: raw.path.filter(|p| !p.trim().is_empty()),
            });
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[AddonDescriptor] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Result<AddonManifest, AddonError> {
        AddonManifest::parse(yaml, Path::new("addons.yml"))
    }

    #[test]
    fn test_entries_keep_file_order() {
        let manifest = parse("zeta:\n  module: Zeta\nalpha:\n  module: Alpha\n  path: addons/alpha\n").unwrap();
        let entries = manifest.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "zeta");
        assert_eq!(entries[0].path, None);
        assert_eq!(entries[1].name, "alpha");
        assert_eq!(entries[1].module, "Alpha");
        assert_eq!(entries[1].path.as_deref(), Some("addons/alpha"));
    }

    #[test]
    fn test_blank_and_null_manifests_are_empty() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("# only comments\n").unwrap().is_empty());
        assert!(parse("~\n").unwrap().is_empty());
    }

    #[test]
    fn test_missing_file_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(AddonManifest::read(&tmp.path().join("addons.yml")).unwrap(), None);
    }

    #[test]
    fn test_descriptor_without_module() {
        let err = parse("broken:\n  path: addons/broken\n").unwrap_err();
        assert_eq!(err.addon(), Some("broken"));
    }

    #[test]
    fn test_extra_descriptor_keys_tolerated() {
        let manifest = parse("status:\n  module: Status\n  interval: 30\n  tags: [a, b]\n").unwrap();
        assert_eq!(manifest.entries().len(), 1);
        assert_eq!(manifest.entries()[0].module, "Status");
    }

    #[test]
    fn test_sequence_manifest_rejected() {
        assert!(matches!(parse("- a\n").unwrap_err(), AddonError::InvalidManifest { .. }));
    }

    #[test]
    fn test_source_resolution() {
        let dir = Path::new("/home/op/.straight");
        let local = AddonDescriptor {
            name: "a".into(),
            module: "A".into(),
            path: Some("addons/a".into()),
        };
        assert_eq!(local.source(dir), AddonSource::Local(dir.join("addons/a")));

        let package = AddonDescriptor { path: None, ..local };
        assert_eq!(package.source(dir), AddonSource::Package("a".into()));
    }
}
