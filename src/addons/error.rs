//! Errors raised while reading, resolving or attaching addons.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error type addons return from [`Addon::attach`](crate::addons::Addon::attach).
pub type AttachError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum AddonError {
    #[error("failed to read addon manifest {}: {source}", .path.display())]
    ReadManifest {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse addon manifest {}: {source}", .path.display())]
    ParseManifest {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("addon manifest {} must be a mapping of addon names", .path.display())]
    InvalidManifest { path: PathBuf },

    #[error("addon '{addon}' has an invalid descriptor: {source}")]
    InvalidDescriptor {
        addon: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("addon '{addon}' not found at {}", .path.display())]
    MissingPath { addon: String, path: PathBuf },

    #[error("addon '{addon}' requests unknown module '{module}'")]
    UnknownModule { addon: String, module: String },

    #[error("addons were already loaded")]
    AlreadyLoaded,

    #[error("module '{module}' is already registered")]
    DuplicateModule { module: String },

    #[error("addon '{addon}' failed to attach: {source}")]
    Attach {
        addon: String,
        #[source]
        source: AttachError,
    },
}

impl AddonError {
    /// Name of the addon the failure is attributed to, if any.
    pub fn addon(&self) -> Option<&str> {
        match self {
            Self::InvalidDescriptor { addon, .. }
            | Self::MissingPath { addon, .. }
            | Self::UnknownModule { addon, .. }
            | Self::Attach { addon, .. } => Some(addon),
            Self::ReadManifest { .. }
            | Self::ParseManifest { .. }
            | Self::InvalidManifest { .. }
            | Self::AlreadyLoaded
            | Self::DuplicateModule { .. } => None,
        }
    }
}
