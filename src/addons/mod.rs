//! Addon subsystem: the server's extension point.
//!
//! # Data Flow
//! ```text
//! addons.yml
//!     → manifest.rs (name → {module, path}, file order)
//!     → loader.rs (resolve each descriptor against the registry)
//!     → host.rs (Addon::attach on a staged route table)
//!     → commit routes, or fail naming the addon
//! ```

pub mod builtin;
pub mod error;
pub mod host;
pub mod loader;
pub mod manifest;
pub mod registry;

pub use builtin::StatusAddon;
pub use error::{AddonError, AttachError};
pub use host::{Addon, AddonHost};
pub use loader::AddonLoader;
pub use manifest::{AddonDescriptor, AddonManifest, AddonSource};
pub use registry::AddonRegistry;
