//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! ~/.straight/ (missing files)
//!     → scaffold.rs (write bundled templates, halt on first run)
//!
//! config.yml
//!     → loader.rs (parse YAML into a mapping)
//!     → settings.rs (populate immutable Settings)
//!     → validation.rs (required sections present and typed)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Settings are immutable once built; there is no global instance
//! - Unknown keys are kept for addons and future releases
//! - Validation reports every problem in one pass

pub mod loader;
pub mod scaffold;
pub mod schema;
pub mod settings;
pub mod validation;

use std::path::PathBuf;

pub use loader::{read_config_file, ConfigError};
pub use scaffold::{ensure_config_artifacts, ScaffoldError, ScaffoldOutcome};
pub use schema::{DbSettings, LogLevel, LogSettings};
pub use settings::{Settings, SettingsBuilder};
pub use validation::validate_settings;

/// Main configuration file, required.
pub const CONFIG_FILE: &str = "config.yml";

/// Addon manifest, optional.
pub const ADDONS_FILE: &str = "addons.yml";

const CONFIG_DIR_NAME: &str = ".straight";

/// `~/.straight`, or `./.straight` when no home directory can be determined.
pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}
