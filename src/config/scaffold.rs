//! First-run scaffolding of the configuration directory.
//!
//! # Responsibilities
//! - Create the configuration directory when it does not exist
//! - Write bundled templates for every missing artifact
//! - Tell the operator what was created
//!
//! # Design Decisions
//! - Existing files are never overwritten (create-new semantics)
//! - A missing critical artifact halts startup after its template is written:
//!   the defaults carry placeholder credentials an operator has to review

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::{ADDONS_FILE, CONFIG_FILE};

pub const CONFIG_TEMPLATE: &str = include_str!("../../templates/config.yml");
pub const ADDONS_TEMPLATE: &str = include_str!("../../templates/addons.yml");

/// A file the server expects to find in its configuration directory.
#[derive(Debug, Clone, Copy)]
pub struct ConfigArtifact {
    pub file_name: &'static str,
    pub template: &'static str,
    /// Startup cannot continue on the template alone.
    pub critical: bool,
}

/// Artifacts in the order they are checked.
pub const ARTIFACTS: [ConfigArtifact; 2] = [
    ConfigArtifact {
        file_name: ADDONS_FILE,
        template: ADDONS_TEMPLATE,
        critical: false,
    },
    ConfigArtifact {
        file_name: CONFIG_FILE,
        template: CONFIG_TEMPLATE,
        critical: true,
    },
];

#[derive(Debug, Error)]
pub enum ScaffoldError {
    #[error("failed to create configuration directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write template {}: {source}", .path.display())]
    WriteTemplate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result of a scaffolding pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScaffoldOutcome {
    /// Every critical artifact exists. `created` lists templates written now.
    Ready { created: Vec<PathBuf> },
    /// A critical artifact was missing; its template was written to `written`.
    Halted { written: PathBuf, created: Vec<PathBuf> },
}

impl ScaffoldOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

/// Ensure the configuration directory holds every required artifact.
///
/// Human-readable notices go to `notices`; failing to write a notice is not
/// an error.
pub fn ensure_config_artifacts(
    config_dir: &Path,
    notices: &mut dyn Write,
) -> Result<ScaffoldOutcome, ScaffoldError> {
    fs::create_dir_all(config_dir).map_err(|source| ScaffoldError::CreateDir {
        path: config_dir.to_path_buf(),
        source,
    })?;

    let mut created = Vec::new();
    for artifact in ARTIFACTS {
        let path = config_dir.join(artifact.file_name);
        if !write_if_absent(&path, artifact.template)? {
            continue;
        }
        tracing::debug!(path = %path.display(), critical = artifact.critical, "Template written");

        if artifact.critical {
            let _ = writeln!(
                notices,
                "\x1b[1;33mWARNING!\x1b[0m \x1b[33mNo file {} was found. Created a sample one for you.\x1b[0m",
                path.display()
            );
            let _ = writeln!(notices, "You should edit it and try starting the server again.");
            return Ok(ScaffoldOutcome::Halted {
                written: path,
                created,
            });
        }

        let _ = writeln!(
            notices,
            "\x1b[1;33mNOTICE!\x1b[0m \x1b[33mNo file {} was found. Created an empty sample for you.\x1b[0m",
            path.display()
        );
        let _ = writeln!(
            notices,
            "No need to restart until you actually list your addons there. Continuing startup."
        );
        created.push(path);
    }

    Ok(ScaffoldOutcome::Ready { created })
}

/// Returns `true` when the file did not exist and the template was written.
fn write_if_absent(path: &Path, template: &str) -> Result<bool, ScaffoldError> {
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
        Err(source) => {
            return Err(ScaffoldError::WriteTemplate {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    file.write_all(template.as_bytes())
        .and_then(|()| file.flush())
        .map_err(|source| ScaffoldError::WriteTemplate {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(true)
}
