//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber from the `logmaster` settings
//! - Write to the configured log file and to stderr
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured level
//! - A subscriber installed earlier (tests, embedding) is kept
//! - Alert delivery (`email_config`) belongs to the logging backend; it is
//!   carried on [`Logger`] untouched

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_yaml::Mapping;
use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::{LogLevel, LogSettings};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to open log file {}: {source}", .path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid log filter: {0}")]
    Filter(#[from] ParseError),
}

/// The process logger as configured.
#[derive(Debug, Clone)]
pub struct Logger {
    pub file: PathBuf,
    pub level: LogLevel,
    pub name: Option<String>,
    pub raise_exception: bool,
    pub email_config: Option<Mapping>,
    /// False when another subscriber was already installed.
    pub installed: bool,
}

/// Install the global subscriber described by `settings`.
pub fn init_logging(settings: &LogSettings, config_dir: &Path) -> Result<Logger, LoggingError> {
    let path = config_dir.join(&settings.file);
    let file = open_log_file(&path)?;

    let installed = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_filter(build_filter(settings.log_level)?),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_filter(build_filter(settings.log_level)?),
        )
        .try_init()
        .is_ok();

    if !installed {
        tracing::debug!("A tracing subscriber is already installed, keeping it");
    }

    let logger = Logger {
        file: path,
        level: settings.log_level,
        name: settings.name.clone(),
        raise_exception: settings.raise_exception,
        email_config: settings.email_config.clone(),
        installed,
    };

    tracing::info!(
        logger = logger.name.as_deref().unwrap_or("default"),
        level = %logger.level,
        file = %logger.file.display(),
        "Logger initialized"
    );
    Ok(logger)
}

/// Filter for `level`, unless `RUST_LOG` says otherwise.
pub fn build_filter(level: LogLevel) -> Result<EnvFilter, ParseError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(format!("{},sqlx=warn", level.as_filter_directive())),
    }
}

fn open_log_file(path: &Path) -> Result<fs::File, LoggingError> {
    let to_error = |source| LoggingError::OpenFile {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(to_error)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(to_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_for_every_level() {
        for level in [
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
            LogLevel::Fatal,
            LogLevel::Unknown,
        ] {
            assert!(build_filter(level).is_ok(), "{level}");
        }
    }

    #[test]
    fn test_init_creates_log_file() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = LogSettings {
            log_level: LogLevel::Info,
            file: "logs/straight.log".into(),
            raise_exception: true,
            name: Some("test logger".into()),
            email_config: None,
        };

        let logger = init_logging(&settings, tmp.path()).unwrap();
        assert_eq!(logger.file, tmp.path().join("logs/straight.log"));
        assert!(logger.file.exists());
        assert!(logger.raise_exception);
        assert_eq!(logger.name.as_deref(), Some("test logger"));
    }
}
