//! Database driver seam.
//!
//! Startup only needs "turn a descriptor into a live handle". The production
//! driver opens a single `sqlx::AnyPool`; tests substitute their own.

use std::fs::{self, OpenOptions};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use thiserror::Error;

use crate::db::connection::ConnectionDescriptor;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("failed to connect to {target}: {source}")]
    Connect {
        /// Connection string with the password masked.
        target: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to create database file {}: {source}", .path.display())]
    CreateDatabaseFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Opens the process-wide database handle.
pub trait DatabaseDriver: Send + Sync {
    type Connection: Send + Sync + 'static;

    fn connect(
        &self,
        descriptor: &ConnectionDescriptor,
    ) -> impl Future<Output = Result<Self::Connection, ConnectionError>> + Send;
}

/// Driver backed by `sqlx`'s runtime-selected `Any` backend.
#[derive(Debug, Clone)]
pub struct SqlxDriver {
    max_connections: u32,
}

impl SqlxDriver {
    pub fn new(max_connections: u32) -> Self {
        Self { max_connections }
    }
}

impl Default for SqlxDriver {
    fn default() -> Self {
        Self::new(5)
    }
}

impl DatabaseDriver for SqlxDriver {
    type Connection = AnyPool;

    async fn connect(&self, descriptor: &ConnectionDescriptor) -> Result<AnyPool, ConnectionError> {
        sqlx::any::install_default_drivers();

        if descriptor.is_file_based() {
            if let Some(path) = descriptor.name() {
                ensure_database_file(Path::new(path))?;
            }
        }

        let pool = AnyPoolOptions::new()
            .max_connections(self.max_connections)
            .connect(&driver_url(descriptor))
            .await
            .map_err(|source| ConnectionError::Connect {
                target: descriptor.redacted(),
                source,
            })?;

        tracing::info!(target_db = %descriptor.redacted(), "Database connection established");
        Ok(pool)
    }
}

/// Connection string in the form `sqlx` expects. `sqlite3` is spelled `sqlite`.
fn driver_url(descriptor: &ConnectionDescriptor) -> String {
    match (descriptor.is_file_based(), descriptor.name()) {
        (true, Some(path)) => format!("sqlite://{path}"),
        _ => descriptor.to_connection_string(),
    }
}

/// Embedded databases start from an empty file.
fn ensure_database_file(path: &Path) -> Result<(), ConnectionError> {
    let to_error = |source| ConnectionError::CreateDatabaseFile {
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
        .map_err(to_error)?;
    Ok(())
}
