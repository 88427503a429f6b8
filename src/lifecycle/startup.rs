//! Startup orchestration.
//!
//! # Responsibilities
//! - Scaffold the configuration directory on first run
//! - Load and validate configuration, then start logging
//! - Open the database handle and bring its schema up to date
//! - Install the built-in orders route
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and nothing is retried
//! - Steps run strictly in order, each completing before the next
//! - Addons and listeners come after [`Startup::prepare`], once the
//!   [`GatewayServer`] exists

use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use metrics_exporter_prometheus::BuildError;
use thiserror::Error;

use crate::addons::AddonError;
use crate::config::{
    default_config_dir, ensure_config_artifacts, read_config_file,
    validate_settings, ConfigError, ScaffoldError, ScaffoldOutcome, Settings, ADDONS_FILE,
    CONFIG_FILE,
};
use crate::db::migration::{self, MigrationEngine, MigrationError};
use crate::db::{ConnectionDescriptor, ConnectionError, DatabaseDriver};
use crate::http::orders;
use crate::http::GatewayServer;
use crate::observability::logging::{init_logging, LoggingError};
use crate::observability::metrics;
use crate::routing::{Handler, RouteTable};

#[derive(Debug, Error)]
pub enum StartupError {
    /// The main configuration file was just created from its template.
    #[error("{} was created from a template and needs review", .config_path.display())]
    FirstRun { config_path: PathBuf },

    #[error(transparent)]
    Scaffold(#[from] ScaffoldError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Migration(#[from] MigrationError),

    #[error(transparent)]
    Addon(#[from] AddonError),

    #[error("failed to start metrics endpoint: {0}")]
    Metrics(#[from] BuildError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StartupError {
    /// Process exit code for this failure. A first run is a clean stop.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::FirstRun { .. } => 0,
            _ => 1,
        }
    }
}

/// Start the Prometheus endpoint when an address is configured.
pub fn start_metrics(addr: Option<SocketAddr>) -> Result<(), StartupError> {
    match addr {
        Some(addr) => Ok(metrics::init_metrics(addr)?),
        None => Ok(()),
    }
}

/// Filesystem locations startup reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupPaths {
    pub config_dir: PathBuf,
}

impl StartupPaths {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    pub fn addons_file(&self) -> PathBuf {
        self.config_dir.join(ADDONS_FILE)
    }
}

impl Default for StartupPaths {
    fn default() -> Self {
        Self::new(default_config_dir())
    }
}

/// Startup sequence over a database driver and a migration engine.
pub struct Startup<D, M> {
    paths: StartupPaths,
    driver: D,
    migrator: M,
    orders_handler: Arc<dyn Handler>,
}

impl<D, M> Startup<D, M>
where
    D: DatabaseDriver,
    M: MigrationEngine<Connection = D::Connection>,
{
    pub fn new(paths: StartupPaths, driver: D, migrator: M) -> Self {
        Self {
            paths,
            driver,
            migrator,
            orders_handler: Arc::new(orders::not_installed),
        }
    }

    /// Handler for `/gateways/<id>/orders(/<suffix>)`.
    pub fn with_orders_handler<H: Handler + 'static>(mut self, handler: H) -> Self {
        self.orders_handler = Arc::new(handler);
        self
    }

    pub fn paths(&self) -> &StartupPaths {
        &self.paths
    }

    /// Run every startup step in order.
    ///
    /// Operator notices (first-run scaffolding) are written to `notices`.
    pub async fn prepare(
        self,
        notices: &mut (dyn Write + Send),
    ) -> Result<GatewayServer<D::Connection>, StartupError> {
        let config_dir = self.paths.config_dir.clone();

        if let ScaffoldOutcome::Halted { written, .. } = ensure_config_artifacts(&config_dir, &mut *notices)? {
            let _ = writeln!(notices, "Shutting down now.");
            return Err(StartupError::FirstRun {
                config_path: written,
            });
        }

        let mapping = read_config_file(&self.paths.config_file())?;
        let settings = Settings::builder().populate(mapping)?.build();
        let (db_settings, log_settings) = validate_settings(&settings)?;

        let logger = init_logging(&log_settings, &config_dir)?;
        tracing::info!(
            config_dir = %config_dir.display(),
            keys = settings.len(),
            "Configuration loaded"
        );

        let descriptor = ConnectionDescriptor::build(&db_settings, &config_dir)?;
        let db = self.driver.connect(&descriptor).await?;

        let outcome = migration::run_if_pending(&self.migrator, &db).await?;
        tracing::info!(outcome = ?outcome, "Database ready");

        let routes = RouteTable::initialize(self.orders_handler);
        Ok(GatewayServer::new(
            Arc::new(settings),
            config_dir,
            db,
            routes,
            logger,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let first_run = StartupError::FirstRun {
            config_path: PathBuf::from("/tmp/config.yml"),
        };
        assert_eq!(first_run.exit_code(), 0);

        let config = StartupError::from(ConfigError::Missing { key: "db".into() });
        assert_eq!(config.exit_code(), 1);

        let migration = StartupError::from(MigrationError::StillPending);
        assert_eq!(migration.exit_code(), 1);
    }

    #[test]
    fn test_metrics_disabled_without_address() {
        assert!(start_metrics(None).is_ok());
    }

    #[test]
    fn test_paths() {
        let paths = StartupPaths::new("/etc/straight");
        assert_eq!(paths.config_file(), PathBuf::from("/etc/straight/config.yml"));
        assert_eq!(paths.addons_file(), PathBuf::from("/etc/straight/addons.yml"));
    }
}
