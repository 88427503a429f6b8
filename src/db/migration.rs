//! Schema migration gate.
//!
//! # Responsibilities
//! - Ask the migration engine whether the schema is current
//! - Apply pending migrations exactly when it is not
//!
//! # Design Decisions
//! - The engine is a collaborator behind [`MigrationEngine`]; the gate only
//!   decides whether to invoke it
//! - Failure is fatal: no retry, no rollback attempt
//! - After applying, the gate checks again and refuses to continue if the
//!   engine still reports pending work

use std::collections::HashSet;
use std::future::Future;
use std::ops::Deref;
use std::path::PathBuf;

use sqlx::migrate::{Migrate, MigrateError, Migrator};
use sqlx::AnyPool;
use thiserror::Error;

use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("failed to load migrations from {}: {source}", .dir.display())]
    Load {
        dir: PathBuf,
        #[source]
        source: MigrateError,
    },

    #[error("failed to read applied migrations: {0}")]
    Inspect(#[source] MigrateError),

    #[error("migration run failed: {0}")]
    Run(#[source] MigrateError),

    #[error("database error during migration check: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migrations still pending after a successful run")]
    StillPending,

    /// Raised by engines other than the bundled sqlx one.
    #[error("migration engine failure: {0}")]
    Engine(String),
}

/// Outcome of [`run_if_pending`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    AlreadyCurrent,
    Applied,
}

/// Compares and applies migration definitions against a datastore.
pub trait MigrationEngine: Send + Sync {
    type Connection: Send + Sync;

    /// True when every bundled definition has been applied.
    fn is_current(
        &self,
        conn: &Self::Connection,
    ) -> impl Future<Output = Result<bool, MigrationError>> + Send;

    /// Apply every pending definition in ascending version order.
    fn run(&self, conn: &Self::Connection) -> impl Future<Output = Result<(), MigrationError>> + Send;
}

/// True iff at least one bundled definition has not been applied.
pub async fn is_pending<E: MigrationEngine>(
    engine: &E,
    conn: &E::Connection,
) -> Result<bool, MigrationError> {
    Ok(!engine.is_current(conn).await?)
}

/// Apply pending migrations. Safe to call when nothing is pending.
pub async fn apply<E: MigrationEngine>(engine: &E, conn: &E::Connection) -> Result<(), MigrationError> {
    engine.run(conn).await
}

/// Startup gate: apply migrations if and only if some are pending.
pub async fn run_if_pending<E: MigrationEngine>(
    engine: &E,
    conn: &E::Connection,
) -> Result<MigrationOutcome, MigrationError> {
    if !is_pending(engine, conn).await? {
        tracing::debug!("Database schema is current");
        return Ok(MigrationOutcome::AlreadyCurrent);
    }

    tracing::info!("Pending migrations for the database detected. Migrating...");
    apply(engine, conn).await?;

    if is_pending(engine, conn).await? {
        return Err(MigrationError::StillPending);
    }

    metrics::record_migrations_applied();
    tracing::info!("Migrations applied");
    Ok(MigrationOutcome::Applied)
}

/// Definitions under `migrations/`, compiled into the binary.
static BUNDLED: Migrator = sqlx::migrate!("./migrations");

/// Where [`SqlxMigrator`] reads its definitions from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationSource {
    Bundled,
    /// A directory of `<version>_<description>.sql` files, read at startup.
    Directory(PathBuf),
}

/// Migration engine over `sqlx` migration definitions.
#[derive(Debug, Clone)]
pub struct SqlxMigrator {
    source: MigrationSource,
}

impl SqlxMigrator {
    /// The definitions shipped with the server.
    pub fn bundled() -> Self {
        Self {
            source: MigrationSource::Bundled,
        }
    }

    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            source: MigrationSource::Directory(dir.into()),
        }
    }

    pub fn source(&self) -> &MigrationSource {
        &self.source
    }

    async fn load(&self) -> Result<LoadedMigrator, MigrationError> {
        match &self.source {
            MigrationSource::Bundled => Ok(LoadedMigrator::Bundled(&BUNDLED)),
            MigrationSource::Directory(dir) => Migrator::new(dir.as_path())
                .await
                .map(LoadedMigrator::Directory)
                .map_err(|source| MigrationError::Load {
                    dir: dir.clone(),
                    source,
                }),
        }
    }
}

impl Default for SqlxMigrator {
    fn default() -> Self {
        Self::bundled()
    }
}

enum LoadedMigrator {
    Bundled(&'static Migrator),
    Directory(Migrator),
}

impl Deref for LoadedMigrator {
    type Target = Migrator;

    fn deref(&self) -> &Migrator {
        match self {
            Self::Bundled(migrator) => migrator,
            Self::Directory(migrator) => migrator,
        }
    }
}

impl MigrationEngine for SqlxMigrator {
    type Connection = AnyPool;

    async fn is_current(&self, pool: &AnyPool) -> Result<bool, MigrationError> {
        let migrator = self.load().await?;
        let mut conn = pool.acquire().await?;

        conn.ensure_migrations_table()
            .await
            .map_err(MigrationError::Inspect)?;
        let applied: HashSet<i64> = conn
            .list_applied_migrations()
            .await
            .map_err(MigrationError::Inspect)?
            .into_iter()
            .map(|m| m.version)
            .collect();

        let current = migrator
            .iter()
            .filter(|m| !m.migration_type.is_down_migration())
            .all(|m| applied.contains(&m.version));
        Ok(current)
    }

    async fn run(&self, pool: &AnyPool) -> Result<(), MigrationError> {
        let migrator = self.load().await?;
        migrator.run(pool).await.map_err(MigrationError::Run)
    }
}
