//! Shared fakes and fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use straight_gateway::db::migration::{MigrationEngine, MigrationError};
use straight_gateway::db::{ConnectionDescriptor, ConnectionError, DatabaseDriver};

/// The "database handle" handed out by [`FakeDriver`].
#[derive(Debug, Clone)]
pub struct FakeConnection {
    pub target: String,
}

/// Records every connection attempt instead of opening one.
#[derive(Clone, Default)]
pub struct FakeDriver {
    pub connects: Arc<AtomicUsize>,
    pub targets: Arc<Mutex<Vec<String>>>,
    /// Refuse every connection, as an unreachable server would.
    pub fail_connect: bool,
}

impl FakeDriver {
    pub fn unreachable() -> Self {
        Self {
            fail_connect: true,
            ..Self::default()
        }
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn last_target(&self) -> Option<String> {
        self.targets.lock().unwrap().last().cloned()
    }
}

impl DatabaseDriver for FakeDriver {
    type Connection = FakeConnection;

    async fn connect(&self, descriptor: &ConnectionDescriptor) -> Result<FakeConnection, ConnectionError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect {
            return Err(ConnectionError::Connect {
                target: descriptor.redacted(),
                source: sqlx::Error::PoolTimedOut,
            });
        }
        let target = descriptor.to_connection_string();
        self.targets.lock().unwrap().push(target.clone());
        Ok(FakeConnection { target })
    }
}

/// A datastore schema that is either current or not.
///
/// State is shared between clones so several startups can run against the
/// same "database".
#[derive(Clone)]
pub struct FakeMigrator {
    pub pending: Arc<AtomicBool>,
    pub checks: Arc<AtomicUsize>,
    pub runs: Arc<AtomicUsize>,
    /// `run` fails and leaves the schema pending.
    pub fail_run: bool,
}

impl FakeMigrator {
    pub fn new(pending: bool) -> Self {
        Self {
            pending: Arc::new(AtomicBool::new(pending)),
            checks: Arc::new(AtomicUsize::new(0)),
            runs: Arc::new(AtomicUsize::new(0)),
            fail_run: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_run: true,
            ..Self::new(true)
        }
    }

    pub fn run_count(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

impl MigrationEngine for FakeMigrator {
    type Connection = FakeConnection;

    async fn is_current(&self, _conn: &FakeConnection) -> Result<bool, MigrationError> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        Ok(!self.pending.load(Ordering::SeqCst))
    }

    async fn run(&self, _conn: &FakeConnection) -> Result<(), MigrationError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if self.fail_run {
            return Err(MigrationError::Engine("table orders already exists".into()));
        }
        self.pending.store(false, Ordering::SeqCst);
        Ok(())
    }
}

pub const SQLITE_CONFIG: &str = "\
db:
  adapter: sqlite
  name: gateway.db
logmaster:
  log_level: DEBUG
  file: straight.log
  raise_exception: false
  name: Integration test logger
";

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}
