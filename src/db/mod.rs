//! Database subsystem.
//!
//! # Data Flow
//! ```text
//! DbSettings (config.yml `db`)
//!     → connection.rs (normalize, resolve sqlite path, build connection string)
//!     → driver.rs (open the single process-wide handle)
//!     → migration.rs (apply bundled migrations if any are pending)
//! ```

pub mod connection;
pub mod driver;
pub mod migration;

pub use connection::{ConnectionDescriptor, ConnectionParts};
pub use driver::{ConnectionError, DatabaseDriver, SqlxDriver};
pub use migration::{MigrationEngine, MigrationError, MigrationOutcome, MigrationSource, SqlxMigrator};
