//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Scaffold → Load config → Validate → Logging → Database → Migrations
//!     → Built-in routes → GatewayServer
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → broadcast → Stop accepting → Drain requests → Exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then database, then listeners
//! - A first run stops cleanly once templates are written

pub mod signals;
pub mod startup;

pub use startup::{start_metrics, Startup, StartupError, StartupPaths};
