//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, file + stderr)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log file in the configuration directory
//!     → Metrics endpoint (Prometheus scrape), when enabled
//! ```
//!
//! # Design Decisions
//! - Logging starts only once `logmaster` settings are validated; earlier
//!   steps report to the operator directly
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
