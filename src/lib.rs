//! Straight payment gateway server: startup orchestration and request routing.

pub mod addons;
pub mod config;
pub mod db;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::Settings;
pub use http::GatewayServer;
pub use lifecycle::{Startup, StartupError, StartupPaths};
