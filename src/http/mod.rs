//! HTTP serving subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → RouteTable::resolve (first matching route)
//!     → route handler (orders.rs, addon handlers)
//!     → 404 when nothing matches
//! ```

pub mod orders;
pub mod server;

pub use server::{GatewayServer, HttpServer, DEFAULT_REQUEST_TIMEOUT};
