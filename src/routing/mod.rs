//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → router.rs (scan routes in registration order)
//!     → matcher.rs (evaluate the route's predicate)
//!     → Return: matched Handler or no route
//!
//! Route registration (startup only):
//!     RouteTable::initialize (built-in orders route)
//!     → addons append their routes
//!     → frozen behind Arc when serving starts
//! ```
//!
//! # Design Decisions
//! - Routes registered at startup, immutable at runtime
//! - Deterministic: same path always matches same route
//! - First match wins (registration order)

pub mod handler;
pub mod matcher;
pub mod router;

pub use handler::{Handler, HandlerFuture};
pub use matcher::{ExactMatcher, Matcher, PathPrefixMatcher, PredicateMatcher, RegexMatcher};
pub use router::{RouteEntry, RouteTable, ORDERS_ROUTE_PATTERN};
