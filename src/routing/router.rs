//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store routes in registration order
//! - Look up the handler for a request path
//! - Return an explicit no-match rather than a silent default
//!
//! # Design Decisions
//! - O(n) scan in insertion order, first match wins
//! - Mutation needs `&mut self`; once the server starts serving the table
//!   lives behind an `Arc` and can no longer change

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::routing::handler::Handler;
use crate::routing::matcher::{Matcher, RegexMatcher};

/// Pattern of the built-in order-management route.
pub const ORDERS_ROUTE_PATTERN: &str = r"^/gateways/.+?/orders(/.+)?$";

static ORDERS_ROUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ORDERS_ROUTE_PATTERN).expect("orders route pattern compiles"));

/// One (matcher, handler) binding.
#[derive(Clone)]
pub struct RouteEntry {
    matcher: Arc<dyn Matcher>,
    handler: Arc<dyn Handler>,
}

impl RouteEntry {
    pub fn matcher(&self) -> &dyn Matcher {
        self.matcher.as_ref()
    }

    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("matcher", &self.matcher)
            .finish_non_exhaustive()
    }
}

/// Ordered set of routes.
#[derive(Clone, Default, Debug)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding only the built-in orders route.
    pub fn initialize(orders_handler: Arc<dyn Handler>) -> Self {
        let mut table = Self::new();
        table.push(
            Arc::new(RegexMatcher::from(ORDERS_ROUTE.clone())),
            orders_handler,
        );
        table
    }

    /// Append a route. Earlier routes take precedence.
    pub fn add_route<M, H>(&mut self, matcher: M, handler: H)
    where
        M: Matcher + 'static,
        H: Handler + 'static,
    {
        self.push(Arc::new(matcher), Arc::new(handler));
    }

    /// Append a route matched by a regular expression.
    pub fn add_pattern<H>(&mut self, pattern: &str, handler: H) -> Result<(), regex::Error>
    where
        H: Handler + 'static,
    {
        self.add_route(RegexMatcher::new(pattern)?, handler);
        Ok(())
    }

    /// Append a route whose handler is already shared.
    pub fn push(&mut self, matcher: Arc<dyn Matcher>, handler: Arc<dyn Handler>) {
        tracing::debug!(matcher = ?matcher, index = self.entries.len(), "Route registered");
        self.entries.push(RouteEntry { matcher, handler });
    }

    /// Handler of the first route accepting `path`, or `None` when no route does.
    pub fn resolve(&self, path: &str) -> Option<&Arc<dyn Handler>> {
        self.entries
            .iter()
            .find(|entry| entry.matcher.matches(path))
            .map(|entry| &entry.handler)
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
