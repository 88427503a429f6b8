//! Request handler seam.

use std::future::Future;
use std::pin::Pin;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;

pub type HandlerFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Processes a request that a route matched.
pub trait Handler: Send + Sync {
    fn handle(&self, request: Request<Body>) -> HandlerFuture;
}

impl<F, Fut> Handler for F
where
    F: Fn(Request<Body>) -> Fut + Send + Sync,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn handle(&self, request: Request<Body>) -> HandlerFuture {
        Box::pin(self(request))
    }
}
