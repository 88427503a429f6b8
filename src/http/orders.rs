//! Default handler for the built-in orders route.
//!
//! Order management is provided by a separate controller, installed through
//! [`Startup::with_orders_handler`](crate::lifecycle::Startup::with_orders_handler).
//! Until one is installed the route answers `501 Not Implemented`.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct NotInstalled<'a> {
    error: &'static str,
    path: &'a str,
}

pub async fn not_installed(request: Request<Body>) -> Response {
    let path = request.uri().path();
    tracing::warn!(path = %path, "Orders request without an order controller");
    (
        StatusCode::NOT_IMPLEMENTED,
        Json(NotInstalled {
            error: "order controller not installed",
            path,
        }),
    )
        .into_response()
}
