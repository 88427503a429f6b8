//! Addons shipped with the server.

use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::addons::error::AttachError;
use crate::addons::host::{Addon, AddonHost};
use crate::routing::ExactMatcher;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

/// Adds `GET /status`, a liveness check for load balancers.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusAddon;

impl StatusAddon {
    pub const MODULE: &'static str = "Status";
    pub const PATH: &'static str = "/status";
}

impl Addon for StatusAddon {
    fn attach(&self, host: &mut AddonHost<'_>) -> Result<(), AttachError> {
        host.add_route(ExactMatcher::new(Self::PATH), status);
        Ok(())
    }
}

async fn status(_request: Request<Body>) -> Response {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
    .into_response()
}
