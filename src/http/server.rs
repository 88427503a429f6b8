//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the Axum router around the frozen route table
//! - Wire up middleware (tracing, timeout, request ID)
//! - Dispatch every request to the first matching route
//! - Serve until shutdown is signalled

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::addons::{AddonError, AddonLoader};
use crate::config::{Settings, ADDONS_FILE};
use crate::observability::logging::Logger;
use crate::observability::metrics;
use crate::routing::{Handler, Matcher, RouteTable};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP front end over an immutable route table.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(routes: Arc<RouteTable>, request_timeout: Duration) -> Self {
        Self {
            router: Self::build_router(routes, request_timeout),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(routes: Arc<RouteTable>, request_timeout: Duration) -> Router {
        Router::new()
            .fallback(dispatch)
            .with_state(routes)
            .layer(TimeoutLayer::new(request_timeout))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    pub fn into_router(self) -> Router {
        self.router
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn dispatch(State(routes): State<Arc<RouteTable>>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let path = request.uri().path().to_string();

    let Some(handler) = routes.resolve(&path) else {
        tracing::warn!(path = %path, "No route matched");
        metrics::record_request(false, StatusCode::NOT_FOUND.as_u16(), start);
        return (StatusCode::NOT_FOUND, "No matching route found").into_response();
    };

    tracing::debug!(method = %request.method(), path = %path, "Dispatching request");
    let response = handler.handle(request).await;
    metrics::record_request(true, response.status().as_u16(), start);
    response
}

/// A fully started gateway, ready to accept traffic.
///
/// Routes can be added until [`serve`](Self::serve) consumes the server.
pub struct GatewayServer<C> {
    settings: Arc<Settings>,
    config_dir: PathBuf,
    db: C,
    routes: RouteTable,
    logger: Logger,
    addons: Vec<String>,
    addons_loaded: bool,
    request_timeout: Duration,
}

impl<C> GatewayServer<C> {
    pub fn new(
        settings: Arc<Settings>,
        config_dir: PathBuf,
        db: C,
        routes: RouteTable,
        logger: Logger,
    ) -> Self {
        Self {
            settings,
            config_dir,
            db,
            routes,
            logger,
            addons: Vec::new(),
            addons_loaded: false,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// The process-wide database handle.
    pub fn db(&self) -> &C {
        &self.db
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Names of the addons attached so far, in load order.
    pub fn addons(&self) -> &[String] {
        &self.addons
    }

    pub fn add_route<M, H>(&mut self, matcher: M, handler: H)
    where
        M: Matcher + 'static,
        H: Handler + 'static,
    {
        self.routes.add_route(matcher, handler);
    }

    /// Attach the addons listed in `addons.yml`. Routes are unchanged on error.
    ///
    /// The manifest is loaded at most once; later calls fail with
    /// [`AddonError::AlreadyLoaded`].
    pub fn load_addons(&mut self, loader: &AddonLoader) -> Result<&[String], AddonError> {
        if self.addons_loaded {
            return Err(AddonError::AlreadyLoaded);
        }
        let manifest = self.config_dir.join(ADDONS_FILE);
        let loaded = loader.load_all(&manifest, &mut self.routes, &self.settings)?;
        self.addons_loaded = true;
        if !loaded.is_empty() {
            tracing::info!(addons = ?loaded, "Addons loaded");
        }
        self.addons.extend(loaded);
        Ok(&self.addons)
    }

    /// Freeze the route table and build the HTTP front end.
    pub fn into_http(self) -> (HttpServer, C) {
        tracing::info!(routes = self.routes.len(), addons = self.addons.len(), "Route table frozen");
        let http = HttpServer::new(Arc::new(self.routes), self.request_timeout);
        (http, self.db)
    }

    /// Serve traffic until `shutdown` fires.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), io::Error> {
        let (http, db) = self.into_http();
        let result = http.run(listener, shutdown).await;
        drop(db);
        result
    }
}
