//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Validate the bootstrap configuration before any socket is opened
//! - Record user routes in the route table as they are registered
//! - Wire up middleware in a fixed order (see [`crate::http::middleware`])
//! - Mount the admin routes, bind the listener, and serve in the background

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::handler::Handler;
use axum::http::{Method, Uri};
use axum::middleware;
use axum::routing::{on, MethodFilter};
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultOnFailure, TraceLayer};
use tracing::Level;

use crate::admin::{self, ServerInfo};
use crate::config::{validate_config, ServiceConfig};
use crate::http::error::ApiError;
use crate::http::middleware::{
    audit_requests, cors_layer, negotiate_accept, parse_body, parse_query, request_scope,
    stamp_response_time, Acceptable, BodyLimit,
};
use crate::http::request::UuidRequestId;
use crate::lifecycle::startup::StartupError;
use crate::lifecycle::Shutdown;
use crate::observability::audit::{AuditLogger, AuditOptions};
use crate::observability::logger::SharedLogger;
use crate::routing::{RouteError, RouteRegistry, RouteTable};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub info: Arc<ServerInfo>,
    pub registry: Arc<dyn RouteRegistry>,
}

/// Collects configuration and routes, then starts the server.
pub struct ServerBuilder {
    config: ServiceConfig,
    logger: SharedLogger,
    router: Router<AppState>,
    routes: RouteTable,
}

impl ServerBuilder {
    /// Bootstrap with default settings for `app_name` on `port`.
    ///
    /// An empty name, a zero port or a missing logger is a configuration
    /// error; nothing is bound.
    pub fn new(
        app_name: impl Into<String>,
        port: u16,
        logger: Option<SharedLogger>,
    ) -> Result<Self, StartupError> {
        let mut config = ServiceConfig::default();
        config.server.name = app_name.into();
        config.server.port = port;
        Self::from_config(config, logger)
    }

    /// Bootstrap from a loaded configuration.
    pub fn from_config(
        config: ServiceConfig,
        logger: Option<SharedLogger>,
    ) -> Result<Self, StartupError> {
        if config.server.name.trim().is_empty() {
            return Err(StartupError::MissingAppName);
        }
        if config.server.port == 0 {
            return Err(StartupError::MissingPort);
        }
        let logger = logger.ok_or(StartupError::MissingLogger)?;
        validate_config(&config).map_err(StartupError::InvalidConfig)?;

        Ok(Self {
            config,
            logger,
            router: Router::new(),
            routes: RouteTable::new(),
        })
    }

    /// Adjust the configuration before start. Re-validated by [`start`](Self::start).
    pub fn configure(mut self, f: impl FnOnce(&mut ServiceConfig)) -> Self {
        f(&mut self.config);
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Register `handler` for `method` on `path`.
    ///
    /// Paths use `{name}` captures; `:name` segments and patterns that
    /// differ from an existing one only by capture names are rejected.
    pub fn route<H, T>(mut self, method: Method, path: &str, handler: H) -> Result<Self, StartupError>
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        let filter = MethodFilter::try_from(method.clone())
            .map_err(|_| RouteError::UnsupportedMethod(method.clone()))?;
        self.routes.register(method, path)?;
        self.router = self.router.route(path, on(filter, handler));
        Ok(self)
    }

    pub fn get<H, T>(self, path: &str, handler: H) -> Result<Self, StartupError>
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        self.route(Method::GET, path, handler)
    }

    pub fn post<H, T>(self, path: &str, handler: H) -> Result<Self, StartupError>
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        self.route(Method::POST, path, handler)
    }

    pub fn put<H, T>(self, path: &str, handler: H) -> Result<Self, StartupError>
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        self.route(Method::PUT, path, handler)
    }

    pub fn patch<H, T>(self, path: &str, handler: H) -> Result<Self, StartupError>
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        self.route(Method::PATCH, path, handler)
    }

    pub fn delete<H, T>(self, path: &str, handler: H) -> Result<Self, StartupError>
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        self.route(Method::DELETE, path, handler)
    }

    /// Mount admin routes and build the full middleware stack without
    /// binding. `url` is what the status endpoint reports.
    pub fn into_router(self, url: &str) -> Result<Router, StartupError> {
        validate_config(&self.config).map_err(StartupError::InvalidConfig)?;
        let cors = cors_layer(&self.config.cors)?;

        let Self {
            config,
            logger,
            router,
            mut routes,
        } = self;
        let router = admin::mount(router, &mut routes)?;

        let state = AppState {
            info: Arc::new(ServerInfo::new(&config, url)),
            registry: Arc::new(routes),
        };
        Ok(build_router(router, state, &config, logger, cors))
    }

    /// Bind the listener, log the startup line, and serve in the background.
    pub async fn start(self) -> Result<ServerHandle, StartupError> {
        validate_config(&self.config).map_err(StartupError::InvalidConfig)?;

        let name = self.config.server.name.clone();
        let logger = self.logger.clone();
        let listener = TcpListener::bind((self.config.server.host.as_str(), self.config.server.port))
            .await
            .map_err(StartupError::Bind)?;
        let local_addr = listener.local_addr().map_err(StartupError::Bind)?;
        let url = format!("http://{local_addr}");

        let app = self.into_router(&url)?;

        logger.info(
            &format!("{name} listening at {url}"),
            crate::fields!("name" => name, "url" => url),
        );

        let shutdown = Shutdown::new();
        let mut stop = shutdown.subscribe();
        let task = tokio::spawn(async move {
            axum::serve(listener, app.into_make_service())
                .with_graceful_shutdown(async move {
                    let _ = stop.recv().await;
                })
                .await
        });

        Ok(ServerHandle {
            local_addr,
            url,
            shutdown,
            task,
        })
    }
}

/// Build the router with all middleware layers.
///
/// `.layer` wraps everything added before it, so the list below reads from
/// innermost (next to the handler) to outermost.
#[allow(deprecated)]
fn build_router(
    router: Router<AppState>,
    state: AppState,
    config: &ServiceConfig,
    logger: SharedLogger,
    cors: CorsLayer,
) -> Router {
    let mut app = router
        .fallback(not_found)
        .with_state(state)
        .layer(middleware::from_fn_with_state(logger.clone(), request_scope))
        .layer(middleware::from_fn_with_state(
            BodyLimit(config.limits.max_body_bytes),
            parse_body,
        ))
        .layer(middleware::from_fn(parse_query))
        .layer(middleware::from_fn_with_state(
            Acceptable::new(&config.accept.acceptable),
            negotiate_accept,
        ))
        .layer(cors)
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

    if config.audit.response_time_header {
        app = app.layer(middleware::from_fn(stamp_response_time));
    }
    if config.audit.enabled {
        let audit = AuditLogger::new(
            AuditOptions::new(logger).capture_body(config.audit.capture_body),
        );
        app = app.layer(middleware::from_fn_with_state(Arc::new(audit), audit_requests));
    }

    app.layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
        .layer(
            // 5xx responses are already reported once by the request scope
            // and the audit entry.
            TraceLayer::new_for_http().on_failure(DefaultOnFailure::new().level(Level::DEBUG)),
        )
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}

/// A running server.
///
/// Dropping the handle closes the shutdown channel, which stops the server.
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    url: String,
    shutdown: Shutdown,
    task: JoinHandle<std::io::Result<()>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// `http://<addr>` of the bound listener.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Stop accepting connections, drain in-flight requests, and wait.
    pub async fn shutdown(self) -> std::io::Result<()> {
        self.shutdown.trigger();
        self.wait().await
    }

    /// Wait for the server task to finish.
    pub async fn wait(self) -> std::io::Result<()> {
        self.task.await.map_err(std::io::Error::other)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::observability::logger::MemoryLogger;

    fn builder() -> ServerBuilder {
        let logger: SharedLogger = Arc::new(MemoryLogger::new());
        ServerBuilder::new("unit", 8080, Some(logger)).unwrap()
    }

    async fn ok() -> &'static str {
        "ok"
    }

    #[tokio::test]
    async fn admin_routes_are_mounted() {
        let app = builder().into_router("http://test").unwrap();
        let res = app
            .oneshot(Request::get("/api/admin/_routes").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn unmatched_paths_are_json_not_found() {
        let app = builder().into_router("http://test").unwrap();
        let res = app
            .oneshot(Request::get("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(res.into_body(), 1024).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["code"], "ResourceNotFound");
    }

    #[test]
    fn duplicate_routes_are_rejected() {
        let err = builder().get("/a", ok).unwrap().get("/a", ok).err().unwrap();
        assert!(matches!(
            err,
            StartupError::Route(RouteError::Duplicate { .. })
        ));
    }

    #[test]
    fn malformed_paths_are_errors_not_panics() {
        let err = builder().get("/items/:id", ok).err().unwrap();
        assert!(matches!(err, StartupError::Route(RouteError::InvalidPath(_))));

        let err = builder()
            .get("/items/{id}", ok)
            .unwrap()
            .delete("/items/{item_id}", ok)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            StartupError::Route(RouteError::ConflictingCaptures { .. })
        ));
    }

    #[test]
    fn invalid_settings_fail_before_binding() {
        let err = builder()
            .configure(|c| c.cors.allow_headers.push("not a header".into()))
            .into_router("http://test")
            .unwrap_err();
        match err {
            StartupError::InvalidConfig(errors) => assert_eq!(errors.len(), 1),
            other => panic!("unexpected error: {other}"),
        }
    }
}
