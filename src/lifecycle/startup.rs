//! Startup orchestration.
//!
//! [`start_server`] is the one-call bootstrap: defaults, admin routes, and
//! the full middleware chain, listening on `port`. Use
//! [`ServerBuilder`](crate::http::ServerBuilder) to register application
//! routes before starting.

use thiserror::Error;

use crate::config::loader::join;
use crate::config::ValidationError;
use crate::http::server::{ServerBuilder, ServerHandle};
use crate::observability::logger::SharedLogger;
use crate::routing::RouteError;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("app name is required")]
    MissingAppName,

    #[error("port is required")]
    MissingPort,

    #[error("a logger is required")]
    MissingLogger,

    #[error("invalid configuration: {}", join(.0))]
    InvalidConfig(Vec<ValidationError>),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("invalid CORS header: {0}")]
    Cors(#[from] axum::http::header::InvalidHeaderName),

    #[error("failed to bind listener: {0}")]
    Bind(#[source] std::io::Error),
}

/// Start a server with default settings and only the admin routes.
pub async fn start_server(
    app_name: &str,
    port: u16,
    logger: Option<SharedLogger>,
) -> Result<ServerHandle, StartupError> {
    ServerBuilder::new(app_name, port, logger)?.start().await
}
