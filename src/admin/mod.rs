//! Administrative endpoints.
//!
//! - `GET /_status`: liveness plus server introspection
//! - `GET /api/admin/_routes`: registered path patterns by method

pub mod handlers;

use axum::http::Method;
use axum::routing::get;
use axum::Router;

use crate::http::server::AppState;
use crate::routing::{RouteError, RouteTable};

pub use self::handlers::{DebugInfo, ServerInfo, SystemStatus};
use self::handlers::{get_routes, get_status};

pub const STATUS_PATH: &str = "/_status";
pub const ROUTES_PATH: &str = "/api/admin/_routes";

/// Register the admin routes after whatever the application registered.
pub fn mount(
    router: Router<AppState>,
    routes: &mut RouteTable,
) -> Result<Router<AppState>, RouteError> {
    routes.register(Method::GET, STATUS_PATH)?;
    routes.register(Method::GET, ROUTES_PATH)?;
    Ok(router
        .route(STATUS_PATH, get(get_status))
        .route(ROUTES_PATH, get(get_routes)))
}
