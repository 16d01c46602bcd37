use std::time::Instant;

use axum::extract::State;
use serde::Serialize;

use crate::config::ServiceConfig;
use crate::http::response::Reply;
use crate::http::server::AppState;
use crate::routing::RouteListing;

/// Static facts about the running server, captured at start.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub name: String,
    pub url: String,
    pub started: Instant,
    pub middleware: Vec<&'static str>,
    pub acceptable: Vec<String>,
    pub cors_origins: Vec<String>,
    pub preflight_max_age_secs: u64,
    pub audit_enabled: bool,
    pub capture_body: bool,
}

impl ServerInfo {
    pub fn new(config: &ServiceConfig, url: &str) -> Self {
        let mut middleware = vec!["requestId"];
        if config.audit.enabled {
            middleware.push("audit");
        }
        if config.audit.response_time_header {
            middleware.push("responseTime");
        }
        middleware.extend([
            "timeout",
            "cors",
            "acceptParser",
            "queryParser",
            "bodyParser",
            "requestScope",
        ]);

        Self {
            name: config.server.name.clone(),
            url: url.to_string(),
            started: Instant::now(),
            middleware,
            acceptable: config.accept.acceptable.clone(),
            cors_origins: config.cors.origins.clone(),
            preflight_max_age_secs: config.cors.preflight_max_age_secs,
            audit_enabled: config.audit.enabled,
            capture_body: config.audit.capture_body,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CorsInfo {
    pub origins: Vec<String>,
    pub preflight_max_age_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct AuditInfo {
    pub enabled: bool,
    pub capture_body: bool,
}

/// Server introspection payload of `GET /_status`.
#[derive(Debug, Serialize)]
pub struct DebugInfo {
    pub name: String,
    pub version: &'static str,
    pub url: String,
    pub uptime_secs: u64,
    pub route_count: usize,
    pub middleware: Vec<&'static str>,
    pub acceptable: Vec<String>,
    pub cors: CorsInfo,
    pub audit: AuditInfo,
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub status: &'static str,
    pub info: DebugInfo,
}

pub async fn get_status(State(state): State<AppState>) -> Reply<SystemStatus> {
    let info = &state.info;
    Reply(SystemStatus {
        status: "OK",
        info: DebugInfo {
            name: info.name.clone(),
            version: env!("CARGO_PKG_VERSION"),
            url: info.url.clone(),
            uptime_secs: info.started.elapsed().as_secs(),
            route_count: state.registry.len(),
            middleware: info.middleware.clone(),
            acceptable: info.acceptable.clone(),
            cors: CorsInfo {
                origins: info.cors_origins.clone(),
                preflight_max_age_secs: info.preflight_max_age_secs,
            },
            audit: AuditInfo {
                enabled: info.audit_enabled,
                capture_body: info.capture_body,
            },
        },
    })
}

pub async fn get_routes(State(state): State<AppState>) -> Reply<RouteListing> {
    Reply(state.registry.list_by_method())
}
