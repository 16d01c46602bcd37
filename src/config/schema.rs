//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for a bootstrapped service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Application identity and listen address.
    pub server: ServerConfig,

    /// Cross-origin policy.
    pub cors: CorsConfig,

    /// Content types the service can produce.
    pub accept: AcceptConfig,

    /// Per-request audit logging.
    pub audit: AuditConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Server identity and listen address.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Application name, used in startup lines and debug info.
    pub name: String,

    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// Listen port. Zero is treated as missing.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Cross-origin resource sharing policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// How long browsers may cache a preflight answer, in seconds.
    pub preflight_max_age_secs: u64,

    /// Allowed origins: `"*"`, exact origins, or patterns with one `*`.
    pub origins: Vec<String>,

    /// Request headers allowed in addition to the built-in defaults.
    pub allow_headers: Vec<String>,

    /// Response headers exposed in addition to the built-in defaults.
    pub expose_headers: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            preflight_max_age_secs: 5,
            origins: vec!["*".to_string()],
            allow_headers: vec!["API-Token".to_string()],
            expose_headers: vec!["API-Token-Expiry".to_string()],
        }
    }
}

/// Accept-header negotiation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AcceptConfig {
    /// Media types the service is willing to respond with.
    pub acceptable: Vec<String>,
}

impl Default for AcceptConfig {
    fn default() -> Self {
        Self {
            acceptable: vec![
                "application/json".to_string(),
                "text/plain".to_string(),
                "application/octet-stream".to_string(),
                "application/javascript".to_string(),
            ],
        }
    }
}

/// Audit logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Emit one audit entry per completed request.
    pub enabled: bool,

    /// Include the response body in audit entries.
    pub capture_body: bool,

    /// Stamp a `Response-Time` header (milliseconds) on every response.
    pub response_time_header: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capture_body: false,
            response_time_header: false,
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
