//! Bootstrap for JSON-over-HTTP services.
//!
//! [`ServerBuilder`] (or [`start_server`]) wires CORS, content negotiation,
//! query/body parsing, request-scoped panic handling and per-request audit
//! logging around the application's routes, and mounts `GET /_status` and
//! `GET /api/admin/_routes`.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::ServiceConfig;
pub use http::{ApiError, Params, Reply, ServerBuilder, ServerHandle};
pub use lifecycle::{start_server, Shutdown, StartupError, Supervisor};
pub use observability::{AuditLogger, AuditOptions, Logger, SharedLogger, TracingLogger};
