//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Server components hold a SharedLogger:
//!     → logger.rs (leveled, structured records)
//!     → audit.rs (one entry per completed request)
//!     → metrics.rs (counters, histograms)
//!
//! Sinks:
//!     → logging.rs (tracing subscriber: stdout, text or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Logger handles are passed explicitly, never looked up globally
//! - Request ID flows into every audit entry
//! - Metrics are cheap (atomic increments)

pub mod audit;
pub mod logger;
pub mod logging;
pub mod metrics;

pub use audit::{AuditLogger, AuditOptions};
pub use logger::{
    ChildLogger, Level, LogRecord, Logger, MemoryLogger, SharedLogger, TracingLogger,
};
