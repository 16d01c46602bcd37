//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware order, admin routes)
//!     → request.rs (request ID, phase timers, audit request record)
//!     → middleware/ (CORS, accept, query, body, request scope)
//!     → params.rs (merged query + body values for handlers)
//!     → handler
//!     → response.rs / error.rs (JSON bodies tagged for the audit log)
//! ```

pub mod error;
pub mod middleware;
pub mod params;
pub mod request;
pub mod response;
pub mod server;

pub use error::ApiError;
pub use params::Params;
pub use request::{HrTime, PhaseTimers, RequestRecord, X_REQUEST_ID};
pub use response::{BodyKind, ErrorReport, Reply, ResponseRecord, RESPONSE_TIME};
pub use server::{AppState, ServerBuilder, ServerHandle};
