//! Request middleware, listed outermost first.
//!
//! ```text
//! audit.rs          post-response audit hook (+ phase timers)
//! response_time.rs  Response-Time header (optional)
//! cors.rs           preflight short-circuit, actual-request headers
//! accept.rs         Accept negotiation
//! query.rs          query string → Params
//! body.rs           body → Params
//! request_scope.rs  panic boundary around the handler
//! ```

pub mod accept;
pub mod audit;
pub mod body;
pub mod cors;
pub mod query;
pub mod request_scope;
pub mod response_time;

pub use accept::{negotiate_accept, Acceptable};
pub use audit::audit_requests;
pub use body::{parse_body, BodyLimit};
pub use cors::cors_layer;
pub use query::parse_query;
pub use request_scope::{in_request_scope, request_scope, RouteContext};
pub use response_time::stamp_response_time;
