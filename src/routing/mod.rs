//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! ServerBuilder::route(method, path, handler)
//!     → registry.rs (RouteTable records the pattern)
//!     → axum::Router (dispatch)
//!
//! GET /api/admin/_routes
//!     → RouteRegistry::list_by_method()
//! ```

pub mod registry;

pub use registry::{RouteError, RouteListing, RouteRegistry, RouteTable};
