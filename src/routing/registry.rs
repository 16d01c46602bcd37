//! Route table introspection.
//!
//! # Responsibilities
//! - Record every (method, path pattern) pair registered on the server
//! - Answer "which patterns exist for this method" in registration order
//!
//! # Design Decisions
//! - Admin endpoints depend on [`RouteRegistry`], never on axum internals
//! - Duplicate registrations are rejected instead of silently merged
//! - Frozen into an `Arc` once the server starts

use std::collections::HashMap;

use axum::http::Method;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("route {method} {path} is already registered")]
    Duplicate { method: Method, path: String },

    #[error("route path `{0}` must start with `/`")]
    InvalidPath(String),

    #[error("method {0} cannot be routed")]
    UnsupportedMethod(Method),

    #[error("route path `{path}` differs from `{existing}` only by capture names")]
    ConflictingCaptures { path: String, existing: String },
}

/// Read access to the live route table.
pub trait RouteRegistry: Send + Sync {
    /// Patterns registered for `method`, in registration order.
    fn patterns(&self, method: &Method) -> Vec<String>;

    /// Patterns for `GET`, `PUT`, `DELETE` and `POST`.
    fn list_by_method(&self) -> RouteListing {
        RouteListing {
            get: self.patterns(&Method::GET),
            put: self.patterns(&Method::PUT),
            delete: self.patterns(&Method::DELETE),
            post: self.patterns(&Method::POST),
        }
    }

    /// Total number of registered (method, pattern) pairs.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Body of `GET /api/admin/_routes`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RouteListing {
    #[serde(rename = "GET")]
    pub get: Vec<String>,
    #[serde(rename = "PUT")]
    pub put: Vec<String>,
    #[serde(rename = "DELETE")]
    pub delete: Vec<String>,
    #[serde(rename = "POST")]
    pub post: Vec<String>,
}

/// In-memory route table filled as routes are registered.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    by_method: HashMap<Method, Vec<String>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a route. Fails if the exact pair is already present, or if the
    /// path is not a pattern the router accepts.
    pub fn register(&mut self, method: Method, path: &str) -> Result<(), RouteError> {
        check_path(path)?;
        let shape = capture_shape(path);
        if let Some(existing) = self
            .by_method
            .values()
            .flatten()
            .find(|p| p.as_str() != path && capture_shape(p) == shape)
        {
            return Err(RouteError::ConflictingCaptures {
                path: path.to_string(),
                existing: existing.clone(),
            });
        }

        let patterns = self.by_method.entry(method.clone()).or_default();
        if patterns.iter().any(|p| p == path) {
            return Err(RouteError::Duplicate {
                method,
                path: path.to_string(),
            });
        }
        patterns.push(path.to_string());
        Ok(())
    }

    pub fn contains(&self, method: &Method, path: &str) -> bool {
        self.by_method
            .get(method)
            .is_some_and(|patterns| patterns.iter().any(|p| p == path))
    }
}

/// Paths must be absolute and use `{name}` / `{*name}` captures; the
/// `:name` and `*name` segment forms are rejected.
fn check_path(path: &str) -> Result<(), RouteError> {
    let legacy = path
        .split('/')
        .any(|segment| segment.starts_with(':') || segment.starts_with('*'));
    if !path.starts_with('/') || legacy {
        return Err(RouteError::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// The path with capture names erased.
fn capture_shape(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.starts_with("{*") && segment.ends_with('}') {
                "{*}"
            } else if segment.starts_with('{') && segment.ends_with('}') {
                "{}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

impl RouteRegistry for RouteTable {
    fn patterns(&self, method: &Method) -> Vec<String> {
        self.by_method.get(method).cloned().unwrap_or_default()
    }

    fn len(&self) -> usize {
        self.by_method.values().map(Vec::len).sum()
    }
}
