//! Response records and body tagging.
//!
//! # Responsibilities
//! - Tag each JSON response with a [`BodyKind`] so the audit hook can log it
//!   without inspecting runtime types
//! - Capture status, body and `Response-Time` for the audit record
//!
//! # Design Decisions
//! - Whoever builds the response decides the body kind ([`Reply`] for plain
//!   payloads, [`ApiError`](crate::http::error::ApiError) for error wrappers)
//! - Untagged responses are still audited, just without a body

use std::error::Error;
use std::sync::Arc;

use axum::http::{HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::http::error::ApiError;

/// Response header carrying handling time in milliseconds.
pub const RESPONSE_TIME: HeaderName = HeaderName::from_static("response-time");

/// What kind of payload a response carries.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyKind {
    /// An ordinary payload.
    Plain(Value),
    /// An error wrapper; only `inner` is meant for logs and clients.
    ErrorWrapper { name: String, inner: Value },
}

impl BodyKind {
    /// The value that belongs in an audit entry.
    pub fn loggable(&self) -> &Value {
        match self {
            BodyKind::Plain(value) => value,
            BodyKind::ErrorWrapper { inner, .. } => inner,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, BodyKind::ErrorWrapper { .. })
    }
}

/// The error that produced a response, attached as a response extension.
#[derive(Debug, Clone)]
pub struct ErrorReport(pub Arc<dyn Error + Send + Sync>);

impl ErrorReport {
    pub fn error(&self) -> &(dyn Error + 'static) {
        &*self.0
    }
}

/// What the audit hook knows about a finished response.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseRecord {
    pub status_code: u16,
    pub body: Option<BodyKind>,
    /// Parsed `Response-Time` value, in milliseconds.
    pub response_time: Option<f64>,
}

impl ResponseRecord {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status_code: status.as_u16(),
            body: None,
            response_time: None,
        }
    }

    pub fn with_body(mut self, body: BodyKind) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_response_time(mut self, millis: f64) -> Self {
        self.response_time = Some(millis);
        self
    }

    pub fn from_response(response: &Response) -> Self {
        let response_time = response
            .headers()
            .get(RESPONSE_TIME)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite());
        Self {
            status_code: response.status().as_u16(),
            body: response.extensions().get::<BodyKind>().cloned(),
            response_time,
        }
    }
}

/// JSON responder that tags its payload as [`BodyKind::Plain`].
#[derive(Debug, Clone)]
pub struct Reply<T>(pub T);

impl<T: Serialize> IntoResponse for Reply<T> {
    fn into_response(self) -> Response {
        match serde_json::to_value(&self.0) {
            Ok(value) => {
                let mut response = Json(&value).into_response();
                response.extensions_mut().insert(BodyKind::Plain(value));
                response
            }
            Err(e) => ApiError::Internal(format!("response serialization failed: {e}"))
                .into_response(),
        }
    }
}
