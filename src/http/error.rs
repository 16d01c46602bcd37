//! Client-facing request errors.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;

use crate::http::response::{BodyKind, ErrorReport};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("invalid content: {0}")]
    InvalidContent(String),

    #[error("{0} does not exist")]
    NotFound(String),

    #[error("server accepts: {acceptable}")]
    NotAcceptable { acceptable: String },

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("content-type `{0}` is not supported")]
    UnsupportedMediaType(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::InvalidContent(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::NotAcceptable { .. } => StatusCode::NOT_ACCEPTABLE,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code sent to clients.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BadRequest",
            ApiError::InvalidContent(_) => "InvalidContent",
            ApiError::NotFound(_) => "ResourceNotFound",
            ApiError::NotAcceptable { .. } => "NotAcceptable",
            ApiError::PayloadTooLarge { .. } => "PayloadTooLarge",
            ApiError::UnsupportedMediaType(_) => "UnsupportedMediaType",
            ApiError::Internal(_) => "Internal",
        }
    }

    /// Error class name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BadRequestError",
            ApiError::InvalidContent(_) => "InvalidContentError",
            ApiError::NotFound(_) => "ResourceNotFoundError",
            ApiError::NotAcceptable { .. } => "NotAcceptableError",
            ApiError::PayloadTooLarge { .. } => "PayloadTooLargeError",
            ApiError::UnsupportedMediaType(_) => "UnsupportedMediaTypeError",
            ApiError::Internal(_) => "InternalError",
        }
    }

    /// Payload sent to the client.
    pub fn body(&self) -> Value {
        json!({
            "code": self.code(),
            "message": self.to_string(),
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = self.body();
        let mut response = (self.status(), Json(&body)).into_response();
        response.extensions_mut().insert(BodyKind::ErrorWrapper {
            name: self.name().to_string(),
            inner: body,
        });
        response
            .extensions_mut()
            .insert(ErrorReport(Arc::new(self)));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response::ResponseRecord;

    #[test]
    fn maps_status_and_code() {
        let err = ApiError::NotAcceptable {
            acceptable: "application/json".into(),
        };
        assert_eq!(err.status(), StatusCode::NOT_ACCEPTABLE);
        assert_eq!(
            err.body(),
            json!({"code": "NotAcceptable", "message": "server accepts: application/json"})
        );
    }

    #[test]
    fn response_carries_wrapper_and_report() {
        let response = ApiError::PayloadTooLarge { limit: 10 }.into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let report = response.extensions().get::<ErrorReport>().unwrap();
        assert_eq!(report.error().to_string(), "request body exceeds 10 bytes");

        let record = ResponseRecord::from_response(&response);
        match record.body {
            Some(BodyKind::ErrorWrapper { name, inner }) => {
                assert_eq!(name, "PayloadTooLargeError");
                assert_eq!(inner["code"], "PayloadTooLarge");
            }
            other => panic!("unexpected body: {other:?}"),
        }
    }
}
