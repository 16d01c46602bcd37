//! Request body reading and parsing into [`Params`].
//!
//! The body is buffered once, parsed by content type, and handed on intact
//! so handlers can still use their own extractors.

use std::time::Instant;

use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::middleware::Next;
use axum::response::Response;
use serde_json::{Map, Value};

use crate::http::error::ApiError;
use crate::http::params::Params;
use crate::http::request::PhaseTimers;

/// Body parser settings.
#[derive(Debug, Clone, Copy)]
pub struct BodyLimit(pub usize);

/// Read the body (bounded), parse it, and merge its fields into [`Params`].
pub async fn parse_body(
    State(BodyLimit(limit)): State<BodyLimit>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let declared = request
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > limit) {
        return Err(ApiError::PayloadTooLarge { limit });
    }

    let (mut parts, body) = request.into_parts();
    let timers = parts.extensions.get::<PhaseTimers>().cloned();

    let started = Instant::now();
    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(|_| ApiError::PayloadTooLarge { limit })?;
    if let Some(timers) = &timers {
        timers.record("readBody", started.elapsed());
    }

    if !bytes.is_empty() {
        let started = Instant::now();
        let content_type = parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        let parsed = parse_content(content_type, &bytes)?;

        let mut params = parts.extensions.remove::<Params>().unwrap_or_default();
        if let Value::Object(fields) = &parsed {
            params.merge_body_fields(fields);
        }
        params.set_body(parsed);
        parts.extensions.insert(params);

        if let Some(timers) = &timers {
            timers.record("parseBody", started.elapsed());
        }
    }

    let request = Request::from_parts(parts, Body::from(bytes));
    Ok(next.run(request).await)
}

/// Parse a non-empty body according to its content type.
pub fn parse_content(content_type: &str, bytes: &Bytes) -> Result<Value, ApiError> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "application/json" => parse_json(bytes),
        s if s.starts_with("application/") && s.ends_with("+json") => parse_json(bytes),
        "application/x-www-form-urlencoded" => {
            let mut fields = Map::new();
            for (key, value) in url::form_urlencoded::parse(bytes) {
                fields
                    .entry(key.into_owned())
                    .or_insert(Value::String(value.into_owned()));
            }
            Ok(Value::Object(fields))
        }
        "text/plain" => std::str::from_utf8(bytes)
            .map(|text| Value::String(text.to_string()))
            .map_err(|e| ApiError::InvalidContent(e.to_string())),
        "" => Err(ApiError::UnsupportedMediaType("(none)".to_string())),
        other => Err(ApiError::UnsupportedMediaType(other.to_string())),
    }
}

fn parse_json(bytes: &Bytes) -> Result<Value, ApiError> {
    serde_json::from_slice(bytes).map_err(|e| ApiError::InvalidContent(e.to_string()))
}
