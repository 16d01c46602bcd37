//! Accept-header negotiation.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::header::ACCEPT;
use axum::middleware::Next;
use axum::response::Response;

use crate::http::error::ApiError;
use crate::http::request::PhaseTimers;

/// Media types the server can respond with.
#[derive(Debug, Clone)]
pub struct Acceptable(pub Arc<[String]>);

impl Acceptable {
    pub fn new(types: &[String]) -> Self {
        Self(types.into())
    }
}

/// Reject requests whose `Accept` header matches none of the acceptable types.
pub async fn negotiate_accept(
    State(acceptable): State<Acceptable>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let started = Instant::now();
    let header = request
        .headers()
        .get(ACCEPT)
        .map(|v| v.to_str().unwrap_or_default().to_string());

    if let Some(timers) = request.extensions().get::<PhaseTimers>() {
        timers.record("parseAccept", started.elapsed());
    }

    if let Some(header) = header {
        if !accepts(&header, &acceptable.0) {
            return Err(ApiError::NotAcceptable {
                acceptable: acceptable.0.join(", "),
            });
        }
    }
    Ok(next.run(request).await)
}

/// Whether an `Accept` header admits at least one of `available`.
///
/// Honors `*/*`, `type/*` and `q=0` exclusions. An empty header accepts
/// anything.
pub fn accepts(header: &str, available: &[String]) -> bool {
    if header.trim().is_empty() {
        return true;
    }
    header.split(',').any(|range| {
        let mut parts = range.split(';');
        let media = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
        let excluded = parts.any(|param| {
            let param = param.trim();
            param
                .strip_prefix("q=")
                .and_then(|q| q.trim().parse::<f32>().ok())
                .is_some_and(|q| q <= 0.0)
        });
        !excluded && available.iter().any(|candidate| media_matches(&media, candidate))
    })
}

fn media_matches(range: &str, candidate: &str) -> bool {
    let candidate = candidate.to_ascii_lowercase();
    if range == "*/*" || range == "*" || range == candidate {
        return true;
    }
    match (range.split_once('/'), candidate.split_once('/')) {
        (Some((kind, "*")), Some((candidate_kind, _))) => kind == candidate_kind,
        _ => false,
    }
}
