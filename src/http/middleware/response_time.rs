//! `Response-Time` stamping.

use std::time::Instant;

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;

use crate::http::response::RESPONSE_TIME;

/// Stamp the handling time, in milliseconds with microsecond precision.
pub async fn stamp_response_time(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let mut response = next.run(request).await;
    let millis = started.elapsed().as_secs_f64() * 1000.0;
    if let Ok(value) = HeaderValue::from_str(&format!("{millis:.3}")) {
        response.headers_mut().insert(RESPONSE_TIME, value);
    }
    response
}
