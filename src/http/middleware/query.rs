//! Query-string parsing into [`Params`].

use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::http::params::Params;
use crate::http::request::PhaseTimers;

/// Parse the query string and seed the request's [`Params`].
pub async fn parse_query(mut request: Request, next: Next) -> Response {
    let started = Instant::now();
    let mut params = request
        .extensions_mut()
        .remove::<Params>()
        .unwrap_or_default();
    if let Some(query) = request.uri().query() {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params.append_query(&key, &value);
        }
    }
    request.extensions_mut().insert(params);

    if let Some(timers) = request.extensions().get::<PhaseTimers>() {
        timers.record("parseQueryString", started.elapsed());
    }
    next.run(request).await
}
