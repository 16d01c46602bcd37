//! Request-scoped failure handling.
//!
//! Every handler runs inside a request scope. A panic inside the scope is
//! caught here, logged once at error severity with the route context, and
//! turned into a 500 response; the connection and the server carry on.
//! The scope is a task-local, so the process-level panic hook can tell a
//! request panic (handled here) from a process panic (fatal).

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use futures_util::FutureExt;

use crate::http::error::ApiError;
use crate::http::request::PhaseTimers;
use crate::observability::audit::standard_error;
use crate::observability::logger::SharedLogger;

/// Route context of the request currently being handled.
#[derive(Debug, Clone)]
pub struct RouteContext {
    pub method: String,
    pub route: String,
}

tokio::task_local! {
    static REQUEST_SCOPE: RouteContext;
}

/// Whether the caller is running inside a request scope.
pub fn in_request_scope() -> bool {
    REQUEST_SCOPE.try_with(|_| ()).is_ok()
}

/// Route context of the current request, if any.
pub fn current_route() -> Option<RouteContext> {
    REQUEST_SCOPE.try_with(RouteContext::clone).ok()
}

/// Run the rest of the chain inside a request scope, catching panics.
pub async fn request_scope(
    State(logger): State<SharedLogger>,
    request: Request,
    next: Next,
) -> Response {
    let context = RouteContext {
        method: request.method().to_string(),
        route: request
            .extensions()
            .get::<MatchedPath>()
            .map(|p| p.as_str().to_string())
            .unwrap_or_else(|| request.uri().path().to_string()),
    };
    let timers = request.extensions().get::<PhaseTimers>().cloned();

    let started = Instant::now();
    let outcome = REQUEST_SCOPE
        .scope(context.clone(), AssertUnwindSafe(next.run(request)).catch_unwind())
        .await;
    if let Some(timers) = timers {
        timers.record("handler", started.elapsed());
    }

    match outcome {
        Ok(response) => response,
        Err(payload) => {
            let err = ApiError::Internal(panic_message(payload.as_ref()));
            logger.error(
                "uncaught exception",
                crate::fields!(
                    "method" => context.method,
                    "route" => context.route,
                    "err" => standard_error(&err),
                ),
            );
            err.into_response()
        }
    }
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
