//! Post-response audit hook.
//!
//! Seeds the request with [`PhaseTimers`], lets the rest of the chain run,
//! then wraps the response body. The [`AuditLogger`] sees the finished
//! request/response pair exactly once, when the last body frame has been
//! handed to the connection. A body that errors or is dropped before its end
//! is not a completed request and is not audited.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::{Body, Bytes};
use axum::extract::{MatchedPath, Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::Response;
use http_body::{Body as HttpBody, Frame, SizeHint};

use crate::http::request::{PhaseTimers, RequestRecord};
use crate::http::response::{ErrorReport, ResponseRecord};
use crate::observability::audit::AuditLogger;
use crate::observability::metrics;

pub async fn audit_requests(
    State(audit): State<Arc<AuditLogger>>,
    mut request: Request,
    next: Next,
) -> Response {
    let timers = PhaseTimers::new();
    request.extensions_mut().insert(timers.clone());
    let record = RequestRecord::from_request(&request, timers);
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string());

    let response = next.run(request).await;

    let pending = PendingAudit {
        response: ResponseRecord::from_response(&response),
        err: response.extensions().get::<ErrorReport>().cloned(),
        head_only: record.method == Method::HEAD,
        audit,
        request: record,
        route,
    };
    let (parts, body) = response.into_parts();
    Response::from_parts(parts, Body::new(AuditBody::new(body, pending)))
}

/// Everything the audit entry needs, held until the body completes.
struct PendingAudit {
    audit: Arc<AuditLogger>,
    request: RequestRecord,
    response: ResponseRecord,
    route: Option<String>,
    err: Option<ErrorReport>,
    head_only: bool,
}

impl PendingAudit {
    fn emit(self) {
        self.audit.audit(
            Some(&self.request),
            Some(&self.response),
            self.route.as_deref(),
            self.err.as_ref().map(ErrorReport::error),
        );
        metrics::record_request(
            self.request.method.as_str(),
            self.route.as_deref().unwrap_or("unmatched"),
            self.response.status_code,
            self.request.started.elapsed(),
        );
    }

    fn abandon(self, reason: &str) {
        tracing::debug!(
            method = %self.request.method,
            url = %self.request.url,
            status = self.response.status_code,
            reason,
            "response not fully sent; request not audited"
        );
    }
}

/// Response body that emits the audit entry once it has been fully sent.
pub struct AuditBody {
    inner: Body,
    pending: Option<PendingAudit>,
}

impl AuditBody {
    fn new(inner: Body, pending: PendingAudit) -> Self {
        Self {
            inner,
            pending: Some(pending),
        }
    }

    fn finish(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.emit();
        }
    }
}

impl HttpBody for AuditBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let polled = Pin::new(&mut self.inner).poll_frame(cx);
        match &polled {
            Poll::Ready(None) => self.finish(),
            // The connection stops polling once the body reports its end.
            Poll::Ready(Some(Ok(_))) if self.inner.is_end_stream() => self.finish(),
            Poll::Ready(Some(Err(_))) => {
                if let Some(pending) = self.pending.take() {
                    pending.abandon("body error");
                }
            }
            _ => {}
        }
        polled
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }
}

impl Drop for AuditBody {
    fn drop(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        // Empty bodies are never polled; HEAD bodies are discarded unsent.
        if self.inner.is_end_stream() || pending.head_only {
            pending.emit();
        } else {
            pending.abandon("body dropped before completion");
        }
    }
}
