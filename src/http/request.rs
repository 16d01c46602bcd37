//! Request bookkeeping.
//!
//! # Responsibilities
//! - Generate unique request IDs (UUID v4)
//! - Capture the per-request record the audit hook serializes
//! - Collect named phase timings as the request moves through middleware

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::http::{HeaderValue, Method, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the request ID in both directions.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates a UUID v4 request ID for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// High-resolution duration split into whole seconds and nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HrTime {
    pub secs: u64,
    pub nanos: u32,
}

impl HrTime {
    pub fn new(secs: u64, nanos: u32) -> Self {
        Self { secs, nanos }
    }

    /// Whole milliseconds, rounded down.
    pub fn as_millis(&self) -> u64 {
        self.secs * 1000 + u64::from(self.nanos) / 1_000_000
    }
}

impl From<Duration> for HrTime {
    fn from(duration: Duration) -> Self {
        Self {
            secs: duration.as_secs(),
            nanos: duration.subsec_nanos(),
        }
    }
}

/// A named phase duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseSample {
    pub name: String,
    pub elapsed: HrTime,
}

/// Ordered phase samples for one request.
///
/// Cloned handles share the same samples, so a middleware deep in the chain
/// can record into the set the audit hook reads.
#[derive(Debug, Clone, Default)]
pub struct PhaseTimers {
    samples: Arc<Mutex<Vec<PhaseSample>>>,
}

impl PhaseTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, name: impl Into<String>, elapsed: HrTime) {
        self.samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(PhaseSample {
                name: name.into(),
                elapsed,
            });
    }

    pub fn record(&self, name: impl Into<String>, elapsed: Duration) {
        self.push(name, HrTime::from(elapsed));
    }

    /// Samples in recording order.
    pub fn samples(&self) -> Vec<PhaseSample> {
        self.samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// What the audit hook knows about an inbound request.
#[derive(Debug, Clone)]
pub struct RequestRecord {
    pub id: Option<String>,
    pub method: Method,
    pub url: String,
    pub started: Instant,
    pub timers: PhaseTimers,
}

impl RequestRecord {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            id: None,
            method,
            url: url.into(),
            started: Instant::now(),
            timers: PhaseTimers::new(),
        }
    }

    /// Capture method, URL and request ID from a live request.
    pub fn from_request<B>(request: &Request<B>, timers: PhaseTimers) -> Self {
        let id = request
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        Self {
            id,
            method: request.method().clone(),
            url: request.uri().to_string(),
            started: Instant::now(),
            timers,
        }
    }

    pub fn with_started(mut self, started: Instant) -> Self {
        self.started = started;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn hrtime_floors_to_whole_millis() {
        assert_eq!(HrTime::new(0, 999_999).as_millis(), 0);
        assert_eq!(HrTime::new(1, 1_000_000).as_millis(), 1001);
        assert_eq!(HrTime::new(2, 345_678_901).as_millis(), 2345);
    }

    #[test]
    fn cloned_timers_share_samples() {
        let timers = PhaseTimers::new();
        let handle = timers.clone();
        handle.record("parseBody", Duration::from_millis(3));
        timers.push("handler", HrTime::new(0, 500));

        let names: Vec<_> = timers.samples().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["parseBody", "handler"]);
    }

    #[test]
    fn record_picks_up_request_id_header() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/orders?limit=5")
            .header(X_REQUEST_ID, "abc-123")
            .body(Body::empty())
            .unwrap();

        let record = RequestRecord::from_request(&request, PhaseTimers::new());
        assert_eq!(record.id.as_deref(), Some("abc-123"));
        assert_eq!(record.method, Method::POST);
        assert_eq!(record.url, "/orders?limit=5");
    }

    #[test]
    fn generated_ids_are_uuids() {
        let request = Request::builder().body(()).unwrap();
        let id = UuidRequestId.make_request_id(&request).unwrap();
        let text = id.header_value().to_str().unwrap();
        assert!(Uuid::parse_str(text).is_ok());
    }
}
