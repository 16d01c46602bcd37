//! Per-request audit logging.
//!
//! One entry per completed request:
//!
//! ```text
//! { req: {method, url, timers: {phase: ms, ...}},
//!   res: {statusCode, body?},
//!   err: <serialized error or absent>,
//!   latency: <ms> }
//! ```
//!
//! The logger holds only configuration captured at construction, so a single
//! instance is shared by every connection.

use std::error::Error;
use std::time::Instant;

use serde_json::{json, Map, Value};

use crate::http::error::ApiError;
use crate::http::request::RequestRecord;
use crate::http::response::ResponseRecord;
use crate::observability::logger::{ChildLogger, SharedLogger};

/// Construction options for [`AuditLogger`].
#[derive(Clone)]
pub struct AuditOptions {
    pub logger: SharedLogger,
    pub capture_body: bool,
}

impl AuditOptions {
    pub fn new(logger: SharedLogger) -> Self {
        Self {
            logger,
            capture_body: false,
        }
    }

    pub fn capture_body(mut self, capture: bool) -> Self {
        self.capture_body = capture;
        self
    }
}

/// Serializes finished requests into audit entries.
pub struct AuditLogger {
    log: SharedLogger,
    capture_body: bool,
}

impl AuditLogger {
    pub fn new(options: AuditOptions) -> Self {
        Self {
            log: ChildLogger::shared(options.logger, crate::fields!("audit" => true)),
            capture_body: options.capture_body,
        }
    }

    pub fn captures_body(&self) -> bool {
        self.capture_body
    }

    /// `{method, url, timers}`, or `false` when there is no request.
    pub fn serialize_request(&self, req: Option<&RequestRecord>) -> Value {
        let Some(req) = req else {
            return Value::Bool(false);
        };
        let mut timers = Map::new();
        for sample in req.timers.samples() {
            timers.insert(sample.name, json!(sample.elapsed.as_millis()));
        }
        json!({
            "method": req.method.as_str(),
            "url": req.url,
            "timers": timers,
        })
    }

    /// `{statusCode, body?}`, or `false` when there is no response.
    pub fn serialize_response(&self, res: Option<&ResponseRecord>) -> Value {
        let Some(res) = res else {
            return Value::Bool(false);
        };
        let mut out = Map::new();
        out.insert("statusCode".into(), json!(res.status_code));
        if self.capture_body {
            if let Some(body) = &res.body {
                out.insert("body".into(), body.loggable().clone());
            }
        }
        Value::Object(out)
    }

    /// The base logger's serializer if it has one, else [`standard_error`].
    pub fn serialize_error(&self, err: &(dyn Error + 'static)) -> Value {
        self.log
            .serialize_error(err)
            .unwrap_or_else(|| standard_error(err))
    }

    /// Emit the audit entry for one finished request. Always returns `true`.
    pub fn audit(
        &self,
        req: Option<&RequestRecord>,
        res: Option<&ResponseRecord>,
        route: Option<&str>,
        err: Option<&(dyn Error + 'static)>,
    ) -> bool {
        let latency = match res.and_then(|r| r.response_time) {
            Some(millis) => json!(millis),
            None => json!(req.map(|r| elapsed_millis(r.started)).unwrap_or(0)),
        };

        let mut fields = Map::new();
        if let Some(id) = req.and_then(|r| r.id.as_deref()) {
            fields.insert("req_id".into(), json!(id));
        }
        if let Some(route) = route {
            fields.insert("route".into(), json!(route));
        }
        fields.insert("req".into(), self.serialize_request(req));
        fields.insert("res".into(), self.serialize_response(res));
        if let Some(err) = err {
            fields.insert("err".into(), self.serialize_error(err));
        }
        fields.insert("latency".into(), latency);

        let summary = match res {
            Some(res) => format!("handled: {}", res.status_code),
            None => "handled: no response".to_string(),
        };
        self.log.info(&summary, fields);
        true
    }
}

fn elapsed_millis(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Name, message, cause chain and any API error details.
pub fn standard_error(err: &(dyn Error + 'static)) -> Value {
    let mut out = Map::new();
    let name = match err.downcast_ref::<ApiError>() {
        Some(api) => {
            out.insert("code".into(), json!(api.code()));
            out.insert("statusCode".into(), json!(api.status().as_u16()));
            api.name()
        }
        None => "Error",
    };
    out.insert("name".into(), json!(name));
    out.insert("message".into(), json!(err.to_string()));

    let mut stack = vec![format!("{name}: {err}")];
    let mut source = err.source();
    while let Some(cause) = source {
        stack.push(format!("caused by: {cause}"));
        source = cause.source();
    }
    out.insert("stack".into(), json!(stack.join("\n")));
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::http::{Method, StatusCode};

    use crate::http::request::HrTime;
    use crate::http::response::BodyKind;
    use crate::observability::logger::{Level, LogRecord, Logger, MemoryLogger};

    fn audit_logger(capture_body: bool) -> (Arc<MemoryLogger>, AuditLogger) {
        let sink = Arc::new(MemoryLogger::new());
        let audit = AuditLogger::new(AuditOptions::new(sink.clone()).capture_body(capture_body));
        (sink, audit)
    }

    #[test]
    fn timers_convert_each_sample_to_floored_millis() {
        let (_, audit) = audit_logger(false);
        let req = RequestRecord::new(Method::GET, "/a");
        let samples = [
            ("parseAccept", 0, 250_000),
            ("parseQueryString", 0, 1_999_999),
            ("parseBody", 1, 500_000_000),
            ("handler", 12, 3),
        ];
        for (name, secs, nanos) in samples {
            req.timers.push(name, HrTime::new(secs, nanos));
        }

        let timers = &audit.serialize_request(Some(&req))["timers"];
        let timers = timers.as_object().unwrap();
        assert_eq!(timers.len(), samples.len());
        for (name, secs, nanos) in samples {
            let expected = (secs as f64 * 1000.0 + nanos as f64 / 1e6).floor() as u64;
            assert_eq!(timers[name], json!(expected), "phase {name}");
        }
    }

    #[test]
    fn request_without_samples_has_empty_timers() {
        let (_, audit) = audit_logger(false);
        let req = RequestRecord::new(Method::POST, "/b?x=1");
        assert_eq!(
            audit.serialize_request(Some(&req)),
            json!({"method": "POST", "url": "/b?x=1", "timers": {}})
        );
    }

    #[test]
    fn absent_request_and_response_serialize_to_false() {
        let (_, audit) = audit_logger(true);
        assert_eq!(audit.serialize_request(None), json!(false));
        assert_eq!(audit.serialize_response(None), json!(false));
    }

    #[test]
    fn body_omitted_when_capture_disabled() {
        let (_, audit) = audit_logger(false);
        let plain = ResponseRecord::new(StatusCode::OK).with_body(BodyKind::Plain(json!([1, 2])));
        let wrapped = ResponseRecord::new(StatusCode::BAD_REQUEST).with_body(BodyKind::ErrorWrapper {
            name: "BadRequestError".into(),
            inner: json!({"code": "X"}),
        });

        for res in [plain, wrapped] {
            let out = audit.serialize_response(Some(&res));
            assert!(out.get("body").is_none());
            assert_eq!(out["statusCode"], json!(res.status_code));
        }
    }

    #[test]
    fn error_wrapper_body_logs_embedded_payload() {
        let (_, audit) = audit_logger(true);
        let res = ResponseRecord::new(StatusCode::BAD_REQUEST).with_body(BodyKind::ErrorWrapper {
            name: "BadRequestError".into(),
            inner: json!({"code": "X"}),
        });
        assert_eq!(
            audit.serialize_response(Some(&res)),
            json!({"statusCode": 400, "body": {"code": "X"}})
        );
    }

    #[test]
    fn response_time_value_used_verbatim() {
        let (sink, audit) = audit_logger(false);
        let req = RequestRecord::new(Method::GET, "/slow")
            .with_started(Instant::now() - Duration::from_secs(5));
        let res = ResponseRecord::new(StatusCode::OK).with_response_time(42.5);

        assert!(audit.audit(Some(&req), Some(&res), None, None));
        assert_eq!(sink.records()[0].field("latency"), Some(&json!(42.5)));
    }

    #[test]
    fn latency_falls_back_to_elapsed_time() {
        let (sink, audit) = audit_logger(false);
        let req = RequestRecord::new(Method::GET, "/")
            .with_started(Instant::now() - Duration::from_millis(150));
        let res = ResponseRecord::new(StatusCode::OK);

        audit.audit(Some(&req), Some(&res), None, None);
        let latency = sink.records()[0].field("latency").and_then(Value::as_u64).unwrap();
        assert!((150..1150).contains(&latency), "latency {latency}");
    }

    #[test]
    fn entry_is_tagged_and_summarizes_status() {
        let (sink, audit) = audit_logger(true);
        let mut req = RequestRecord::new(Method::DELETE, "/items/7");
        req.id = Some("req-1".into());
        let res = ResponseRecord::new(StatusCode::NOT_FOUND);
        let err = ApiError::NotFound("/items/7".into());

        let err: &(dyn Error + 'static) = &err;
        audit.audit(Some(&req), Some(&res), Some("/items/{id}"), Some(err));

        let records = sink.records();
        assert_eq!(records.len(), 1);
        let entry = &records[0];
        assert_eq!(entry.level, Level::Info);
        assert_eq!(entry.message, "handled: 404");
        assert_eq!(entry.field("audit"), Some(&json!(true)));
        assert_eq!(entry.field("req_id"), Some(&json!("req-1")));
        assert_eq!(entry.field("route"), Some(&json!("/items/{id}")));
        assert_eq!(entry.fields["res"], json!({"statusCode": 404}));
        assert_eq!(entry.fields["err"]["name"], "ResourceNotFoundError");
        assert_eq!(entry.fields["err"]["statusCode"], 404);
    }

    #[test]
    fn err_field_absent_without_error() {
        let (sink, audit) = audit_logger(false);
        audit.audit(None, None, None, None);
        let entry = &sink.records()[0];
        assert!(entry.field("err").is_none());
        assert_eq!(entry.fields["req"], json!(false));
        assert_eq!(entry.fields["latency"], json!(0));
    }

    struct RedactingLogger(MemoryLogger);

    impl Logger for RedactingLogger {
        fn log(&self, record: LogRecord) {
            self.0.log(record);
        }

        fn serialize_error(&self, _err: &(dyn Error + 'static)) -> Option<Value> {
            Some(json!({"redacted": true}))
        }
    }

    #[test]
    fn base_logger_error_serializer_takes_precedence() {
        let base = Arc::new(RedactingLogger(MemoryLogger::new()));
        let audit = AuditLogger::new(AuditOptions::new(base.clone()));
        let err = ApiError::Internal("secret".into());

        audit.audit(None, None, None, Some(&err as &(dyn Error + 'static)));
        assert_eq!(base.0.records()[0].fields["err"], json!({"redacted": true}));
    }

    #[test]
    fn standard_error_walks_the_cause_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err = crate::config::ConfigError::Io(io);
        let out = standard_error(&err);
        assert_eq!(out["name"], "Error");
        assert_eq!(out["message"], "IO error: disk gone");
        let stack = out["stack"].as_str().unwrap();
        assert!(stack.contains("caused by: disk gone"), "{stack}");
    }
}
