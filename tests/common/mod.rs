//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use service_bootstrap::observability::logger::{LogRecord, MemoryLogger, SharedLogger};
use service_bootstrap::ServerBuilder;

/// In-memory logger plus the handle to pass to the server.
pub fn memory_logger() -> (Arc<MemoryLogger>, SharedLogger) {
    let sink = Arc::new(MemoryLogger::new());
    let shared: SharedLogger = sink.clone();
    (sink, shared)
}

/// Builder bound to loopback on `port`.
pub fn builder(name: &str, port: u16, logger: SharedLogger) -> ServerBuilder {
    ServerBuilder::new(name, port, Some(logger))
        .unwrap()
        .configure(|c| c.server.host = "127.0.0.1".into())
}

/// Client that never goes through a proxy and never reuses connections.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

/// Audit entries among the captured records.
pub fn audit_entries(sink: &MemoryLogger) -> Vec<LogRecord> {
    sink.records()
        .into_iter()
        .filter(|r| r.field("audit") == Some(&serde_json::Value::Bool(true)))
        .collect()
}

/// Poll until `count` audit entries exist. Entries are emitted once the
/// response body has been fully sent, which can trail the client's read.
pub async fn wait_for_audits(sink: &MemoryLogger, count: usize) -> Vec<LogRecord> {
    for _ in 0..50 {
        let entries = audit_entries(sink);
        if entries.len() >= count {
            return entries;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    audit_entries(sink)
}
