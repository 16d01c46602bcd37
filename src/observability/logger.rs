//! Leveled logger handle.
//!
//! Components never reach for an ambient global: they receive a
//! [`SharedLogger`] and log structured [`LogRecord`]s through it.
//! [`TracingLogger`] forwards records to `tracing`; [`ChildLogger`] binds
//! extra fields; [`MemoryLogger`] keeps records in memory for inspection.

use std::error::Error;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde_json::{Map, Value};

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        };
        f.write_str(name)
    }
}

/// One structured log entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    pub level: Level,
    pub message: String,
    pub fields: Map<String, Value>,
}

impl LogRecord {
    pub fn new(level: Level, message: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            level,
            message: message.into(),
            fields,
        }
    }

    /// Look up a top-level field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// Minimal leveled-logging capability.
pub trait Logger: Send + Sync {
    /// Emit a record.
    fn log(&self, record: LogRecord);

    /// Logger-specific error serializer. `None` means "use the standard one".
    fn serialize_error(&self, _err: &(dyn Error + 'static)) -> Option<Value> {
        None
    }

    fn info(&self, message: &str, fields: Map<String, Value>) {
        self.log(LogRecord::new(Level::Info, message, fields));
    }

    fn warn(&self, message: &str, fields: Map<String, Value>) {
        self.log(LogRecord::new(Level::Warn, message, fields));
    }

    fn error(&self, message: &str, fields: Map<String, Value>) {
        self.log(LogRecord::new(Level::Error, message, fields));
    }

    fn fatal(&self, message: &str, fields: Map<String, Value>) {
        self.log(LogRecord::new(Level::Fatal, message, fields));
    }
}

/// Shared, thread-safe logger handle.
pub type SharedLogger = Arc<dyn Logger>;

/// Logger that forwards records to the `tracing` subscriber.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    name: String,
}

impl TracingLogger {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn shared(name: impl Into<String>) -> SharedLogger {
        Arc::new(Self::new(name))
    }
}

impl Logger for TracingLogger {
    fn log(&self, record: LogRecord) {
        let fields = Value::Object(record.fields);
        let message = record.message;
        match record.level {
            Level::Trace => tracing::trace!(app = %self.name, fields = %fields, "{message}"),
            Level::Debug => tracing::debug!(app = %self.name, fields = %fields, "{message}"),
            Level::Info => tracing::info!(app = %self.name, fields = %fields, "{message}"),
            Level::Warn => tracing::warn!(app = %self.name, fields = %fields, "{message}"),
            Level::Error => tracing::error!(app = %self.name, fields = %fields, "{message}"),
            Level::Fatal => {
                tracing::error!(app = %self.name, fatal = true, fields = %fields, "{message}")
            }
        }
    }
}

/// Logger that adds bound fields to every record before passing it on.
pub struct ChildLogger {
    parent: SharedLogger,
    bindings: Map<String, Value>,
}

impl ChildLogger {
    pub fn new(parent: SharedLogger, bindings: Map<String, Value>) -> Self {
        Self { parent, bindings }
    }

    pub fn shared(parent: SharedLogger, bindings: Map<String, Value>) -> SharedLogger {
        Arc::new(Self::new(parent, bindings))
    }
}

impl Logger for ChildLogger {
    fn log(&self, mut record: LogRecord) {
        let mut fields = self.bindings.clone();
        fields.append(&mut record.fields);
        record.fields = fields;
        self.parent.log(record);
    }

    fn serialize_error(&self, err: &(dyn Error + 'static)) -> Option<Value> {
        self.parent.serialize_error(err)
    }
}

/// Logger that keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Records at exactly `level`.
    pub fn at(&self, level: Level) -> Vec<LogRecord> {
        self.records()
            .into_iter()
            .filter(|record| record.level == level)
            .collect()
    }

    pub fn count(&self, level: Level) -> usize {
        self.at(level).len()
    }
}

impl Logger for MemoryLogger {
    fn log(&self, record: LogRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }
}

/// Build a field map from `key => value` pairs.
#[macro_export]
macro_rules! fields {
    () => { ::serde_json::Map::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = ::serde_json::Map::new();
        $( map.insert(($key).to_string(), ::serde_json::json!($value)); )+
        map
    }};
}
