//! Log record model consumed by the exporter.
//!
//! Records are built by the host pipeline and are read-only for the
//! duration of an export.

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Severity of a log record.
///
/// Mirrors the six levels of a typical logging facade plus `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Severity {
    Trace,
    Debug,
    Information,
    Warning,
    Error,
    Critical,
    #[default]
    None,
}

impl Severity {
    /// Maps a raw facade level (0 = Trace .. 5 = Critical) to a severity.
    /// Anything else is `None`.
    pub fn from_level_value(value: i32) -> Self {
        match value {
            0 => Severity::Trace,
            1 => Severity::Debug,
            2 => Severity::Information,
            3 => Severity::Warning,
            4 => Severity::Error,
            5 => Severity::Critical,
            _ => Severity::None,
        }
    }

    /// OpenTelemetry severity text.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Debug => "DEBUG",
            Severity::Information => "INFO",
            Severity::Warning => "WARN",
            Severity::Error => "ERROR",
            Severity::Critical => "FATAL",
            Severity::None => "NONE",
        }
    }

    /// OpenTelemetry severity number, as text.
    pub fn number(&self) -> &'static str {
        match self {
            Severity::Trace => "1",
            Severity::Debug => "5",
            Severity::Information => "9",
            Severity::Warning => "13",
            Severity::Error => "17",
            Severity::Critical => "21",
            Severity::None => "0",
        }
    }
}

impl From<log::Level> for Severity {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Trace => Severity::Trace,
            log::Level::Debug => Severity::Debug,
            log::Level::Info => Severity::Information,
            log::Level::Warn => Severity::Warning,
            log::Level::Error => Severity::Error,
        }
    }
}

/// Numeric id plus optional name of a logged event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventId {
    pub id: i32,
    pub name: Option<String>,
}

impl EventId {
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
        }
    }
}

/// W3C trace id, rendered as 32 lowercase hex digits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TraceId(pub [u8; 16]);

impl TraceId {
    pub fn from_hex(s: &str) -> Option<Self> {
        let mut out = [0u8; 16];
        hex::decode_to_slice(s, &mut out).ok()?;
        Some(TraceId(out))
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// W3C span id, rendered as 16 lowercase hex digits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SpanId(pub [u8; 8]);

impl SpanId {
    pub fn from_hex(s: &str) -> Option<Self> {
        let mut out = [0u8; 8];
        hex::decode_to_slice(s, &mut out).ok()?;
        Some(SpanId(out))
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Trace flags. Only the sampled bit is meaningful.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TraceFlags(pub u8);

impl TraceFlags {
    pub const RECORDED: TraceFlags = TraceFlags(0x01);

    pub fn is_recorded(&self) -> bool {
        self.0 & 0x01 != 0
    }
}

impl fmt::Display for TraceFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.is_recorded() { "Recorded" } else { "None" })
    }
}

/// Error attached to a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub type_name: String,
    pub message: String,
    pub stacktrace: String,
}

impl ErrorInfo {
    pub fn new(
        type_name: impl Into<String>,
        message: impl Into<String>,
        stacktrace: impl Into<String>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            stacktrace: stacktrace.into(),
        }
    }

    /// Captures a Rust error: its type name, its message, and the full
    /// `source()` chain as the formatted trace.
    pub fn from_error<E: std::error::Error + 'static>(err: &E) -> Self {
        let type_name = std::any::type_name::<E>();
        let message = err.to_string();

        let mut trace = format!("{}: {}", type_name, message);
        let mut source = err.source();
        while let Some(cause) = source {
            trace.push_str("\n  caused by: ");
            trace.push_str(&cause.to_string());
            source = cause.source();
        }

        Self::new(type_name, message, trace)
    }
}

/// The record's state payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Text already rendered by the logging facade. Written verbatim.
    Message(String),
    /// Arbitrary structured state. Written as compact JSON.
    Structured(Value),
}

/// One structured log record.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub category: String,
    pub event_id: EventId,
    pub severity: Severity,
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub trace_flags: TraceFlags,
    pub state: Option<Payload>,
    pub error: Option<ErrorInfo>,
    /// Free-form attributes, kept in insertion order.
    pub attributes: Vec<(String, Value)>,
}

impl LogRecord {
    pub fn new(timestamp: DateTime<Utc>, category: impl Into<String>, severity: Severity) -> Self {
        Self {
            timestamp,
            category: category.into(),
            event_id: EventId::default(),
            severity,
            trace_id: TraceId::default(),
            span_id: SpanId::default(),
            trace_flags: TraceFlags::default(),
            state: None,
            error: None,
            attributes: Vec::new(),
        }
    }

    /// Builds a record from a `log` facade record, stamped with the current time.
    pub fn from_log(record: &log::Record<'_>) -> Self {
        Self::new(Utc::now(), record.target(), record.level().into())
            .with_message(record.args().to_string())
    }

    pub fn with_event(mut self, event_id: EventId) -> Self {
        self.event_id = event_id;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.state = Some(Payload::Message(message.into()));
        self
    }

    pub fn with_state(mut self, state: Value) -> Self {
        self.state = Some(Payload::Structured(state));
        self
    }

    pub fn with_error(mut self, error: ErrorInfo) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_trace(mut self, trace_id: TraceId, span_id: SpanId, flags: TraceFlags) -> Self {
        self.trace_id = trace_id;
        self.span_id = span_id;
        self.trace_flags = flags;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }
}
