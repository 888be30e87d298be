//! Row schemas: which columns are written, and in which order.

use serde::{Deserialize, Serialize};

/// A single column of the target table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    /// `datetime` or `uint64`, depending on the timestamp format.
    Timestamp,
    /// Session-wide resource attributes (`dynamic`).
    Resource,
    Category,
    EventName,
    EventId,
    /// Severity text, e.g. `WARN`.
    Severity,
    /// Severity number, e.g. `13`.
    SeverityNumber,
    TraceId,
    SpanId,
    TraceFlags,
    /// Record attributes (`dynamic`).
    Attributes,
    /// Rendered message or structured state.
    Payload,
}

const ENRICHED: &[Column] = &[
    Column::Timestamp,
    Column::Resource,
    Column::Category,
    Column::EventName,
    Column::EventId,
    Column::Severity,
    Column::TraceId,
    Column::SpanId,
    Column::TraceFlags,
    Column::Attributes,
    Column::Payload,
];

const MINIMAL: &[Column] = &[Column::Timestamp, Column::Severity, Column::Payload];

/// Column layout of every row written by one exporter.
///
/// The layout is fixed when the exporter is built and never changes
/// between records.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowSchema {
    /// OpenTelemetry log layout with resource and trace context.
    #[default]
    Enriched,
    /// Timestamp, severity and message only.
    Minimal,
    /// Caller-defined column order.
    Custom(Vec<Column>),
}

impl RowSchema {
    pub fn columns(&self) -> &[Column] {
        match self {
            RowSchema::Enriched => ENRICHED,
            RowSchema::Minimal => MINIMAL,
            RowSchema::Custom(columns) => columns,
        }
    }
}
