//! # Kusto Log Exporter
//!
//! Exports structured log records to a columnar ingestion sink as CSV rows,
//! batching rows into fixed-capacity buffers before each upload:
//!
//! * **Bounded memory**: one fixed buffer per worker, allocated once and reused
//! * **Whole rows only**: a record that fails halfway is rolled back, so the
//!   sink never sees a truncated row
//! * **Partial failure**: a bad record or a rejected flush marks the batch as
//!   failed but every remaining record is still attempted
//!
//! ## Main Components
//!
//! * `FieldEncoder`: renders one field (timestamp, severity, ids, JSON payloads)
//! * `RecordWriter`: writes a record's fields as one CSV row
//! * `BoundedBuffer`: fixed byte region with commit and rollback cursors
//! * `KustoLogExporter`: the batch loop and flush control, behind the
//!   `LogExporter` trait
//! * `IngestionSink`: where flushed bytes go; transport lives outside this crate
//!
//! ## Quick Start
//!
//! ```
//! use kusto_log_exporter::{
//!     ExportContext, ExporterOptions, FileSink, KustoLogExporter, LogExporter, LogRecord,
//!     Resource, Severity,
//! };
//!
//! # let dir = tempfile::tempdir().unwrap();
//! # let path = dir.path().join("logs.csv");
//! let mut options = ExporterOptions::new("https://ingest-cluster.kusto.windows.net");
//! options.database_name = "OTel".into();
//! options.table_name = "OTelLogs".into();
//!
//! let resource = Resource::new().with_service("ServiceName", "ServiceNamespace", "1.0.0");
//! let exporter = KustoLogExporter::new(options, &resource, FileSink::open(&path).unwrap()).unwrap();
//!
//! // One context per worker thread
//! let mut context = ExportContext::new();
//! let batch = vec![
//!     LogRecord::new(chrono::Utc::now(), "Sample", Severity::Information)
//!         .with_message("Some info message with param 123"),
//! ];
//! assert!(exporter.export(&mut context, &batch).is_success());
//! ```

pub mod bounded_buffer;
pub mod config;
pub mod error;
pub mod exporter;
pub mod field_encoder;
pub mod record;
pub mod record_writer;
pub mod resource;
pub mod schema;
pub mod sink;

pub use bounded_buffer::BoundedBuffer;
pub use config::{
    ConnectionString, ExporterOptions, ReportLevel, ReportMethod, TimestampFormat, TimestampUnit,
};
pub use error::{EncodeError, Error, SinkError};
pub use exporter::{ExportContext, ExportResult, ExportStats, KustoLogExporter, LogExporter};
pub use field_encoder::FieldEncoder;
pub use record::{ErrorInfo, EventId, LogRecord, Payload, Severity, SpanId, TraceFlags, TraceId};
pub use record_writer::RecordWriter;
pub use resource::Resource;
pub use schema::{Column, RowSchema};
pub use sink::{ClientKind, DataFormat, FileSink, IngestionMapping, IngestionProperties, IngestionSink};
