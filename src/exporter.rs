//! Batch export and flush control.
//!
//! [`KustoLogExporter`] drives one batch at a time: every record is written
//! into the worker's [`BoundedBuffer`], a failed record is rolled back and
//! skipped, and committed rows are flushed to the sink whenever the buffer
//! is saturated and once more at the end of the batch.

use tracing::{debug, error, info};

use crate::bounded_buffer::BoundedBuffer;
use crate::config::ExporterOptions;
use crate::error::Result;
use crate::field_encoder::FieldEncoder;
use crate::record::LogRecord;
use crate::record_writer::RecordWriter;
use crate::resource::Resource;
use crate::schema::RowSchema;
use crate::sink::{IngestionProperties, IngestionSink};

/// Outcome of one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportResult {
    Success,
    /// At least one record was dropped or one flush was rejected.
    Failure,
}

impl ExportResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ExportResult::Success)
    }
}

/// Anything that can export a batch of log records.
pub trait LogExporter {
    /// Exports `batch` using the calling worker's `context`.
    ///
    /// Never fails as a whole: per-record and per-flush faults are folded
    /// into the returned [`ExportResult`].
    fn export(&self, context: &mut ExportContext, batch: &[LogRecord]) -> ExportResult;
}

/// Cumulative counters of one worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportStats {
    pub records_written: u64,
    pub records_dropped: u64,
    pub flushes: u64,
    pub flush_failures: u64,
    pub bytes_flushed: u64,
}

/// Per-worker export state.
///
/// Each worker that calls [`LogExporter::export`] owns one context. The
/// buffer inside is created on first use and then reused for every later
/// batch, so a context must never be shared between concurrent exports.
///
/// # Examples
///
/// ```
/// # use kusto_log_exporter::ExportContext;
/// let mut context = ExportContext::new();
/// assert!(context.buffer().is_none());
/// assert_eq!(context.stats().flushes, 0);
/// ```
#[derive(Debug, Default)]
pub struct ExportContext {
    buffer: Option<BoundedBuffer>,
    stats: ExportStats,
}

impl ExportContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The worker's buffer, if a batch has been exported through it yet.
    pub fn buffer(&self) -> Option<&BoundedBuffer> {
        self.buffer.as_ref()
    }

    pub fn stats(&self) -> &ExportStats {
        &self.stats
    }
}

/// Exports log records as CSV rows to an ingestion sink.
///
/// The exporter itself is immutable after construction and can be shared
/// across threads; all mutable state lives in each worker's
/// [`ExportContext`].
///
/// # Examples
///
/// ```
/// # use kusto_log_exporter::*;
/// # use std::sync::Mutex;
/// # struct MemorySink(Mutex<Vec<u8>>);
/// # impl IngestionSink for MemorySink {
/// #     fn ingest(&self, data: &[u8], _: &IngestionProperties) -> Result<(), SinkError> {
/// #         self.0.lock().unwrap().extend_from_slice(data);
/// #         Ok(())
/// #     }
/// # }
/// let mut options = ExporterOptions::new("https://ingest-cluster.kusto.windows.net");
/// options.schema = RowSchema::Minimal;
/// let resource = Resource::new().with_service("checkout", "shop", "1.2.0");
/// let exporter = KustoLogExporter::new(options, &resource, MemorySink(Mutex::new(Vec::new()))).unwrap();
///
/// let mut context = ExportContext::new();
/// let batch = vec![LogRecord::new(chrono::Utc::now(), "checkout", Severity::Information)
///     .with_message("order placed")];
///
/// assert_eq!(exporter.export(&mut context, &batch), ExportResult::Success);
/// assert_eq!(context.stats().flushes, 1);
/// ```
pub struct KustoLogExporter<S> {
    options: ExporterOptions,
    properties: IngestionProperties,
    encoder: FieldEncoder,
    sink: S,
}

impl<S: IngestionSink> KustoLogExporter<S> {
    /// Validates `options` and renders `resource` once for all rows.
    ///
    /// Fails with [`Error::Config`](crate::Error::Config) on invalid options; no export is ever
    /// attempted in that case.
    pub fn new(mut options: ExporterOptions, resource: &Resource, sink: S) -> Result<Self> {
        let connection = options.validate()?;
        let properties = IngestionProperties::from_options(&options);
        let encoder = FieldEncoder::new(options.timestamp_format(), resource.to_context_string()?);

        info!(
            data_source = connection.data_source(),
            database = %properties.database,
            table = %properties.table,
            client = ?properties.client,
            capacity = options.buffer_capacity,
            "kusto log exporter created"
        );

        Ok(Self {
            options,
            properties,
            encoder,
            sink,
        })
    }

    pub fn options(&self) -> &ExporterOptions {
        &self.options
    }

    pub fn properties(&self) -> &IngestionProperties {
        &self.properties
    }

    pub fn schema(&self) -> &RowSchema {
        &self.options.schema
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Flushes the committed rows when `force` is set or the buffer is
    /// saturated. The buffer is reset after every attempt, accepted or not.
    ///
    /// Returns false when the sink rejected the upload.
    fn flush_if_needed(&self, buffer: &mut BoundedBuffer, stats: &mut ExportStats, force: bool) -> bool {
        if !(force || buffer.is_saturated()) || buffer.is_empty() {
            return true;
        }

        let data = buffer.committed_range();
        let size = data.len();
        let outcome = self.sink.ingest(data, &self.properties);
        buffer.reset();

        match outcome {
            Ok(()) => {
                stats.flushes += 1;
                stats.bytes_flushed += size as u64;
                debug!(bytes = size, force, "flushed rows to sink");
                true
            }
            Err(err) => {
                stats.flush_failures += 1;
                error!(bytes = size, force, error = %err, "flush rejected, rows dropped");
                false
            }
        }
    }
}

impl<S: IngestionSink> LogExporter for KustoLogExporter<S> {
    fn export(&self, context: &mut ExportContext, batch: &[LogRecord]) -> ExportResult {
        let capacity = self.options.buffer_capacity;
        let ExportContext { buffer, stats } = context;

        if buffer.as_ref().is_some_and(|b| b.capacity() != capacity) {
            *buffer = None;
        }
        let buffer = buffer.get_or_insert_with(|| BoundedBuffer::new(capacity));
        buffer.reset();

        let writer = RecordWriter::new(&self.encoder, &self.options.schema);
        let mut result = ExportResult::Success;

        for record in batch {
            match writer.write_record(buffer, record) {
                Ok(_) => stats.records_written += 1,
                Err(err) => {
                    buffer.rollback();
                    stats.records_dropped += 1;
                    result = ExportResult::Failure;
                    if err.is_overflow() {
                        debug!(error = %err, category = %record.category, "record does not fit, dropped");
                    } else {
                        error!(error = %err, category = %record.category, "failed to encode record");
                    }
                }
            }

            if !self.flush_if_needed(buffer, stats, false) {
                result = ExportResult::Failure;
            }
        }

        if !self.flush_if_needed(buffer, stats, true) {
            result = ExportResult::Failure;
        }

        result
    }
}
