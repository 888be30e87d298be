//! Ingestion sink abstraction and the properties sent with every upload.
//!
//! The exporter itself does no network I/O. Each flush hands the committed
//! byte range to an [`IngestionSink`], which owns transport, authentication,
//! retries and timeouts.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use parking_lot::Mutex;

use crate::config::{ExporterOptions, ReportLevel, ReportMethod};
use crate::error::SinkError;

/// Receiver of flushed row data.
///
/// `ingest` is called from the exporting worker and blocks it until the
/// sink accepts or rejects the bytes. Implementations are shared between
/// workers, so they must be `Send + Sync`.
///
/// # Usage
///
/// ```
/// # use kusto_log_exporter::{IngestionSink, IngestionProperties, SinkError};
/// # use std::sync::Mutex;
/// // Keeps every upload in memory
/// struct MemorySink(Mutex<Vec<u8>>);
///
/// impl IngestionSink for MemorySink {
///     fn ingest(&self, data: &[u8], _properties: &IngestionProperties) -> Result<(), SinkError> {
///         self.0.lock().unwrap().extend_from_slice(data);
///         Ok(())
///     }
/// }
/// ```
pub trait IngestionSink: Send + Sync {
    /// Uploads `data`, which is exactly `data.len()` bytes of whole CSV rows.
    ///
    /// The slice is only valid for the duration of the call; the buffer
    /// behind it is reused as soon as this returns.
    fn ingest(&self, data: &[u8], properties: &IngestionProperties) -> Result<(), SinkError>;
}

impl<S: IngestionSink + ?Sized> IngestionSink for std::sync::Arc<S> {
    fn ingest(&self, data: &[u8], properties: &IngestionProperties) -> Result<(), SinkError> {
        (**self).ingest(data, properties)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Csv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientKind {
    Queued,
    Streaming,
}

/// Reference to a pre-created ingestion mapping on the target table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionMapping {
    pub kind: DataFormat,
    pub reference: String,
}

/// Destination and reporting settings attached to every upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionProperties {
    pub client: ClientKind,
    pub database: String,
    pub table: String,
    pub format: DataFormat,
    pub mapping: Option<IngestionMapping>,
    /// Only set for queued ingestion.
    pub report_level: Option<ReportLevel>,
    /// Only set for queued ingestion.
    pub report_method: Option<ReportMethod>,
}

impl IngestionProperties {
    /// Maps validated options to upload properties.
    pub fn from_options(options: &ExporterOptions) -> Self {
        let mapping = options
            .mapping_reference
            .as_ref()
            .filter(|r| !r.is_empty())
            .map(|reference| IngestionMapping {
                kind: DataFormat::Csv,
                reference: reference.clone(),
            });

        let (client, report_level, report_method) = if options.enable_stream_ingestion {
            (ClientKind::Streaming, None, None)
        } else {
            (
                ClientKind::Queued,
                Some(options.report_level),
                Some(options.report_method),
            )
        };

        Self {
            client,
            database: options.database_name.clone(),
            table: options.table_name.clone(),
            format: DataFormat::Csv,
            mapping,
            report_level,
            report_method,
        }
    }
}

/// Appends every flushed range to a local file.
///
/// Useful for capturing exporter output without a cluster. One FileSink can
/// serve many workers; writes are serialized by an internal lock so rows
/// from different flushes never interleave.
pub struct FileSink {
    file: Mutex<File>,
}

impl FileSink {
    /// Opens `path` for appending, creating it when missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl IngestionSink for FileSink {
    fn ingest(&self, data: &[u8], _properties: &IngestionProperties) -> Result<(), SinkError> {
        let mut file = self.file.lock();
        file.write_all(data)?;
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> ExporterOptions {
        let mut options = ExporterOptions::new("https://cluster");
        options.database_name = "OTel".into();
        options.table_name = "OTelLogs".into();
        options
    }

    #[test]
    fn test_queued_properties() {
        let mut opts = options();
        opts.mapping_reference = Some("OTelLogsMapping".into());
        opts.report_level = ReportLevel::FailuresAndSuccesses;

        let props = IngestionProperties::from_options(&opts);
        assert_eq!(props.client, ClientKind::Queued);
        assert_eq!(props.database, "OTel");
        assert_eq!(props.table, "OTelLogs");
        assert_eq!(props.format, DataFormat::Csv);
        assert_eq!(
            props.mapping,
            Some(IngestionMapping {
                kind: DataFormat::Csv,
                reference: "OTelLogsMapping".into()
            })
        );
        assert_eq!(props.report_level, Some(ReportLevel::FailuresAndSuccesses));
        assert_eq!(props.report_method, Some(ReportMethod::Queue));
    }

    #[test]
    fn test_streaming_properties() {
        let mut opts = options();
        opts.enable_stream_ingestion = true;

        let props = IngestionProperties::from_options(&opts);
        assert_eq!(props.client, ClientKind::Streaming);
        assert_eq!(props.mapping, None);
        assert_eq!(props.report_level, None);
        assert_eq!(props.report_method, None);
    }

    #[test]
    fn test_file_sink_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        let props = IngestionProperties::from_options(&options());

        let sink = FileSink::open(&path).unwrap();
        sink.ingest(b"a,1\r\n", &props).unwrap();
        sink.ingest(b"b,2\r\n", &props).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"a,1\r\nb,2\r\n");
    }
}
