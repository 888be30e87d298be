//! Serializes records as CSV rows into a [`BoundedBuffer`].
//!
//! Row format: fields in schema order, separated by `,`, terminated by
//! `\r\n`. A field is quoted when it contains a separator, a quote, a line
//! break, or leading/trailing whitespace; embedded quotes are doubled.

use crate::bounded_buffer::BoundedBuffer;
use crate::error::EncodeError;
use crate::field_encoder::FieldEncoder;
use crate::record::LogRecord;
use crate::schema::RowSchema;

/// Field separator.
pub const FIELD_SEPARATOR: u8 = b',';
/// Row terminator.
pub const ROW_TERMINATOR: &[u8] = b"\r\n";
const QUOTE: u8 = b'"';

/// Writes whole rows or nothing.
///
/// On success the row is committed in the buffer. On failure the buffer is
/// left holding the partial row past its committed cursor, and the caller
/// must `rollback()`.
///
/// # Examples
///
/// ```
/// # use kusto_log_exporter::{BoundedBuffer, FieldEncoder, LogRecord, RecordWriter, RowSchema, Severity, TimestampFormat, TimestampUnit};
/// # use chrono::{TimeZone, Utc};
/// let encoder = FieldEncoder::new(TimestampFormat::UnixEpoch(TimestampUnit::Milliseconds), "{}");
/// let writer = RecordWriter::new(&encoder, &RowSchema::Minimal);
/// let mut buffer = BoundedBuffer::new(1024);
///
/// let record = LogRecord::new(Utc.timestamp_opt(1, 0).unwrap(), "app", Severity::Warning)
///     .with_message("disk, almost full");
/// let len = writer.write_record(&mut buffer, &record).unwrap();
///
/// assert_eq!(buffer.committed_range(), b"1000,WARN,\"disk, almost full\"\r\n");
/// assert_eq!(len, buffer.committed_pos());
/// ```
pub struct RecordWriter<'a> {
    encoder: &'a FieldEncoder,
    schema: &'a RowSchema,
}

impl<'a> RecordWriter<'a> {
    pub fn new(encoder: &'a FieldEncoder, schema: &'a RowSchema) -> Self {
        Self { encoder, schema }
    }

    /// Writes one record and commits it. Returns the row length in bytes.
    ///
    /// Stops at the first field that fails to encode or does not fit;
    /// later fields of that record are not attempted.
    pub fn write_record(&self, buffer: &mut BoundedBuffer, record: &LogRecord) -> Result<usize, EncodeError> {
        let row_start = buffer.committed_pos();

        for (i, column) in self.schema.columns().iter().enumerate() {
            if i > 0 {
                buffer.try_append(&[FIELD_SEPARATOR])?;
            }
            let text = self.encoder.encode(*column, record)?;
            write_field(buffer, text.as_bytes())?;
        }
        buffer.try_append(ROW_TERMINATOR)?;

        buffer.commit();
        Ok(buffer.committed_pos() - row_start)
    }
}

fn needs_quoting(field: &[u8]) -> bool {
    let edge_space = |b: Option<&u8>| matches!(b, Some(b' ') | Some(b'\t'));
    edge_space(field.first())
        || edge_space(field.last())
        || field
            .iter()
            .any(|&b| matches!(b, FIELD_SEPARATOR | QUOTE | b'\r' | b'\n'))
}

/// Appends one field, quoting and escaping as needed.
pub fn write_field(buffer: &mut BoundedBuffer, field: &[u8]) -> Result<(), EncodeError> {
    if !needs_quoting(field) {
        buffer.try_append(field)?;
        return Ok(());
    }

    buffer.try_append(&[QUOTE])?;
    let mut parts = field.split(|&b| b == QUOTE);
    if let Some(first) = parts.next() {
        buffer.try_append(first)?;
    }
    for part in parts {
        buffer.try_append(&[QUOTE, QUOTE])?;
        buffer.try_append(part)?;
    }
    buffer.try_append(&[QUOTE])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{TimestampFormat, TimestampUnit};
    use crate::record::{ErrorInfo, EventId, Severity, SpanId, TraceFlags, TraceId};
    use crate::schema::Column;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn epoch_encoder() -> FieldEncoder {
        FieldEncoder::new(TimestampFormat::UnixEpoch(TimestampUnit::Nanoseconds), "{}")
    }

    fn record(message: &str) -> LogRecord {
        LogRecord::new(Utc.timestamp_opt(0, 0).unwrap(), "app", Severity::Information).with_message(message)
    }

    fn field_text(field: &[u8]) -> String {
        let mut buffer = BoundedBuffer::new(256);
        write_field(&mut buffer, field).unwrap();
        String::from_utf8(buffer.pending_range().to_vec()).unwrap()
    }

    #[test]
    fn test_field_escaping() {
        assert_eq!(field_text(b"plain"), "plain");
        assert_eq!(field_text(b""), "");
        assert_eq!(field_text(b"a,b"), "\"a,b\"");
        assert_eq!(field_text(b"say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(field_text(b"line1\nline2"), "\"line1\nline2\"");
        assert_eq!(field_text(b" padded"), "\" padded\"");
        assert_eq!(field_text(br#"{"a":1}"#), r#""{""a"":1}""#);
    }

    #[test]
    fn test_minimal_row() {
        let encoder = epoch_encoder();
        let writer = RecordWriter::new(&encoder, &RowSchema::Minimal);
        let mut buffer = BoundedBuffer::new(128);

        let len = writer.write_record(&mut buffer, &record("hello")).unwrap();
        assert_eq!(buffer.committed_range(), b"0,INFO,hello\r\n");
        assert_eq!(len, 14);
        assert_eq!(buffer.write_pos(), buffer.committed_pos());
    }

    #[test]
    fn test_enriched_row_layout() {
        let encoder = FieldEncoder::new(TimestampFormat::KustoDateTime, r#"{"service.name":"svc"}"#);
        let writer = RecordWriter::new(&encoder, &RowSchema::Enriched);
        let mut buffer = BoundedBuffer::new(1024);

        let rec = LogRecord::new(Utc.timestamp_opt(0, 0).unwrap(), "Sample.Program", Severity::Error)
            .with_event(EventId::new(1, "SampleEvent"))
            .with_trace(
                TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap(),
                SpanId::from_hex("00f067aa0ba902b7").unwrap(),
                TraceFlags::RECORDED,
            )
            .with_state(json!({ "FieldA": "Some text", "FieldC": 123 }));
        writer.write_record(&mut buffer, &rec).unwrap();

        let row = String::from_utf8(buffer.committed_range().to_vec()).unwrap();
        assert_eq!(
            row,
            concat!(
                "1970-01-01T00:00:00.0000000Z,",
                r#""{""service.name"":""svc""}","#,
                "Sample.Program,SampleEvent,1,ERROR,",
                "4bf92f3577b34da6a3ce929d0e0e4736,00f067aa0ba902b7,Recorded,",
                "{},",
                r#""{""fieldA"":""Some text"",""fieldC"":123}""#,
                "\r\n"
            )
        );
    }

    #[test]
    fn test_rows_append_after_committed() {
        let encoder = epoch_encoder();
        let writer = RecordWriter::new(&encoder, &RowSchema::Minimal);
        let mut buffer = BoundedBuffer::new(128);

        writer.write_record(&mut buffer, &record("one")).unwrap();
        let second = writer.write_record(&mut buffer, &record("two")).unwrap();
        assert_eq!(second, 12);
        assert_eq!(buffer.committed_range(), b"0,INFO,one\r\n0,INFO,two\r\n");
    }

    #[test]
    fn test_overflow_leaves_pending_bytes_uncommitted() {
        let encoder = epoch_encoder();
        let writer = RecordWriter::new(&encoder, &RowSchema::Minimal);
        let mut buffer = BoundedBuffer::new(20);

        writer.write_record(&mut buffer, &record("ab")).unwrap();
        let committed = buffer.committed_range().to_vec();

        let err = writer.write_record(&mut buffer, &record("too long to fit")).unwrap_err();
        assert!(err.is_overflow());
        assert_eq!(buffer.committed_range(), committed.as_slice());
        assert!(buffer.write_pos() > buffer.committed_pos());

        buffer.rollback();
        assert_eq!(buffer.write_pos(), committed.len());
    }

    #[test]
    fn test_terminator_must_fit() {
        let encoder = epoch_encoder();
        let writer = RecordWriter::new(&encoder, &RowSchema::Minimal);
        // "0,INFO,abc" is 10 bytes, the terminator does not fit
        let mut buffer = BoundedBuffer::new(11);

        assert!(writer.write_record(&mut buffer, &record("abc")).is_err());
        assert_eq!(buffer.committed_pos(), 0);
    }

    #[test]
    fn test_stops_at_first_failing_field() {
        let encoder = epoch_encoder();
        let schema = RowSchema::Custom(vec![Column::Category, Column::Timestamp, Column::Payload]);
        let writer = RecordWriter::new(&encoder, &schema);
        let mut buffer = BoundedBuffer::new(128);

        let before_epoch = LogRecord::new(Utc.timestamp_opt(-5, 0).unwrap(), "app", Severity::Debug)
            .with_message("never written");
        let err = writer.write_record(&mut buffer, &before_epoch).unwrap_err();

        assert!(!err.is_overflow());
        assert_eq!(buffer.pending_range(), b"app,");
        assert_eq!(buffer.committed_pos(), 0);
    }

    #[test]
    fn test_error_attributes_column() {
        let encoder = epoch_encoder();
        let schema = RowSchema::Custom(vec![Column::Attributes]);
        let writer = RecordWriter::new(&encoder, &schema);
        let mut buffer = BoundedBuffer::new(256);

        let rec = record("boom").with_error(ErrorInfo::new("Io", "gone", "Io: gone"));
        writer.write_record(&mut buffer, &rec).unwrap();
        assert_eq!(
            buffer.committed_range(),
            concat!(
                r#""{""exception.type"":""Io"",""exception.message"":""gone"","#,
                r#"""exception.stacktrace"":""Io: gone""}""#,
                "\r\n"
            )
            .as_bytes()
        );
    }
}
