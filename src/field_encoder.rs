//! Conversion of typed record fields into their text form.
//!
//! Overflow is not detected here: the encoder produces text and the
//! [`RecordWriter`](crate::RecordWriter) reports when it does not fit.

use std::borrow::Cow;

use chrono::{DateTime, Datelike, Utc};
use serde_json::{Map, Value};

use crate::config::{TimestampFormat, TimestampUnit};
use crate::error::EncodeError;
use crate::record::{LogRecord, Payload};
use crate::schema::Column;

pub const EXCEPTION_TYPE: &str = "exception.type";
pub const EXCEPTION_MESSAGE: &str = "exception.message";
pub const EXCEPTION_STACKTRACE: &str = "exception.stacktrace";

/// Renders one column of a record as text.
///
/// Holds what is fixed for an exporter's lifetime: the timestamp format and
/// the pre-rendered resource blob shared by every row.
#[derive(Debug, Clone)]
pub struct FieldEncoder {
    timestamp_format: TimestampFormat,
    resource: String,
}

impl FieldEncoder {
    pub fn new(timestamp_format: TimestampFormat, resource: impl Into<String>) -> Self {
        Self {
            timestamp_format,
            resource: resource.into(),
        }
    }

    pub fn timestamp_format(&self) -> TimestampFormat {
        self.timestamp_format
    }

    pub fn encode<'a>(&'a self, column: Column, record: &'a LogRecord) -> Result<Cow<'a, str>, EncodeError> {
        let text = match column {
            Column::Timestamp => Cow::Owned(encode_timestamp(&record.timestamp, self.timestamp_format)?),
            Column::Resource => Cow::Borrowed(self.resource.as_str()),
            Column::Category => Cow::Borrowed(record.category.as_str()),
            Column::EventName => Cow::Borrowed(record.event_id.name.as_deref().unwrap_or("")),
            Column::EventId => Cow::Owned(record.event_id.id.to_string()),
            Column::Severity => Cow::Borrowed(record.severity.as_str()),
            Column::SeverityNumber => Cow::Borrowed(record.severity.number()),
            Column::TraceId => Cow::Owned(record.trace_id.to_string()),
            Column::SpanId => Cow::Owned(record.span_id.to_string()),
            Column::TraceFlags => Cow::Owned(record.trace_flags.to_string()),
            Column::Attributes => Cow::Owned(encode_attributes(record)?),
            Column::Payload => encode_payload(record.state.as_ref())?,
        };
        Ok(text)
    }
}

/// Formats a timestamp as sink-native datetime text or as an unsigned
/// epoch offset.
pub fn encode_timestamp(ts: &DateTime<Utc>, format: TimestampFormat) -> Result<String, EncodeError> {
    match format {
        TimestampFormat::KustoDateTime => {
            if !(1..=9999).contains(&ts.year()) {
                return Err(EncodeError::TimestampOutOfRange(ts.to_rfc3339()));
            }
            // seven fractional digits (100ns ticks); leap-second nanos folded back
            let ticks = (ts.timestamp_subsec_nanos() % 1_000_000_000) / 100;
            Ok(format!("{}.{:07}Z", ts.format("%Y-%m-%dT%H:%M:%S"), ticks))
        }
        TimestampFormat::UnixEpoch(unit) => {
            let value = match unit {
                TimestampUnit::Nanoseconds => ts.timestamp_nanos_opt(),
                TimestampUnit::Microseconds => Some(ts.timestamp_micros()),
                TimestampUnit::Milliseconds => Some(ts.timestamp_millis()),
            };
            value
                .and_then(|v| u64::try_from(v).ok())
                .map(|v| v.to_string())
                .ok_or_else(|| EncodeError::TimestampOutOfRange(ts.to_rfc3339()))
        }
    }
}

fn lower(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Lower-camel-cases a member name by lowering its leading run of capitals:
/// `FieldA` -> `fieldA`, `URLValue` -> `urlValue`, `ID` -> `id`.
pub fn to_camel_case(name: &str) -> Cow<'_, str> {
    if !name.chars().next().is_some_and(char::is_uppercase) {
        return Cow::Borrowed(name);
    }

    let mut chars: Vec<char> = name.chars().collect();
    for i in 0..chars.len() {
        if i == 1 && !chars[i].is_uppercase() {
            break;
        }
        // keep the capital that starts the next word
        if i > 0 && i + 1 < chars.len() && !chars[i + 1].is_uppercase() {
            if chars[i + 1] == ' ' {
                chars[i] = lower(chars[i]);
            }
            break;
        }
        chars[i] = lower(chars[i]);
    }
    Cow::Owned(chars.into_iter().collect())
}

/// Camel-cases object keys and drops null members, recursively.
/// Array elements are kept as they are, nulls included.
///
/// Fails when two keys of one object camel-case to the same name.
pub fn normalize(value: &Value) -> Result<Value, EncodeError> {
    match value {
        Value::Object(members) => {
            let mut out = Map::with_capacity(members.len());
            for (key, member) in members.iter().filter(|(_, v)| !v.is_null()) {
                let name = to_camel_case(key).into_owned();
                if out.contains_key(&name) {
                    return Err(EncodeError::DuplicateKey(name));
                }
                out.insert(name, normalize(member)?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => Ok(Value::Array(items.iter().map(normalize).collect::<Result<_, _>>()?)),
        other => Ok(other.clone()),
    }
}

/// Attribute keys are written as given; only the values are normalized.
fn attribute_members(attributes: &[(String, Value)]) -> Result<Map<String, Value>, EncodeError> {
    let mut members = Map::with_capacity(attributes.len());
    for (key, value) in attributes.iter().filter(|(_, v)| !v.is_null()) {
        members.insert(key.clone(), normalize(value)?);
    }
    Ok(members)
}

/// Compact JSON for an ordered attribute list.
pub fn compact_object(attributes: &[(String, Value)]) -> Result<String, EncodeError> {
    Ok(serde_json::to_string(&Value::Object(attribute_members(attributes)?))?)
}

/// Record attributes, plus the three exception attributes when an error
/// is attached.
pub fn encode_attributes(record: &LogRecord) -> Result<String, EncodeError> {
    let mut members = attribute_members(&record.attributes)?;

    if let Some(error) = &record.error {
        members.insert(EXCEPTION_TYPE.to_string(), Value::from(error.type_name.as_str()));
        members.insert(EXCEPTION_MESSAGE.to_string(), Value::from(error.message.as_str()));
        members.insert(EXCEPTION_STACKTRACE.to_string(), Value::from(error.stacktrace.as_str()));
    }

    Ok(serde_json::to_string(&Value::Object(members))?)
}

pub fn encode_payload(state: Option<&Payload>) -> Result<Cow<'_, str>, EncodeError> {
    match state {
        None => Ok(Cow::Borrowed("")),
        Some(Payload::Message(text)) => Ok(Cow::Borrowed(text.as_str())),
        Some(Payload::Structured(value)) => Ok(Cow::Owned(serde_json::to_string(&normalize(value)?)?)),
    }
}
