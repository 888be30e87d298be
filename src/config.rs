//! Exporter configuration.
//!
//! Options deserialize with serde, so hosts can load them from any format
//! they already use. [`ExporterOptions::validate`] fills in defaults and
//! rejects configurations the exporter cannot run with.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::RowSchema;

pub const DEFAULT_DATABASE_NAME: &str = "Default";
pub const DEFAULT_TABLE_NAME: &str = "Logs";
pub const DEFAULT_BUFFER_CAPACITY: usize = 65360;

/// Unit of the integer epoch timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampUnit {
    #[default]
    Nanoseconds,
    Microseconds,
    Milliseconds,
}

/// How the timestamp column is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampFormat {
    /// Sink-native `datetime` text.
    KustoDateTime,
    /// Unsigned offset from the Unix epoch.
    UnixEpoch(TimestampUnit),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportLevel {
    None,
    #[default]
    FailuresOnly,
    FailuresAndSuccesses,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportMethod {
    #[default]
    Queue,
    Table,
    QueueAndTable,
}

/// A parsed cluster connection string.
///
/// Accepts either a bare URI or `key=value` pairs separated by `;`, where
/// the data source is given by `Data Source`, `Server`, `Addr` or
/// `Address`. A bare URI may be followed by further pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    data_source: String,
    properties: Vec<(String, String)>,
}

impl ConnectionString {
    pub fn parse(raw: &str) -> Result<Self> {
        let mut data_source = None;
        let mut properties = Vec::new();

        for (index, segment) in raw.split(';').map(str::trim).enumerate() {
            if segment.is_empty() {
                continue;
            }
            match segment.split_once('=') {
                Some((key, value)) => {
                    let key = key.trim();
                    let value = value.trim();
                    match key.to_ascii_lowercase().as_str() {
                        "data source" | "server" | "addr" | "address" | "network address" => {
                            data_source = Some(value.to_string())
                        }
                        _ => properties.push((key.to_string(), value.to_string())),
                    }
                }
                None if index == 0 => data_source = Some(segment.to_string()),
                None => {
                    return Err(Error::Config(format!(
                        "malformed connection string segment '{}'",
                        segment
                    )))
                }
            }
        }

        let data_source = data_source
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::Config("connection string has no data source".into()))?;

        let host = data_source
            .strip_prefix("https://")
            .or_else(|| data_source.strip_prefix("http://"))
            .ok_or_else(|| {
                Error::Config(format!("data source '{}' is not an http(s) URI", data_source))
            })?;
        if host.split('/').next().unwrap_or("").is_empty() {
            return Err(Error::Config(format!("data source '{}' has no host", data_source)));
        }

        Ok(Self {
            data_source,
            properties,
        })
    }

    pub fn data_source(&self) -> &str {
        &self.data_source
    }

    /// Looks up a non-data-source property, case-insensitively.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Options for [`KustoLogExporter`](crate::KustoLogExporter).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterOptions {
    pub connection_string: Option<String>,
    pub database_name: String,
    pub table_name: String,
    pub mapping_reference: Option<String>,
    pub report_level: ReportLevel,
    pub report_method: ReportMethod,
    pub enable_stream_ingestion: bool,
    /// Write timestamps as sink `datetime` text rather than epoch integers.
    pub use_kusto_datetime: bool,
    pub timestamp_unit: TimestampUnit,
    pub schema: RowSchema,
    pub buffer_capacity: usize,
}

impl Default for ExporterOptions {
    fn default() -> Self {
        Self {
            connection_string: None,
            database_name: DEFAULT_DATABASE_NAME.to_string(),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            mapping_reference: None,
            report_level: ReportLevel::default(),
            report_method: ReportMethod::default(),
            enable_stream_ingestion: false,
            use_kusto_datetime: true,
            timestamp_unit: TimestampUnit::default(),
            schema: RowSchema::default(),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl ExporterOptions {
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: Some(connection_string.into()),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(format!("invalid options: {}", e)))
    }

    /// Fills empty names with defaults and checks everything else.
    /// Returns the parsed connection string.
    pub fn validate(&mut self) -> Result<ConnectionString> {
        let raw = self
            .connection_string
            .as_deref()
            .ok_or_else(|| Error::Config("connection string is required".into()))?;
        let connection = ConnectionString::parse(raw)?;

        if self.database_name.trim().is_empty() {
            self.database_name = DEFAULT_DATABASE_NAME.to_string();
        }
        if self.table_name.trim().is_empty() {
            self.table_name = DEFAULT_TABLE_NAME.to_string();
        }
        if self.mapping_reference.as_deref().is_some_and(|m| m.trim().is_empty()) {
            self.mapping_reference = None;
        }

        if self.buffer_capacity == 0 {
            return Err(Error::Config("buffer capacity must be positive".into()));
        }
        if self.schema.columns().is_empty() {
            return Err(Error::Config("row schema has no columns".into()));
        }

        Ok(connection)
    }

    pub fn timestamp_format(&self) -> TimestampFormat {
        if self.use_kusto_datetime {
            TimestampFormat::KustoDateTime
        } else {
            TimestampFormat::UnixEpoch(self.timestamp_unit)
        }
    }
}
