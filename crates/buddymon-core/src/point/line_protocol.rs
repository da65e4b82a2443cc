//! InfluxDB line protocol rendering.

use std::fmt;
use std::str::FromStr;

use influxdb_line_protocol::LineProtocolBuilder;
use serde::Deserialize;
use tracing::warn;

use crate::point::Batch;

/// How run counts are written as field values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldEncoding {
    /// String fields holding the literal kernel token (`1p="23821"`).
    #[default]
    Text,
    /// Unsigned integer fields (`1p=23821u`).
    Integer,
}

impl fmt::Display for FieldEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldEncoding::Text => write!(f, "text"),
            FieldEncoding::Integer => write!(f, "integer"),
        }
    }
}

impl FromStr for FieldEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(FieldEncoding::Text),
            "integer" => Ok(FieldEncoding::Integer),
            other => Err(format!(
                "unknown field encoding '{}', expected 'text' or 'integer'",
                other
            )),
        }
    }
}

enum FieldValue<'a> {
    Text(&'a str),
    Unsigned(u64),
}

impl<'a> FieldValue<'a> {
    fn new(raw: &'a str, encoding: FieldEncoding) -> Self {
        match encoding {
            FieldEncoding::Text => FieldValue::Text(raw),
            // Counts are validated at parse time; fall back to text rather than drop data.
            FieldEncoding::Integer => raw
                .parse()
                .map(FieldValue::Unsigned)
                .unwrap_or(FieldValue::Text(raw)),
        }
    }
}

/// Renders a batch as a newline-separated line-protocol body.
///
/// Points without a timestamp are written without one and get server time.
/// Points without fields cannot be expressed and are skipped.
pub fn render_batch(batch: &Batch, encoding: FieldEncoding) -> Vec<u8> {
    let mut builder = LineProtocolBuilder::new();

    for point in batch.points() {
        let Some(((first_key, first_value), fields)) = point.fields.split_first() else {
            warn!(
                measurement = %point.measurement,
                tags = ?point.tags,
                "skipping point without fields"
            );
            continue;
        };

        let mut line = builder.measurement(&point.measurement);
        for (key, value) in &point.tags {
            line = line.tag(key, value);
        }

        let mut line = match FieldValue::new(first_value, encoding) {
            FieldValue::Text(s) => line.field(first_key, s),
            FieldValue::Unsigned(u) => line.field(first_key, u),
        };
        for (key, value) in fields {
            line = match FieldValue::new(value, encoding) {
                FieldValue::Text(s) => line.field(key, s),
                FieldValue::Unsigned(u) => line.field(key, u),
            };
        }

        builder = match point.timestamp {
            Some(ts) => line.timestamp(ts).close_line(),
            None => line.close_line(),
        };
    }

    builder.build()
}
