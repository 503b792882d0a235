//! Decoding of CloudWatch Logs subscription payloads.
//!
//! A subscription delivers its log events as a base64 string wrapping a gzip
//! stream, which in turn wraps a JSON document of the form
//! `{"logEvents": [{"message": "..."}, ...]}`.

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use std::io::Read;
use thiserror::Error;
use tracing::instrument;

/// Errors that make a whole batch unusable
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("No CloudWatch Logs data found in event")]
    InputMissing,

    #[error("Failed to base64-decode log batch: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Failed to decompress log batch: {0}")]
    Decompression(#[source] std::io::Error),

    #[error("Malformed log batch: {0}")]
    MalformedBatch(#[from] serde_json::Error),
}

/// Decoded CloudWatch Logs subscription batch.
///
/// Envelope metadata is kept untyped: it is only logged, and an unexpected
/// value must not reject the batch. Entries of `logEvents` stay raw until
/// each is turned into a [`LogRecord`] on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogBatch {
    /// DATA_MESSAGE or CONTROL_MESSAGE
    #[serde(default)]
    pub message_type: Option<serde_json::Value>,
    #[serde(default)]
    pub log_group: Option<serde_json::Value>,
    #[serde(default)]
    pub log_stream: Option<serde_json::Value>,
    /// Log events in arrival order
    pub log_events: Vec<serde_json::Value>,
    /// owner, subscriptionFilters and anything else
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One log event from a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    /// Event time in milliseconds since the epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<serde_json::Value>,
    /// JSON-encoded message text
    #[serde(default)]
    pub message: serde_json::Value,
    /// Any other fields the producer attached
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl LogRecord {
    /// Record with only a message, as the transfer service emits them
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            id: None,
            timestamp: None,
            message: serde_json::Value::String(message.into()),
            extra: serde_json::Map::new(),
        }
    }

    /// Interpret one raw `logEvents` entry; only a JSON object qualifies
    pub fn from_value(value: &serde_json::Value) -> Result<Self, RecordShapeError> {
        if !value.is_object() {
            return Err(RecordShapeError(value.to_string()));
        }
        serde_json::from_value(value.clone()).map_err(|_| RecordShapeError(value.to_string()))
    }

    pub fn event_time(&self) -> Option<DateTime<Utc>> {
        self.timestamp
            .as_ref()
            .and_then(serde_json::Value::as_i64)
            .and_then(DateTime::from_timestamp_millis)
    }
}

/// A `logEvents` entry that is not a log event object
#[derive(Error, Debug)]
#[error("Log event is not a JSON object: {0}")]
pub struct RecordShapeError(pub String);

/// Decode a base64, gzip-compressed log batch
#[instrument(skip(encoded), fields(encoded_len = encoded.len()))]
pub fn decode_batch(encoded: &str) -> Result<LogBatch, BatchError> {
    let compressed = STANDARD.decode(encoded.trim())?;

    let mut payload = Vec::new();
    GzDecoder::new(compressed.as_slice())
        .read_to_end(&mut payload)
        .map_err(BatchError::Decompression)?;

    let batch: LogBatch = serde_json::from_slice(&payload)?;
    Ok(batch)
}

/// Encode a JSON document the way CloudWatch Logs delivers it
#[cfg(test)]
pub(crate) fn encode_batch(json: &str) -> String {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(json.as_bytes()).unwrap();
    STANDARD.encode(encoder.finish().unwrap())
}
