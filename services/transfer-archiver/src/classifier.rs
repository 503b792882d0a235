use crate::batch_decoder::LogRecord;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// Key whose presence marks a file download in Transfer Family logs
pub const BYTES_OUT_FIELD: &str = "bytes-out";

/// Key carrying the `/bucket/key` path of the transferred file
pub const PATH_FIELD: &str = "path";

/// Errors raised while interpreting a single record
#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("Log message is not valid JSON: {0}")]
    MessageParse(#[from] serde_json::Error),

    #[error("Log message is not a JSON object: {0}")]
    NotAnObject(String),

    #[error("Log message is not a JSON-encoded string: {0}")]
    NotAString(String),
}

/// Whether a message carried the `bytes-out` key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BytesOut {
    Present,
    Absent,
}

/// Parsed Transfer Family log message
#[derive(Debug, Clone)]
pub struct TransferMessage {
    pub bytes_out: BytesOut,
    /// Raw `path` value, if any; not guaranteed to be a string
    pub path: Option<Value>,
    pub fields: Map<String, Value>,
}

impl TransferMessage {
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        let bytes_out = if fields.contains_key(BYTES_OUT_FIELD) {
            BytesOut::Present
        } else {
            BytesOut::Absent
        };
        let path = fields.get(PATH_FIELD).cloned();

        Self {
            bytes_out,
            path,
            fields,
        }
    }

    /// Parse a message body
    pub fn parse(text: &str) -> Result<Self, ClassifyError> {
        match serde_json::from_str::<Value>(text)? {
            Value::Object(fields) => Ok(Self::from_fields(fields)),
            other => Err(ClassifyError::NotAnObject(other.to_string())),
        }
    }

    pub fn is_transfer_out(&self) -> bool {
        self.bytes_out == BytesOut::Present
    }
}

/// Classification of a log record
#[derive(Debug, Clone)]
pub enum Classification {
    /// A file download that should be archived
    Relevant(TransferMessage),
    Irrelevant,
}

/// Classify a record by the presence of `bytes-out` in its message.
///
/// The byte count itself is never inspected: partial or failed downloads
/// that still report `bytes-out` are treated as completed transfers.
pub fn classify(record: &LogRecord) -> Result<Classification, ClassifyError> {
    let message = match &record.message {
        Value::String(text) => TransferMessage::parse(text)?,
        // A missing message behaves like an empty one
        Value::Null => TransferMessage::parse("")?,
        other => return Err(ClassifyError::NotAString(other.to_string())),
    };

    if message.is_transfer_out() {
        debug!(path = ?message.path, "Message is a transfer-out event");
        Ok(Classification::Relevant(message))
    } else {
        debug!("Message is not a transfer-out event");
        Ok(Classification::Irrelevant)
    }
}
