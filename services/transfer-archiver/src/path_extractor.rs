use crate::classifier::TransferMessage;
use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};

/// Bucket and object key a transfer path points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub bucket: String,
    pub key: String,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Split a `/bucket/key...` path into a [`Location`].
///
/// Exactly one leading `/` is stripped; the rest is split on the first `/`.
/// Both halves must be non-empty.
pub fn parse_path(path: &str) -> Option<Location> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let (bucket, key) = trimmed.split_once('/')?;

    if bucket.is_empty() || key.is_empty() {
        return None;
    }

    Some(Location {
        bucket: bucket.to_string(),
        key: key.to_string(),
    })
}

/// Extract the archive location from a transfer message
pub fn extract_location(message: &TransferMessage) -> Option<Location> {
    let location = match &message.path {
        None => parse_path(""),
        Some(Value::String(path)) => parse_path(path),
        Some(other) => {
            warn!(
                path = %other,
                message = %serde_json::Value::Object(message.fields.clone()),
                "Transfer message path is not a string"
            );
            None
        }
    };

    match &location {
        Some(location) => debug!(bucket = %location.bucket, key = %location.key, "Extracted location"),
        None => debug!(path = ?message.path, "No location in transfer message"),
    }

    location
}
