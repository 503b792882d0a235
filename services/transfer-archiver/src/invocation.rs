//! Invocation payload and response for the archiver.
//!
//! The payload is the CloudWatch Logs subscription event,
//! `{"awslogs": {"data": "<base64 gzip json>"}}`; the response carries a
//! numeric status and a short human-readable body.

use crate::batch_decoder::BatchError;
use crate::processor::EventProcessor;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;

/// CloudWatch Logs subscription event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvocationEvent {
    #[serde(default)]
    pub awslogs: Option<AwsLogs>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AwsLogs {
    #[serde(default)]
    pub data: Option<String>,
}

impl InvocationEvent {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            awslogs: Some(AwsLogs {
                data: Some(data.into()),
            }),
        }
    }

    /// Encoded batch, if present and non-empty
    pub fn data(&self) -> Option<&str> {
        self.awslogs
            .as_ref()
            .and_then(|logs| logs.data.as_deref())
            .filter(|data| !data.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    pub status_code: u16,
    pub body: String,
}

impl InvocationResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status_code: STATUS_OK,
            body: body.into(),
        }
    }

    pub fn bad_request(body: impl Into<String>) -> Self {
        Self {
            status_code: STATUS_BAD_REQUEST,
            body: body.into(),
        }
    }
}

/// Run one invocation end to end
#[instrument(skip(processor, event))]
pub async fn handle_invocation(
    processor: &EventProcessor,
    event: &InvocationEvent,
) -> InvocationResponse {
    let Some(data) = event.data() else {
        error!("No CloudWatch Logs data found in event");
        return InvocationResponse::bad_request(BatchError::InputMissing.to_string());
    };

    match processor.process_batch(data).await {
        Ok(summary) => {
            info!(processed = summary.processed, "Invocation complete");
            InvocationResponse::ok(format!("processed {} log events", summary.processed))
        }
        Err(e) => InvocationResponse::bad_request(e.to_string()),
    }
}
