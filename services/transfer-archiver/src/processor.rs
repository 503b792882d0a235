use crate::archiver::{ArchiveError, ArchivedObject, Archiver};
use crate::batch_decoder::{decode_batch, BatchError, LogRecord, RecordShapeError};
use crate::classifier::{classify, Classification, ClassifyError};
use crate::path_extractor::extract_location;
use thiserror::Error;
use tracing::{debug, error, info, instrument};

/// Errors confined to a single log record
#[derive(Error, Debug)]
pub enum RecordError {
    #[error(transparent)]
    Shape(#[from] RecordShapeError),

    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

/// What happened to one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Archived(ArchivedObject),
    /// Message carried no `bytes-out` key
    NotTransferOut,
    /// Transfer-out event whose path did not yield a bucket and key
    NoLocation,
}

/// Result of processing one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    /// Number of records seen, whatever their outcome
    pub processed: usize,
}

#[derive(Debug, Default)]
struct OutcomeCounts {
    archived: usize,
    skipped: usize,
    failed: usize,
}

/// Runs decoded log batches through classification and archival
pub struct EventProcessor {
    archiver: Archiver,
}

impl EventProcessor {
    pub fn new(archiver: Archiver) -> Self {
        Self { archiver }
    }

    /// Decode and process a whole batch.
    ///
    /// Decode failures abort before any record is touched. Record failures are
    /// logged and never stop the remaining records.
    #[instrument(skip(self, encoded))]
    pub async fn process_batch(&self, encoded: &str) -> Result<BatchSummary, BatchError> {
        metrics::counter!("archiver.batches.received").increment(1);

        let batch = decode_batch(encoded).map_err(|e| {
            error!(error = %e, "Failed to decode log batch");
            metrics::counter!("archiver.batches.rejected").increment(1);
            e
        })?;

        info!(
            log_group = ?batch.log_group,
            log_stream = ?batch.log_stream,
            events = batch.log_events.len(),
            "Decoded log batch"
        );

        let mut counts = OutcomeCounts::default();

        for (index, entry) in batch.log_events.iter().enumerate() {
            metrics::counter!("archiver.records.processed").increment(1);

            match self.process_entry(entry).await {
                Ok(RecordOutcome::Archived(archived)) => {
                    counts.archived += 1;
                    metrics::counter!("archiver.records.archived").increment(1);
                    info!(
                        index,
                        bucket = %archived.bucket,
                        source_key = %archived.source_key,
                        archive_key = %archived.archive_key,
                        "Log event archived"
                    );
                }
                Ok(outcome) => {
                    counts.skipped += 1;
                    metrics::counter!("archiver.records.skipped").increment(1);
                    debug!(index, outcome = ?outcome, "Log event skipped");
                }
                Err(e) => {
                    counts.failed += 1;
                    metrics::counter!("archiver.records.failed").increment(1);
                    error!(
                        index,
                        error = %e,
                        log_event = %entry,
                        "Failed to process log event"
                    );
                }
            }
        }

        info!(
            processed = batch.log_events.len(),
            archived = counts.archived,
            skipped = counts.skipped,
            failed = counts.failed,
            "Finished processing log batch"
        );

        Ok(BatchSummary {
            processed: batch.log_events.len(),
        })
    }

    /// Process one raw `logEvents` entry
    pub async fn process_entry(
        &self,
        entry: &serde_json::Value,
    ) -> Result<RecordOutcome, RecordError> {
        let record = LogRecord::from_value(entry)?;
        self.process_record(&record).await
    }

    /// Classify one record and archive it if it is a download
    pub async fn process_record(&self, record: &LogRecord) -> Result<RecordOutcome, RecordError> {
        info!(
            message = %record.message,
            event_time = ?record.event_time(),
            "Processing log message"
        );

        let message = match classify(record)? {
            Classification::Relevant(message) => message,
            Classification::Irrelevant => return Ok(RecordOutcome::NotTransferOut),
        };

        let Some(location) = extract_location(&message) else {
            info!(path = ?message.path, "Transfer-out event has no usable location");
            return Ok(RecordOutcome::NoLocation);
        };

        let archived = self.archiver.archive(&location).await?;
        Ok(RecordOutcome::Archived(archived))
    }
}
