//! Transfer Archiver
//!
//! Archives files downloaded through AWS Transfer Family. The service receives
//! CloudWatch Logs subscription batches, picks out log events that carry a
//! `bytes-out` field, and moves the downloaded S3 object under the `archive/`
//! prefix of its own bucket (copy, then delete the original).
//!
//! ## Architecture
//!
//! ```text
//! awslogs.data        ┌──────────────┐     ┌──────────────┐
//! (base64 + gzip) ───▶│ Batch        │────▶│ Event        │
//!                     │ Decoder      │     │ Processor    │
//!                     └──────────────┘     └──────────────┘
//!                                                 │ per record
//!                          ┌──────────────────────┼──────────────────┐
//!                          ▼                      ▼                  ▼
//!                   ┌──────────────┐      ┌──────────────┐   ┌──────────────┐
//!                   │ Classifier   │─────▶│ Path         │──▶│ Archiver     │
//!                   │ (bytes-out)  │      │ Extractor    │   │ copy+delete  │
//!                   └──────────────┘      └──────────────┘   └──────────────┘
//!                                                                   │
//!                                                                   ▼
//!                                                            ┌──────────────┐
//!                                                            │ S3           │
//!                                                            └──────────────┘
//! ```
//!
//! A batch that cannot be decoded is rejected as a whole. Once decoded, each
//! record is processed on its own: a failure is logged with the record and the
//! next record proceeds.

pub mod api;
pub mod archiver;
pub mod batch_decoder;
pub mod classifier;
pub mod config;
pub mod invocation;
pub mod object_store;
pub mod path_extractor;
pub mod processor;

pub use archiver::{ArchiveError, ArchivedObject, Archiver};
pub use batch_decoder::{decode_batch, BatchError, LogBatch, LogRecord, RecordShapeError};
pub use classifier::{classify, BytesOut, Classification, ClassifyError, TransferMessage};
pub use config::Config;
pub use invocation::{handle_invocation, InvocationEvent, InvocationResponse};
pub use object_store::{ObjectStore, S3ObjectStore, StoreError};
pub use path_extractor::{extract_location, parse_path, Location};
pub use processor::{BatchSummary, EventProcessor, RecordError, RecordOutcome};
