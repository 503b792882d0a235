use crate::config::ArchiveConfig;
use crate::object_store::{ObjectStore, StoreError};
use crate::path_extractor::Location;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Errors from relocating an object into the archive prefix
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Failed to copy {bucket}/{key} to {bucket}/{archive_key}: {source}")]
    Copy {
        bucket: String,
        key: String,
        archive_key: String,
        #[source]
        source: StoreError,
    },

    /// The archived copy exists but the original could not be removed
    #[error("Archived {bucket}/{key} to {archive_key} but failed to delete the original: {source}")]
    Delete {
        bucket: String,
        key: String,
        archive_key: String,
        #[source]
        source: StoreError,
    },
}

/// Result of a completed relocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedObject {
    pub bucket: String,
    pub source_key: String,
    pub archive_key: String,
}

/// Moves objects under the archive prefix of their own bucket
pub struct Archiver {
    store: Arc<dyn ObjectStore>,
    prefix: String,
}

impl Archiver {
    pub fn new(store: Arc<dyn ObjectStore>, config: &ArchiveConfig) -> Self {
        Self {
            store,
            prefix: config.prefix.clone(),
        }
    }

    /// Archive key for `key`: the prefix followed by the key verbatim
    pub fn archive_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Copy the object to its archive key, then delete the original.
    ///
    /// The two steps are not atomic. If the delete fails the object exists
    /// under both keys and the error says so; the copy is left in place.
    #[instrument(skip(self), fields(bucket = %location.bucket, key = %location.key))]
    pub async fn archive(&self, location: &Location) -> Result<ArchivedObject, ArchiveError> {
        let bucket = &location.bucket;
        let key = &location.key;
        let archive_key = self.archive_key(key);

        info!(
            source = %format!("{}/{}", bucket, key),
            destination = %format!("{}/{}", bucket, archive_key),
            "Copying object to archive"
        );

        self.store
            .copy_object(bucket, key, &archive_key)
            .await
            .map_err(|source| ArchiveError::Copy {
                bucket: bucket.clone(),
                key: key.clone(),
                archive_key: archive_key.clone(),
                source,
            })?;

        info!(archive_key = %archive_key, "Object copied to archive");

        if let Err(source) = self.store.delete_object(bucket, key).await {
            warn!(
                bucket = %bucket,
                key = %key,
                archive_key = %archive_key,
                error = %source,
                "Object archived but original was not deleted; both copies remain"
            );
            return Err(ArchiveError::Delete {
                bucket: bucket.clone(),
                key: key.clone(),
                archive_key,
                source,
            });
        }

        info!(key = %key, "Source object deleted");

        Ok(ArchivedObject {
            bucket: bucket.clone(),
            source_key: key.clone(),
            archive_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_store::MockObjectStore;
    use mockall::predicate::eq;
    use mockall::Sequence;

    fn location(bucket: &str, key: &str) -> Location {
        Location {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    }

    fn archiver(store: MockObjectStore) -> Archiver {
        Archiver::new(Arc::new(store), &ArchiveConfig::default())
    }

    #[test]
    fn test_archive_key_preserves_relative_path() {
        let archiver = archiver(MockObjectStore::new());
        assert_eq!(archiver.archive_key("dir/file.txt"), "archive/dir/file.txt");
    }

    #[test]
    fn test_archive_key_custom_prefix() {
        let archiver = Archiver::new(
            Arc::new(MockObjectStore::new()),
            &ArchiveConfig {
                prefix: "downloaded/".to_string(),
            },
        );
        assert_eq!(archiver.archive_key("a.txt"), "downloaded/a.txt");
    }

    #[tokio::test]
    async fn test_copy_then_delete_in_same_bucket() {
        let mut store = MockObjectStore::new();
        let mut seq = Sequence::new();

        store
            .expect_copy_object()
            .with(eq("bucket-a"), eq("dir/file.txt"), eq("archive/dir/file.txt"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
        store
            .expect_delete_object()
            .with(eq("bucket-a"), eq("dir/file.txt"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let archived = archiver(store)
            .archive(&location("bucket-a", "dir/file.txt"))
            .await
            .unwrap();

        assert_eq!(
            archived,
            ArchivedObject {
                bucket: "bucket-a".to_string(),
                source_key: "dir/file.txt".to_string(),
                archive_key: "archive/dir/file.txt".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_copy_failure_skips_delete() {
        let mut store = MockObjectStore::new();

        store
            .expect_copy_object()
            .times(1)
            .returning(|bucket, key, _| {
                Err(StoreError::NotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                })
            });
        store.expect_delete_object().never();

        let err = archiver(store)
            .archive(&location("b1", "missing.txt"))
            .await
            .unwrap_err();

        match err {
            ArchiveError::Copy { key, source, .. } => {
                assert_eq!(key, "missing.txt");
                assert!(matches!(source, StoreError::NotFound { .. }));
            }
            other => panic!("expected copy error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delete_failure_reports_partial_archive() {
        let mut store = MockObjectStore::new();

        store.expect_copy_object().times(1).returning(|_, _, _| Ok(()));
        store
            .expect_delete_object()
            .times(1)
            .returning(|_, _| Err(StoreError::Backend("AccessDenied".to_string())));

        let err = archiver(store)
            .archive(&location("b1", "a/f.txt"))
            .await
            .unwrap_err();

        match err {
            ArchiveError::Delete { archive_key, .. } => {
                assert_eq!(archive_key, "archive/a/f.txt");
            }
            other => panic!("expected delete error, got {other:?}"),
        }
    }
}
