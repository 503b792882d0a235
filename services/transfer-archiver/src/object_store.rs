use crate::config::S3Config;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Builder as S3ConfigBuilder;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::Client as S3Client;
use aws_types::region::Region;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Errors reported by the storage backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Copy and delete primitives within a single bucket
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Copy `source_key` to `dest_key` inside `bucket`
    async fn copy_object(
        &self,
        bucket: &str,
        source_key: &str,
        dest_key: &str,
    ) -> Result<(), StoreError>;

    /// Delete `key` from `bucket`
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError>;
}

/// [`ObjectStore`] backed by Amazon S3
pub struct S3ObjectStore {
    client: S3Client,
}

impl S3ObjectStore {
    /// Build an S3 client from the default credential chain
    pub async fn new(config: &S3Config) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(ref region) = config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let aws_config = loader.load().await;

        let mut s3_config_builder = S3ConfigBuilder::from(&aws_config);

        // Configure custom endpoint for MinIO/LocalStack
        if let Some(ref endpoint_url) = config.endpoint_url {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint_url);
        }

        if config.force_path_style {
            s3_config_builder = s3_config_builder.force_path_style(true);
        }

        let client = S3Client::from_conf(s3_config_builder.build());

        info!(
            region = ?aws_config.region(),
            endpoint_url = ?config.endpoint_url,
            "S3 object store initialized"
        );

        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[instrument(skip(self))]
    async fn copy_object(
        &self,
        bucket: &str,
        source_key: &str,
        dest_key: &str,
    ) -> Result<(), StoreError> {
        self.client
            .copy_object()
            .bucket(bucket)
            .key(dest_key)
            .copy_source(encode_copy_source(bucket, source_key))
            .send()
            .await
            .map_err(|e| match e.code() {
                Some("NoSuchKey") | Some("NotFound") => StoreError::NotFound {
                    bucket: bucket.to_string(),
                    key: source_key.to_string(),
                },
                _ => StoreError::Backend(DisplayErrorContext(&e).to_string()),
            })?;

        debug!(bucket, source_key, dest_key, "Object copied");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StoreError::Backend(DisplayErrorContext(&e).to_string()))?;

        debug!(bucket, key, "Object deleted");
        Ok(())
    }
}

/// Build the `x-amz-copy-source` value: `bucket/key` with the key URL-encoded
fn encode_copy_source(bucket: &str, key: &str) -> String {
    let mut encoded = String::with_capacity(bucket.len() + key.len() + 1);
    encoded.push_str(bucket);
    encoded.push('/');

    for byte in key.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }

    encoded
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    /// Storage call observed by [`InMemoryObjectStore`]
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum StoreCall {
        Copy {
            bucket: String,
            source_key: String,
            dest_key: String,
        },
        Delete {
            bucket: String,
            key: String,
        },
    }

    /// Object store holding keys in memory and recording every call
    #[derive(Default)]
    pub struct InMemoryObjectStore {
        objects: Mutex<HashSet<(String, String)>>,
        calls: Mutex<Vec<StoreCall>>,
        failing_deletes: Mutex<HashMap<String, String>>,
    }

    impl InMemoryObjectStore {
        pub fn with_objects(objects: &[(&str, &str)]) -> Self {
            let store = Self::default();
            {
                let mut set = store.objects.lock().unwrap();
                for (bucket, key) in objects {
                    set.insert((bucket.to_string(), key.to_string()));
                }
            }
            store
        }

        /// Make deletes of `key` fail with a backend error
        pub fn fail_delete(&self, key: &str) {
            self.failing_deletes
                .lock()
                .unwrap()
                .insert(key.to_string(), "AccessDenied".to_string());
        }

        pub fn contains(&self, bucket: &str, key: &str) -> bool {
            self.objects
                .lock()
                .unwrap()
                .contains(&(bucket.to_string(), key.to_string()))
        }

        pub fn calls(&self) -> Vec<StoreCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ObjectStore for InMemoryObjectStore {
        async fn copy_object(
            &self,
            bucket: &str,
            source_key: &str,
            dest_key: &str,
        ) -> Result<(), StoreError> {
            self.calls.lock().unwrap().push(StoreCall::Copy {
                bucket: bucket.to_string(),
                source_key: source_key.to_string(),
                dest_key: dest_key.to_string(),
            });

            let mut objects = self.objects.lock().unwrap();
            if !objects.contains(&(bucket.to_string(), source_key.to_string())) {
                return Err(StoreError::NotFound {
                    bucket: bucket.to_string(),
                    key: source_key.to_string(),
                });
            }
            objects.insert((bucket.to_string(), dest_key.to_string()));
            Ok(())
        }

        async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
            self.calls.lock().unwrap().push(StoreCall::Delete {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });

            if let Some(code) = self.failing_deletes.lock().unwrap().get(key) {
                return Err(StoreError::Backend(code.clone()));
            }
            self.objects
                .lock()
                .unwrap()
                .remove(&(bucket.to_string(), key.to_string()));
            Ok(())
        }
    }
}
