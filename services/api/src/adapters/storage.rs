//! services/api/src/adapters/storage.rs
//!
//! S3-backed implementation of the `ObjectStorageService` port.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use tracing::debug;

use crate::config::Config;
use gramseva_core::ports::{ObjectStorageService, PortError, PortResult, StoredObject};

pub struct S3Storage {
    client: aws_sdk_s3::Client,
    region: String,
    public_url_base: Option<String>,
}

impl S3Storage {
    /// Builds a client from the ambient AWS environment (credentials chain,
    /// region overrides, endpoint URLs for S3-compatible stores).
    pub async fn from_env(config: &Config) -> Self {
        let aws_config = aws_config::load_from_env().await;
        Self {
            client: aws_sdk_s3::Client::new(&aws_config),
            region: config.s3_region.clone(),
            public_url_base: config.s3_public_url_base.clone(),
        }
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        match &self.public_url_base {
            Some(base) => format!("{}/{}/{}", base.trim_end_matches('/'), bucket, key),
            None => format!("https://{bucket}.s3.{}.amazonaws.com/{key}", self.region),
        }
    }
}

#[async_trait]
impl ObjectStorageService for S3Storage {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> PortResult<StoredObject> {
        debug!(bucket, key, size = bytes.len(), "uploading object");
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("object upload failed: {e}")))?;

        Ok(StoredObject {
            url: self.public_url(bucket, key),
            path: key.to_string(),
        })
    }
}
