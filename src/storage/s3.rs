//! S3-compatible storage backend.

use super::{StorageBackend, StorageError};
use crate::app_config::StorageConfig;
use async_trait::async_trait;
use rusoto_core::credential::StaticProvider;
use rusoto_core::{HttpClient, Region};
use rusoto_s3::{ListObjectsV2Request, PutObjectRequest, S3Client, S3};

/// S3-compatible storage backend.
pub struct S3Storage {
    s3: S3Client,
    bucket_name: String,
    pub pub_url: String,
}

impl S3Storage {
    /// Create a new S3 storage backend using the default credential chain.
    pub fn new(region: Region, bucket_name: String, pub_url: String) -> S3Storage {
        log::info!("S3Storage initialized for bucket: {}", bucket_name);

        S3Storage {
            s3: S3Client::new(region),
            bucket_name,
            pub_url: pub_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build from configuration. Static keys are used when both are set.
    pub fn from_config(config: &StorageConfig) -> Result<S3Storage, StorageError> {
        let region = Region::Custom {
            name: config.s3_region.clone(),
            endpoint: config.s3_endpoint.clone(),
        };

        if config.s3_access_key.is_empty() || config.s3_secret_key.is_empty() {
            return Ok(Self::new(
                region,
                config.s3_bucket.clone(),
                config.s3_public_url.clone(),
            ));
        }

        let client = HttpClient::new().map_err(|e| StorageError::Config(e.to_string()))?;
        let credentials = StaticProvider::new_minimal(
            config.s3_access_key.clone(),
            config.s3_secret_key.clone(),
        );

        log::info!("S3Storage initialized for bucket: {}", config.s3_bucket);
        Ok(S3Storage {
            s3: S3Client::new_with(client, credentials, region),
            bucket_name: config.s3_bucket.clone(),
            pub_url: config.s3_public_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl StorageBackend for S3Storage {
    async fn put_object(
        &self,
        data: Vec<u8>,
        key: &str,
        content_type: Option<&str>,
    ) -> Result<(), StorageError> {
        log::info!("S3Storage: put_object: {}", key);

        let put_request = PutObjectRequest {
            bucket: self.bucket_name.clone(),
            key: key.to_owned(),
            content_type: content_type.map(str::to_owned),
            body: Some(data.into()),
            ..Default::default()
        };

        self.s3
            .put_object(put_request)
            .await
            .map_err(|e| StorageError::S3(e.to_string()))?;

        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        log::debug!("S3Storage: exists: {}", key);

        // Using list_objects_v2 is reportedly faster than head_object
        // https://www.peterbe.com/plog/fastest-way-to-find-out-if-a-file-exists-in-s3
        let list_request = ListObjectsV2Request {
            bucket: self.bucket_name.clone(),
            prefix: Some(key.to_owned()),
            ..Default::default()
        };

        let result = self
            .s3
            .list_objects_v2(list_request)
            .await
            .map_err(|e| StorageError::S3(e.to_string()))?;

        let count = result.key_count.unwrap_or(0);
        Ok(count > 0)
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.pub_url, key)
    }
}
