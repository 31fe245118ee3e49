//! Storage backend abstraction for answer file uploads.
//!
//! Supports multiple backends:
//! - `local`: Local filesystem storage
//! - `s3`: S3-compatible object storage (MinIO, AWS S3, etc.)
//!
//! Objects are content addressed: the key of an upload is derived from the
//! blake3 hash of its bytes, so identical files share one object.

pub mod local;
pub mod s3;

use crate::app_config::StorageConfig;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

/// Storage operation errors.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error
    Io(std::io::Error),
    /// S3 error
    S3(String),
    /// Backend misconfigured
    Config(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "I/O error: {}", e),
            StorageError::S3(msg) => write!(f, "S3 error: {}", msg),
            StorageError::Config(msg) => write!(f, "Storage configuration error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}

/// Trait for storage backends.
///
/// All storage backends must implement this trait to provide
/// a unified interface for file storage operations.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store an object under `key`, e.g. `answers/3f/3f9a…c1.pdf`.
    async fn put_object(
        &self,
        data: Vec<u8>,
        key: &str,
        content_type: Option<&str>,
    ) -> Result<(), StorageError>;

    /// Check if an object exists.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Public reference a stored object is served from.
    fn public_url(&self, key: &str) -> String;
}

/// Key for an upload: `{folder}/{hash[0:2]}/{hash}{ext}`.
pub fn object_key(folder: &str, data: &[u8], extension: Option<&str>) -> String {
    let hash = blake3::hash(data).to_hex();
    let folder = folder.trim_matches('/');
    let prefix = &hash[0..2];
    let ext = extension.unwrap_or("");

    if folder.is_empty() {
        format!("{}/{}{}", prefix, hash, ext)
    } else {
        format!("{}/{}/{}{}", folder, prefix, hash, ext)
    }
}

/// Stores a file under `folder` and returns its public reference.
/// Content already present is not uploaded twice.
pub async fn store_file(
    backend: &dyn StorageBackend,
    folder: &str,
    data: Vec<u8>,
    extension: Option<&str>,
    content_type: Option<&str>,
) -> Result<String, StorageError> {
    let key = object_key(folder, &data, extension);

    if backend.exists(&key).await? {
        log::debug!("store_file: {} already stored", key);
    } else {
        backend.put_object(data, &key, content_type).await?;
    }

    Ok(backend.public_url(&key))
}

/// Builds the backend named in the storage configuration.
pub fn from_config(config: &StorageConfig) -> Result<Arc<dyn StorageBackend>, StorageError> {
    match config.backend.as_str() {
        "local" => Ok(Arc::new(local::LocalStorage::new(
            PathBuf::from(&config.local_path),
            config.local_url_prefix.clone(),
        )?)),
        "s3" => Ok(Arc::new(s3::S3Storage::from_config(config)?)),
        other => Err(StorageError::Config(format!(
            "unknown storage backend '{}'",
            other
        ))),
    }
}
