//! Storage trait definition and backend selection.

use crate::{FileSystemStorage, S3Storage};
use std::sync::Arc;
use tabula_core::{StorageBackendKind, StorageConfig};
use tabula_error::TabulaResult;
use tracing::info;

/// Where a stored image landed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_getters::Getters)]
pub struct StoredImage {
    /// Retrievable URL
    url: String,
    /// Path relative to the media root, local backend only
    local_path: Option<String>,
    /// Backend that performed the write
    backend: StorageBackendKind,
}

impl StoredImage {
    /// Create a stored-image locator.
    pub fn new(url: impl Into<String>, local_path: Option<String>, backend: StorageBackendKind) -> Self {
        Self {
            url: url.into(),
            local_path,
            backend,
        }
    }
}

/// Trait for pluggable image storage backends.
///
/// Implementations write raw bytes under a fresh random filename and report
/// where they went. A failed call leaves nothing behind.
#[async_trait::async_trait]
pub trait ImageStorage: Send + Sync {
    /// Store image bytes.
    ///
    /// # Arguments
    ///
    /// * `data` - Raw image bytes
    /// * `original_filename` - Client filename; only its extension is kept
    /// * `content_type` - Declared MIME type
    async fn store(
        &self,
        data: &[u8],
        original_filename: &str,
        content_type: &str,
    ) -> TabulaResult<StoredImage>;

    /// Which backend this is.
    fn backend(&self) -> StorageBackendKind;
}

/// Build the backend selected in configuration.
///
/// # Errors
///
/// Returns error if the local media root cannot be created.
pub fn build_storage(config: &StorageConfig) -> TabulaResult<Arc<dyn ImageStorage>> {
    info!(backend = %config.backend, "Selecting storage backend");
    match config.backend {
        StorageBackendKind::Local => Ok(Arc::new(FileSystemStorage::new(
            &config.media_root,
            &config.media_url,
            &config.prefix,
        )?)),
        StorageBackendKind::S3 => Ok(Arc::new(S3Storage::new(
            config.s3.clone(),
            &config.prefix,
        ))),
    }
}
