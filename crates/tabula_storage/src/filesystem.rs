//! Filesystem-based image storage.

use crate::{ImageStorage, StoredImage, unique_filename};
use std::path::{Path, PathBuf};
use tabula_core::StorageBackendKind;
use tabula_error::{StorageError, StorageErrorKind, TabulaResult};

/// Attempts at finding an unused filename before giving up.
const MAX_NAME_ATTEMPTS: usize = 4;

/// Local filesystem backend.
///
/// Writes `{media_root}/{prefix}/{token}.{ext}` and reports the URL
/// `{media_url}{prefix}/{token}.{ext}` together with the relative path.
///
/// # Example Structure
///
/// ```text
/// media/
/// └── images/
///     ├── 3f2a9c...e1.png
///     └── 7b04d1...9c.JPG
/// ```
#[derive(Debug, Clone)]
pub struct FileSystemStorage {
    media_root: PathBuf,
    media_url: String,
    prefix: String,
}

impl FileSystemStorage {
    /// Create a new filesystem storage backend.
    ///
    /// Creates the media root if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created.
    #[tracing::instrument(skip_all)]
    pub fn new(
        media_root: impl AsRef<Path>,
        media_url: impl Into<String>,
        prefix: impl Into<String>,
    ) -> TabulaResult<Self> {
        let media_root = media_root.as_ref().to_path_buf();

        std::fs::create_dir_all(&media_root).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                media_root.display(),
                e
            )))
        })?;

        tracing::info!(path = %media_root.display(), "Created filesystem storage");
        Ok(Self {
            media_root,
            media_url: media_url.into(),
            prefix: prefix.into().trim_matches('/').to_string(),
        })
    }

    /// Root directory files are written under.
    pub fn media_root(&self) -> &Path {
        &self.media_root
    }

    /// Relative path for a filename under the configured prefix.
    fn relative_path(&self, filename: &str) -> String {
        if self.prefix.is_empty() {
            filename.to_string()
        } else {
            format!("{}/{}", self.prefix, filename)
        }
    }

    /// Pick a relative path that does not exist yet.
    async fn free_relative_path(&self, original_filename: &str) -> TabulaResult<String> {
        for _ in 0..MAX_NAME_ATTEMPTS {
            let relative = self.relative_path(&unique_filename(original_filename));
            let candidate = self.media_root.join(&relative);
            let taken = tokio::fs::try_exists(&candidate).await.map_err(|e| {
                StorageError::new(StorageErrorKind::InvalidPath(format!(
                    "{}: {}",
                    candidate.display(),
                    e
                )))
            })?;
            if !taken {
                return Ok(relative);
            }
            tracing::debug!(path = %relative, "Generated filename already taken, retrying");
        }
        Err(StorageError::new(StorageErrorKind::InvalidPath(format!(
            "no free filename for {}",
            original_filename
        )))
        .into())
    }
}

#[async_trait::async_trait]
impl ImageStorage for FileSystemStorage {
    #[tracing::instrument(skip(self, data), fields(size = data.len()))]
    async fn store(
        &self,
        data: &[u8],
        original_filename: &str,
        content_type: &str,
    ) -> TabulaResult<StoredImage> {
        let relative = self.free_relative_path(original_filename).await?;
        let path = self.media_root.join(&relative);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        // Write to temp file first, then rename for atomicity
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, data).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        })?;

        if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(StorageError::new(StorageErrorKind::FileWrite(format!(
                "rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            )))
            .into());
        }

        let url = format!("{}{}", self.media_url, relative);

        tracing::info!(
            path = %relative,
            url = %url,
            size = data.len(),
            "Stored image file"
        );

        Ok(StoredImage::new(url, Some(relative), StorageBackendKind::Local))
    }

    fn backend(&self) -> StorageBackendKind {
        StorageBackendKind::Local
    }
}
