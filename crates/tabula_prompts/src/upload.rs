//! Deduplicating image upload handler.

use std::sync::Arc;
use tabula_core::{ImageAsset, NewImageAsset, UserId};
use tabula_database::ImageRepository;
use tabula_error::TabulaResult;
use tabula_storage::{ImageStorage, ImageValidator, UploadedFile, compute_hash};
use tracing::{debug, info, instrument, warn};

/// Message returned when the user already uploaded the same content.
pub const DUPLICATE_MESSAGE: &str = "ALREADY EXISTS";

/// Message returned after a fresh upload.
pub const UPLOADED_MESSAGE: &str = "Image uploaded successfully";

/// Outcome of one upload.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct ImageUploadResult {
    /// The stored or reused asset
    asset: ImageAsset,
    /// Whether an existing asset was returned instead of storing again
    is_duplicate: bool,
    /// Informational message
    message: String,
}

impl ImageUploadResult {
    fn duplicate(asset: ImageAsset) -> Self {
        Self {
            asset,
            is_duplicate: true,
            message: DUPLICATE_MESSAGE.to_string(),
        }
    }

    fn uploaded(asset: ImageAsset) -> Self {
        Self {
            asset,
            is_duplicate: false,
            message: UPLOADED_MESSAGE.to_string(),
        }
    }
}

/// Validates, hashes and stores uploads, at most once per `(user, content)`.
#[derive(Clone)]
pub struct ImageUploadHandler {
    validator: ImageValidator,
    storage: Arc<dyn ImageStorage>,
    images: Arc<dyn ImageRepository>,
}

impl std::fmt::Debug for ImageUploadHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUploadHandler")
            .field("validator", &self.validator)
            .field("backend", &self.storage.backend())
            .finish()
    }
}

impl ImageUploadHandler {
    /// Create a handler.
    pub fn new(
        validator: ImageValidator,
        storage: Arc<dyn ImageStorage>,
        images: Arc<dyn ImageRepository>,
    ) -> Self {
        Self {
            validator,
            storage,
            images,
        }
    }

    /// Limits applied to uploads.
    pub fn validator(&self) -> &ImageValidator {
        &self.validator
    }

    /// Validate, deduplicate and store one upload.
    ///
    /// Validation failures propagate unchanged. When the user already owns an
    /// asset with the same content hash it is returned with `is_duplicate` set
    /// and nothing is written. A concurrent upload of the same content that wins
    /// the insert race is also reported as a duplicate.
    ///
    /// # Errors
    ///
    /// Returns validation, storage or database errors.
    #[instrument(skip(self, file), fields(user_id = %user_id, filename = %file.filename(), size = file.size()))]
    pub async fn handle_upload(
        &self,
        user_id: UserId,
        file: &UploadedFile,
    ) -> TabulaResult<ImageUploadResult> {
        debug!("Validating image");
        self.validator.validate(file)?;

        let checksum = compute_hash(file.data());
        debug!(checksum = %&checksum[..16], "Computed image hash");

        if let Some(existing) = self.images.find_by_checksum(user_id, &checksum).await? {
            info!(image_id = %existing.id(), "Duplicate image found");
            return Ok(ImageUploadResult::duplicate(existing));
        }

        debug!(backend = %self.storage.backend(), "Uploading image to configured storage");
        let stored = self
            .storage
            .store(file.data(), file.filename(), file.content_type())
            .await?;

        let new_asset = NewImageAsset {
            user_id,
            checksum: checksum.clone(),
            original_filename: file.filename().clone(),
            image_url: stored.url().clone(),
            file_path: stored.local_path().clone(),
        };

        match self.images.insert(new_asset).await {
            Ok(asset) => {
                info!(image_id = %asset.id(), "New image uploaded");
                Ok(ImageUploadResult::uploaded(asset))
            }
            Err(e) if e.is_unique_violation() => {
                warn!(
                    url = %stored.url(),
                    "Concurrent upload of identical content, returning existing asset"
                );
                match self.images.find_by_checksum(user_id, &checksum).await? {
                    Some(existing) => Ok(ImageUploadResult::duplicate(existing)),
                    None => Err(e.into()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// A user's uploaded images, newest first.
    ///
    /// # Errors
    ///
    /// Returns database errors.
    #[instrument(skip(self))]
    pub async fn user_images(&self, user_id: UserId, limit: usize) -> TabulaResult<Vec<ImageAsset>> {
        Ok(self.images.list_for_user(user_id, limit).await?)
    }
}
