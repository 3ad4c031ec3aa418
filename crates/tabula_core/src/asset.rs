//! Uploaded image assets.

use crate::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored image owned by one user.
///
/// The pair `(user_id, checksum)` is unique: a user never owns two assets with
/// identical content. Assets are never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_getters::Getters)]
pub struct ImageAsset {
    /// Unique identifier
    id: Uuid,
    /// Owning user
    user_id: UserId,
    /// Hex SHA-256 of the raw bytes
    checksum: String,
    /// Filename as uploaded
    original_filename: String,
    /// Retrievable URL
    image_url: String,
    /// Relative storage path, local backend only
    file_path: Option<String>,
    /// Creation timestamp
    created_at: DateTime<Utc>,
}

impl ImageAsset {
    /// Materialise an asset from a pending insert.
    pub fn from_new(id: Uuid, new: NewImageAsset, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: new.user_id,
            checksum: new.checksum,
            original_filename: new.original_filename,
            image_url: new.image_url,
            file_path: new.file_path,
            created_at,
        }
    }

    /// Rebuild an asset from persisted columns.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: Uuid,
        user_id: UserId,
        checksum: String,
        original_filename: String,
        image_url: String,
        file_path: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            checksum,
            original_filename,
            image_url,
            file_path,
            created_at,
        }
    }

    /// URL to show for this image.
    ///
    /// Uses the stored URL, falling back to `media_url` joined with the local
    /// path when the URL is blank.
    ///
    /// ```
    /// use tabula_core::{ImageAsset, NewImageAsset, UserId};
    /// use uuid::Uuid;
    ///
    /// let new = NewImageAsset::builder()
    ///     .user_id(UserId::new(1))
    ///     .checksum("ab".repeat(32))
    ///     .original_filename("cat.png")
    ///     .image_url("")
    ///     .file_path(Some("images/x.png".to_string()))
    ///     .build()
    ///     .unwrap();
    /// let asset = ImageAsset::from_new(Uuid::new_v4(), new, chrono::Utc::now());
    /// assert_eq!(asset.preview_url("/media/").as_deref(), Some("/media/images/x.png"));
    /// ```
    pub fn preview_url(&self, media_url: &str) -> Option<String> {
        if !self.image_url.trim().is_empty() {
            return Some(self.image_url.clone());
        }
        self.file_path
            .as_ref()
            .map(|path| format!("{}{}", media_url, path))
    }
}

/// Insertable image asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_builder::Builder)]
#[builder(setter(into))]
pub struct NewImageAsset {
    /// Owning user
    pub user_id: UserId,
    /// Hex SHA-256 of the raw bytes
    pub checksum: String,
    /// Filename as uploaded
    #[builder(default)]
    pub original_filename: String,
    /// Retrievable URL
    pub image_url: String,
    /// Relative storage path, local backend only
    #[builder(default)]
    pub file_path: Option<String>,
}

impl NewImageAsset {
    /// Creates a new builder for `NewImageAsset`.
    pub fn builder() -> NewImageAssetBuilder {
        NewImageAssetBuilder::default()
    }
}
