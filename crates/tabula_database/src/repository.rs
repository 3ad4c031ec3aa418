//! Repository traits.

use crate::DatabaseResult;
use tabula_core::{ExecutionRecord, ImageAsset, NewExecutionRecord, NewImageAsset, UserId};
use uuid::Uuid;

/// Storage of uploaded image assets.
#[async_trait::async_trait]
pub trait ImageRepository: Send + Sync {
    /// Find a user's asset by content checksum.
    async fn find_by_checksum(
        &self,
        user_id: UserId,
        checksum: &str,
    ) -> DatabaseResult<Option<ImageAsset>>;

    /// Find an asset by id.
    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<ImageAsset>>;

    /// Insert a new asset.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseErrorKind::UniqueViolation`](crate::DatabaseErrorKind::UniqueViolation)
    /// if the user already owns an asset with the same checksum.
    async fn insert(&self, new_asset: NewImageAsset) -> DatabaseResult<ImageAsset>;

    /// A user's assets, newest first.
    async fn list_for_user(&self, user_id: UserId, limit: usize) -> DatabaseResult<Vec<ImageAsset>>;
}

/// Storage of prompt execution records.
#[async_trait::async_trait]
pub trait ExecutionRepository: Send + Sync {
    /// Persist one execution.
    async fn record(&self, new_record: NewExecutionRecord) -> DatabaseResult<ExecutionRecord>;

    /// A user's most recent executions, newest first.
    async fn recent(&self, user_id: UserId, limit: usize) -> DatabaseResult<Vec<ExecutionRecord>>;
}
