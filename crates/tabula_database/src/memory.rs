//! In-process repositories.

use crate::{DatabaseError, DatabaseErrorKind, DatabaseResult, ExecutionRepository, ImageRepository};
use chrono::Utc;
use tabula_core::{ExecutionRecord, ImageAsset, NewExecutionRecord, NewImageAsset, UserId};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Repository keeping assets and executions in memory.
///
/// Enforces the same `(user, checksum)` uniqueness as the database schema.
/// Rows are kept in insertion order so ties on `created_at` still list newest first.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    images: RwLock<Vec<ImageAsset>>,
    executions: RwLock<Vec<ExecutionRecord>>,
}

impl InMemoryRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored assets.
    pub async fn image_count(&self) -> usize {
        self.images.read().await.len()
    }

    /// Number of stored executions.
    pub async fn execution_count(&self) -> usize {
        self.executions.read().await.len()
    }
}

#[async_trait::async_trait]
impl ImageRepository for InMemoryRepository {
    async fn find_by_checksum(
        &self,
        user_id: UserId,
        checksum: &str,
    ) -> DatabaseResult<Option<ImageAsset>> {
        Ok(self
            .images
            .read()
            .await
            .iter()
            .find(|a| *a.user_id() == user_id && a.checksum() == checksum)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<ImageAsset>> {
        Ok(self.images.read().await.iter().find(|a| *a.id() == id).cloned())
    }

    #[instrument(skip(self, new_asset), fields(user_id = %new_asset.user_id))]
    async fn insert(&self, new_asset: NewImageAsset) -> DatabaseResult<ImageAsset> {
        let mut images = self.images.write().await;
        if images
            .iter()
            .any(|a| *a.user_id() == new_asset.user_id && *a.checksum() == new_asset.checksum)
        {
            debug!("Rejected duplicate asset insert");
            return Err(DatabaseError::new(DatabaseErrorKind::UniqueViolation(
                "image_assets_user_checksum_key".to_string(),
            )));
        }

        let asset = ImageAsset::from_new(Uuid::new_v4(), new_asset, Utc::now());
        info!(id = %asset.id(), "Inserted image asset");
        images.push(asset.clone());
        Ok(asset)
    }

    async fn list_for_user(&self, user_id: UserId, limit: usize) -> DatabaseResult<Vec<ImageAsset>> {
        Ok(self
            .images
            .read()
            .await
            .iter()
            .rev()
            .filter(|a| *a.user_id() == user_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[async_trait::async_trait]
impl ExecutionRepository for InMemoryRepository {
    #[instrument(skip(self, new_record), fields(user_id = %new_record.user_id, status = %new_record.status))]
    async fn record(&self, new_record: NewExecutionRecord) -> DatabaseResult<ExecutionRecord> {
        let record = ExecutionRecord::from_new(Uuid::new_v4(), new_record, Utc::now());
        info!(id = %record.id(), "Recorded prompt execution");
        self.executions.write().await.push(record.clone());
        Ok(record)
    }

    async fn recent(&self, user_id: UserId, limit: usize) -> DatabaseResult<Vec<ExecutionRecord>> {
        Ok(self
            .executions
            .read()
            .await
            .iter()
            .rev()
            .filter(|r| *r.user_id() == user_id)
            .take(limit)
            .cloned()
            .collect())
    }
}
