//! Diesel row types and conversions to the core model.

use crate::DatabaseResult;
use crate::schema::{image_assets, prompt_executions};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use std::str::FromStr;
use tabula_core::{
    ExecutionRecord, ExecutionStatus, FieldSpec, ImageAsset, NewExecutionRecord, NewImageAsset,
    UserId,
};
use tabula_error::{DatabaseError, DatabaseErrorKind};
use uuid::Uuid;

/// Database row for the image_assets table.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = image_assets)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ImageAssetRow {
    pub id: Uuid,
    pub user_id: i64,
    pub checksum: String,
    pub original_filename: String,
    pub image_url: String,
    pub file_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ImageAssetRow> for ImageAsset {
    fn from(row: ImageAssetRow) -> Self {
        ImageAsset::from_parts(
            row.id,
            UserId::new(row.user_id),
            row.checksum,
            row.original_filename,
            row.image_url,
            row.file_path,
            row.created_at,
        )
    }
}

/// Insertable image asset row. `created_at` is filled by the database.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = image_assets)]
pub struct NewImageAssetRow {
    pub id: Uuid,
    pub user_id: i64,
    pub checksum: String,
    pub original_filename: String,
    pub image_url: String,
    pub file_path: Option<String>,
}

impl From<NewImageAsset> for NewImageAssetRow {
    fn from(new: NewImageAsset) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: new.user_id.get(),
            checksum: new.checksum,
            original_filename: new.original_filename,
            image_url: new.image_url,
            file_path: new.file_path,
        }
    }
}

/// Database row for the prompt_executions table.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = prompt_executions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ExecutionRow {
    pub id: Uuid,
    pub user_id: i64,
    pub schema_id: Option<Uuid>,
    pub image_id: Option<Uuid>,
    pub prompt_text: String,
    pub structured_fields: serde_json::Value,
    pub result_data: serde_json::Value,
    pub provider: String,
    pub model_name: String,
    pub status: String,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExecutionRow {
    /// Convert into the core record.
    ///
    /// # Errors
    ///
    /// Returns a serialization error for an unknown status or malformed field list.
    pub fn into_record(self) -> DatabaseResult<ExecutionRecord> {
        let status = ExecutionStatus::from_str(&self.status).map_err(|_| {
            DatabaseError::new(DatabaseErrorKind::Serialization(format!(
                "Unknown execution status: {}",
                self.status
            )))
        })?;
        let structured_fields: Vec<FieldSpec> = serde_json::from_value(self.structured_fields)?;

        let new = NewExecutionRecord {
            user_id: UserId::new(self.user_id),
            schema_id: self.schema_id,
            image_id: self.image_id,
            prompt_text: self.prompt_text,
            structured_fields,
            result_data: self.result_data,
            provider: self.provider,
            model_name: self.model_name,
            status,
            error_message: self.error_message,
        };
        Ok(ExecutionRecord::from_new(self.id, new, self.created_at).with_updated_at(self.updated_at))
    }
}

/// Insertable execution row. Timestamps are filled by the database.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = prompt_executions)]
pub struct NewExecutionRow {
    pub id: Uuid,
    pub user_id: i64,
    pub schema_id: Option<Uuid>,
    pub image_id: Option<Uuid>,
    pub prompt_text: String,
    pub structured_fields: serde_json::Value,
    pub result_data: serde_json::Value,
    pub provider: String,
    pub model_name: String,
    pub status: String,
    pub error_message: Option<String>,
}

impl TryFrom<NewExecutionRecord> for NewExecutionRow {
    type Error = DatabaseError;

    fn try_from(new: NewExecutionRecord) -> DatabaseResult<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            user_id: new.user_id.get(),
            schema_id: new.schema_id,
            image_id: new.image_id,
            prompt_text: new.prompt_text,
            structured_fields: serde_json::to_value(&new.structured_fields)?,
            result_data: new.result_data,
            provider: new.provider,
            model_name: new.model_name,
            status: new.status.as_str().to_string(),
            error_message: new.error_message,
        })
    }
}
