//! Prompt execution history records.

use crate::{FieldSpec, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a prompt execution.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    derive_more::Display,
    strum::EnumIter,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExecutionStatus {
    /// Created, not yet started
    #[default]
    #[display("pending")]
    Pending,
    /// Provider call in flight
    #[display("running")]
    Running,
    /// Finished with a result
    #[display("completed")]
    Completed,
    /// Finished with an error
    #[display("failed")]
    Failed,
}

impl ExecutionStatus {
    /// Convert to string representation for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Pending => "pending",
            ExecutionStatus::Running => "running",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
        }
    }
}

/// One auditable prompt execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct ExecutionRecord {
    /// Unique identifier
    id: Uuid,
    /// User who ran the prompt
    user_id: UserId,
    /// Reusable schema the fields came from, if any
    schema_id: Option<Uuid>,
    /// Image attached to the request, if any
    image_id: Option<Uuid>,
    /// Prompt text as submitted
    prompt_text: String,
    /// Requested output fields
    structured_fields: Vec<FieldSpec>,
    /// Structured result data
    result_data: serde_json::Value,
    /// Provider name
    provider: String,
    /// Model identifier the provider used
    model_name: String,
    /// Lifecycle state
    status: ExecutionStatus,
    /// Failure description for failed runs
    error_message: Option<String>,
    /// Creation timestamp
    created_at: DateTime<Utc>,
    /// Last update timestamp
    updated_at: DateTime<Utc>,
}

impl ExecutionRecord {
    /// Materialise a record from a pending insert.
    pub fn from_new(id: Uuid, new: NewExecutionRecord, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: new.user_id,
            schema_id: new.schema_id,
            image_id: new.image_id,
            prompt_text: new.prompt_text,
            structured_fields: new.structured_fields,
            result_data: new.result_data,
            provider: new.provider,
            model_name: new.model_name,
            status: new.status,
            error_message: new.error_message,
            created_at,
            updated_at: created_at,
        }
    }

    /// Rebuild a record from persisted state; `updated_at` is set separately.
    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = updated_at;
        self
    }
}

/// Insertable execution record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_builder::Builder)]
#[builder(setter(into))]
pub struct NewExecutionRecord {
    /// User who ran the prompt
    pub user_id: UserId,
    /// Reusable schema the fields came from, if any
    #[builder(default)]
    pub schema_id: Option<Uuid>,
    /// Image attached to the request, if any
    #[builder(default)]
    pub image_id: Option<Uuid>,
    /// Prompt text as submitted
    pub prompt_text: String,
    /// Requested output fields
    #[builder(default)]
    pub structured_fields: Vec<FieldSpec>,
    /// Structured result data
    #[builder(default = "serde_json::Value::Object(Default::default())")]
    pub result_data: serde_json::Value,
    /// Provider name
    #[builder(default)]
    pub provider: String,
    /// Model identifier the provider used
    #[builder(default)]
    pub model_name: String,
    /// Lifecycle state
    #[builder(default)]
    pub status: ExecutionStatus,
    /// Failure description for failed runs
    #[builder(default)]
    pub error_message: Option<String>,
}

impl NewExecutionRecord {
    /// Creates a new builder for `NewExecutionRecord`.
    pub fn builder() -> NewExecutionRecordBuilder {
        NewExecutionRecordBuilder::default()
    }
}
