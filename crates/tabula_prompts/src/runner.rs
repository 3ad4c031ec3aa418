//! Prompt run orchestration.

use crate::{ImageUploadHandler, default_field_rows};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tabula_core::{
    ExecutionStatus, FieldSpec, GenerationResult, ImageAsset, NewExecutionRecord, TokenUsage,
    UserId,
};
use tabula_database::{ExecutionRepository, ImageRepository};
use tabula_error::{GenerationError, GenerationErrorKind, TabulaError, TabulaResult};
use tabula_models::{GenerationOverrides, StructuredGenerator};
use tabula_storage::UploadedFile;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Provider name recorded on executions.
pub const PROVIDER_NAME: &str = "openai";

/// Notice shown when an earlier upload of the same image was reused.
pub const DUPLICATE_NOTICE: &str = "Existing upload reused for this request.";

/// Error shown for a blank prompt.
pub const EMPTY_PROMPT_MESSAGE: &str = "Prompt text is required.";

/// One submitted prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    /// Authenticated user
    pub user_id: UserId,
    /// Prompt text as submitted
    pub prompt_text: String,
    /// Parsed field rows; empty means the default rows
    pub fields: Vec<FieldSpec>,
    /// Optional image attachment
    pub image: Option<UploadedFile>,
}

/// Everything a caller needs to render one run, success or failure.
///
/// The prompt text and field rows are always echoed back so nothing the user
/// entered is lost on error.
#[derive(Debug, derive_getters::Getters)]
pub struct PromptOutcome {
    /// Trimmed prompt text
    prompt_text: String,
    /// Field rows used for the run
    field_rows: Vec<FieldSpec>,
    /// URL of the attached image
    image_preview_url: Option<String>,
    /// Set when an earlier upload was reused
    image_notice: Option<String>,
    /// Generation output
    result: Option<GenerationResult>,
    /// Persisted execution id
    execution_id: Option<Uuid>,
    /// Failure, if the run did not complete
    error: Option<TabulaError>,
    /// User-facing failure message
    error_message: Option<String>,
}

impl PromptOutcome {
    fn new(prompt_text: &str, fields: Vec<FieldSpec>) -> Self {
        let field_rows = if fields.is_empty() {
            default_field_rows()
        } else {
            fields
        };
        Self {
            prompt_text: prompt_text.trim().to_string(),
            field_rows,
            image_preview_url: None,
            image_notice: None,
            result: None,
            execution_id: None,
            error: None,
            error_message: None,
        }
    }

    fn fail(mut self, error: TabulaError) -> Self {
        self.error_message = Some(error.user_message());
        self.error = Some(error);
        self
    }

    fn fail_empty_prompt(self) -> Self {
        let mut outcome = self.fail(GenerationError::new(GenerationErrorKind::EmptyPrompt).into());
        outcome.error_message = Some(EMPTY_PROMPT_MESSAGE.to_string());
        outcome
    }

    /// Whether the run completed.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.result.is_some()
    }

    /// Structured output of a completed run.
    pub fn structured_output(&self) -> Option<&Value> {
        self.result.as_ref().map(|r| r.structured_data())
    }

    /// Token usage of a completed run.
    pub fn usage(&self) -> Option<&TokenUsage> {
        self.result.as_ref().map(|r| r.usage())
    }
}

/// One row of a user's run history.
#[derive(Debug, Clone, PartialEq, Serialize, derive_getters::Getters)]
pub struct HistoryEntry {
    /// Execution id
    id: Uuid,
    /// Prompt text
    prompt_text: String,
    /// Structured result
    result_data: Value,
    /// When the run happened
    created_at: DateTime<Utc>,
    /// Model the provider used
    model_name: String,
    /// Run status
    status: ExecutionStatus,
    /// URL of the attached image
    image_url: Option<String>,
}

/// Runs prompts end to end: upload, generation and execution record.
#[derive(Clone, derive_builder::Builder)]
#[builder(pattern = "owned")]
pub struct PromptRunner {
    /// Upload pipeline
    uploads: Arc<ImageUploadHandler>,
    /// Structured generation client
    generator: StructuredGenerator,
    /// Execution history
    executions: Arc<dyn ExecutionRepository>,
    /// Image lookup for history rows
    images: Arc<dyn ImageRepository>,
    /// Base URL of locally served media
    #[builder(setter(into), default = "\"/media/\".to_string()")]
    media_url: String,
    /// Number of runs returned by [`PromptRunner::history`]
    #[builder(default = "5")]
    history_limit: usize,
}

impl std::fmt::Debug for PromptRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptRunner")
            .field("uploads", &self.uploads)
            .field("generator", &self.generator)
            .field("media_url", &self.media_url)
            .field("history_limit", &self.history_limit)
            .finish()
    }
}

impl PromptRunner {
    /// Create a builder.
    pub fn builder() -> PromptRunnerBuilder {
        PromptRunnerBuilder::default()
    }

    /// Upload pipeline used by this runner.
    pub fn uploads(&self) -> &ImageUploadHandler {
        &self.uploads
    }

    /// Run one prompt.
    ///
    /// Never returns an error: failures are carried in the outcome together
    /// with the submitted prompt and field rows.
    #[instrument(skip(self, request), fields(user_id = %request.user_id, has_image = request.image.is_some()))]
    pub async fn run(&self, request: PromptRequest) -> PromptOutcome {
        let mut outcome = PromptOutcome::new(&request.prompt_text, request.fields);
        if outcome.prompt_text.is_empty() {
            return outcome.fail_empty_prompt();
        }

        let mut image: Option<ImageAsset> = None;
        if let Some(file) = &request.image {
            match self.uploads.handle_upload(request.user_id, file).await {
                Ok(upload) => {
                    outcome.image_preview_url = upload.asset().preview_url(&self.media_url);
                    if *upload.is_duplicate() {
                        outcome.image_notice = Some(DUPLICATE_NOTICE.to_string());
                    }
                    image = Some(upload.asset().clone());
                }
                Err(e) => {
                    warn!(error = %e, "Image handling failed");
                    return outcome.fail(e);
                }
            }
        }

        let generated = self
            .generator
            .generate(
                &outcome.prompt_text,
                &outcome.field_rows,
                outcome.image_preview_url.as_deref(),
                &GenerationOverrides::default(),
            )
            .await;

        let image_id = image.as_ref().map(|a| *a.id());
        match generated {
            Ok(result) => {
                let record = NewExecutionRecord {
                    user_id: request.user_id,
                    schema_id: None,
                    image_id,
                    prompt_text: outcome.prompt_text.clone(),
                    structured_fields: outcome.field_rows.clone(),
                    result_data: result.structured_data().clone(),
                    provider: PROVIDER_NAME.to_string(),
                    model_name: result.model().clone(),
                    status: ExecutionStatus::Completed,
                    error_message: None,
                };
                outcome.result = Some(result);
                match self.executions.record(record).await {
                    Ok(execution) => {
                        info!(execution_id = %execution.id(), "Prompt run completed");
                        outcome.execution_id = Some(*execution.id());
                        outcome
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to record execution");
                        outcome.fail(e.into())
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, retryable = e.kind.is_retryable(), "Structured generation failed");
                self.record_failure(&request.user_id, image_id, &outcome, &e)
                    .await;
                outcome.fail(e.into())
            }
        }
    }

    /// Outcome for a request refused before it could run, such as an image
    /// cut off at the request body limit.
    ///
    /// A blank prompt is still reported first, as in [`PromptRunner::run`].
    /// Nothing is uploaded or recorded.
    #[instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub fn reject(&self, request: PromptRequest, error: TabulaError) -> PromptOutcome {
        let outcome = PromptOutcome::new(&request.prompt_text, request.fields);
        if outcome.prompt_text.is_empty() {
            return outcome.fail_empty_prompt();
        }
        warn!(error = %error, "Prompt request rejected");
        outcome.fail(error)
    }

    /// Persist a failed run so history stays auditable.
    async fn record_failure(
        &self,
        user_id: &UserId,
        image_id: Option<Uuid>,
        outcome: &PromptOutcome,
        error: &GenerationError,
    ) {
        let record = NewExecutionRecord {
            user_id: *user_id,
            schema_id: None,
            image_id,
            prompt_text: outcome.prompt_text.clone(),
            structured_fields: outcome.field_rows.clone(),
            result_data: Value::Object(Default::default()),
            provider: PROVIDER_NAME.to_string(),
            model_name: self.generator.default_model().to_string(),
            status: ExecutionStatus::Failed,
            error_message: Some(error.kind.to_string()),
        };
        if let Err(e) = self.executions.record(record).await {
            error!(error = %e, "Failed to record failed execution");
        }
    }

    /// A user's most recent runs, newest first.
    ///
    /// # Errors
    ///
    /// Returns database errors.
    #[instrument(skip(self))]
    pub async fn history(&self, user_id: UserId) -> TabulaResult<Vec<HistoryEntry>> {
        let records = self.executions.recent(user_id, self.history_limit).await?;

        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            let image_url = match record.image_id() {
                Some(id) => self
                    .images
                    .find_by_id(*id)
                    .await?
                    .and_then(|asset| asset.preview_url(&self.media_url)),
                None => None,
            };
            entries.push(HistoryEntry {
                id: *record.id(),
                prompt_text: record.prompt_text().clone(),
                result_data: record.result_data().clone(),
                created_at: *record.created_at(),
                model_name: record.model_name().clone(),
                status: *record.status(),
                image_url,
            });
        }
        Ok(entries)
    }
}
