//! HTTP handlers and router.

use crate::{AppState, CurrentUser, ErrorResponse, status_for};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Query, State, multipart::MultipartError},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tabula_core::{FieldSpec, StorageBackendKind, TokenUsage};
use tabula_prompts::{PromptOutcome, PromptRequest, parse_field_rows};
use tabula_storage::UploadedFile;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Room for multipart framing and text fields on top of the image itself.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Default page size of `GET /images`.
const DEFAULT_IMAGE_LIMIT: usize = 20;

/// Body of `POST /prompts`, for success and failure alike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptResponse {
    /// Trimmed prompt text
    pub prompt_text: String,
    /// Field rows used for the run
    pub field_rows: Vec<FieldSpec>,
    /// Structured output
    pub structured_output: Option<Value>,
    /// Token usage
    pub usage: Option<TokenUsage>,
    /// Model the provider used
    pub model: Option<String>,
    /// URL of the attached image
    pub image_preview_url: Option<String>,
    /// Set when an earlier upload was reused
    pub image_notice: Option<String>,
    /// Persisted execution id
    pub execution_id: Option<Uuid>,
    /// User-facing error message
    pub error: Option<String>,
}

impl From<&PromptOutcome> for PromptResponse {
    fn from(outcome: &PromptOutcome) -> Self {
        Self {
            prompt_text: outcome.prompt_text().clone(),
            field_rows: outcome.field_rows().clone(),
            structured_output: outcome.structured_output().cloned(),
            usage: outcome.usage().copied(),
            model: outcome.result().as_ref().map(|r| r.model().clone()),
            image_preview_url: outcome.image_preview_url().clone(),
            image_notice: outcome.image_notice().clone(),
            execution_id: *outcome.execution_id(),
            error: outcome.error_message().clone(),
        }
    }
}

/// Submitted prompt form.
#[derive(Debug, Default)]
struct PromptForm {
    prompt_text: String,
    field_names: Vec<String>,
    field_types: Vec<String>,
    image: Option<UploadedFile>,
    /// Bytes seen of an image that was over the limit
    oversized_image: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ImageListQuery {
    limit: Option<usize>,
}

/// Creates the API router.
///
/// Local media is served from the media root when the local backend is selected.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes().saturating_add(MULTIPART_OVERHEAD);
    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/prompts", post(run_prompt))
        .route("/prompts/history", get(history))
        .route("/images", get(list_images));

    let storage = state.storage();
    let media_path = storage.media_url.trim_end_matches('/');
    if storage.backend == StorageBackendKind::Local && media_path.starts_with('/') {
        debug!(path = %media_path, root = %storage.media_root, "Serving local media");
        router = router.nest_service(media_path, ServeDir::new(&storage.media_root));
    }

    router
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

/// Run one prompt from a multipart form.
#[instrument(skip(state, multipart), fields(user_id = %user.0))]
async fn run_prompt(
    State(state): State<AppState>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> Response {
    let form = match read_prompt_form(&mut multipart, state.max_upload_bytes()).await {
        Ok(form) => form,
        Err(response) => return response,
    };

    let request = PromptRequest {
        user_id: user.0,
        prompt_text: form.prompt_text,
        fields: parse_field_rows(&form.field_names, &form.field_types),
        image: form.image,
    };
    let outcome = match form.oversized_image {
        Some(size_bytes) => {
            let error = state.runner().uploads().validator().too_large(size_bytes);
            state.runner().reject(request, error.into())
        }
        None => state.runner().run(request).await,
    };

    let status = outcome
        .error()
        .as_ref()
        .map(status_for)
        .unwrap_or(StatusCode::OK);
    (status, Json(PromptResponse::from(&outcome))).into_response()
}

/// Read the prompt form.
///
/// An image over `max_image_bytes` is drained without being buffered. When the
/// request body limit cuts the form short, the parts read so far are kept and
/// the image is reported as oversized.
async fn read_prompt_form(
    multipart: &mut Multipart,
    max_image_bytes: usize,
) -> Result<PromptForm, Response> {
    let mut form = PromptForm::default();
    let mut image_bytes_seen = 0;

    match read_form_parts(multipart, max_image_bytes, &mut form, &mut image_bytes_seen).await {
        Ok(()) => Ok(form),
        Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            warn!(
                bytes_seen = image_bytes_seen,
                "Request body limit reached while reading form"
            );
            let floor = u64::try_from(max_image_bytes)
                .unwrap_or(u64::MAX)
                .saturating_add(1);
            form.image = None;
            form.oversized_image = Some(image_bytes_seen.max(floor));
            Ok(form)
        }
        Err(e) => Err(multipart_error(e)),
    }
}

async fn read_form_parts(
    multipart: &mut Multipart,
    max_image_bytes: usize,
    form: &mut PromptForm,
    image_bytes_seen: &mut u64,
) -> Result<(), MultipartError> {
    let limit = u64::try_from(max_image_bytes).unwrap_or(u64::MAX);
    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "prompt_text" => form.prompt_text = field.text().await?,
            "field_names[]" | "field_names" => form.field_names.push(field.text().await?),
            "field_types[]" | "field_types" => form.field_types.push(field.text().await?),
            "image" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();

                let mut data = Vec::new();
                *image_bytes_seen = 0;
                while let Some(chunk) = field.chunk().await? {
                    *image_bytes_seen = image_bytes_seen.saturating_add(chunk.len() as u64);
                    if *image_bytes_seen > limit {
                        data = Vec::new();
                    } else {
                        data.extend_from_slice(&chunk);
                    }
                }

                if *image_bytes_seen > limit {
                    debug!(size = *image_bytes_seen, "Discarded oversized image");
                    form.image = None;
                    form.oversized_image = Some(*image_bytes_seen);
                } else if !(filename.is_empty() && data.is_empty()) {
                    // Browsers send an empty part when no file was chosen
                    form.image = Some(UploadedFile::new(filename, content_type, data));
                }
            }
            other => debug!(field = %other, "Ignoring unknown form field"),
        }
    }
    Ok(())
}

fn multipart_error(e: MultipartError) -> Response {
    warn!(error = %e, "Multipart read error");
    (
        e.status(),
        Json(ErrorResponse::new(format!(
            "Failed to read form data: {}",
            e.body_text()
        ))),
    )
        .into_response()
}

/// Recent runs of the current user.
async fn history(State(state): State<AppState>, user: CurrentUser) -> Response {
    match state.runner().history(user.0).await {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(e) => (status_for(&e), Json(ErrorResponse::from(&e))).into_response(),
    }
}

/// Images uploaded by the current user.
async fn list_images(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ImageListQuery>,
) -> Response {
    let limit = query.limit.unwrap_or(DEFAULT_IMAGE_LIMIT);
    match state.runner().uploads().user_images(user.0, limit).await {
        Ok(images) => (StatusCode::OK, Json(images)).into_response(),
        Err(e) => (status_for(&e), Json(ErrorResponse::from(&e))).into_response(),
    }
}
