//! Structured generation client.

use crate::{
    ChatCompletionRequest, ChatTransport, OpenAiClient, ResponseFormat, build_messages,
    render_field_instructions,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tabula_core::{FieldSpec, GenerationResult, LlmConfig, TokenUsage};
use tabula_error::{ConfigError, GenerationError, GenerationErrorKind};
use tracing::{debug, info, instrument, warn};

/// Per-call overrides of the configured model and temperature.
#[derive(Debug, Clone, Default, PartialEq, derive_builder::Builder)]
#[builder(setter(into, strip_option), default)]
pub struct GenerationOverrides {
    /// Model to use instead of the configured default
    pub model: Option<String>,
    /// Sampling temperature instead of the configured default
    pub temperature: Option<f32>,
}

impl GenerationOverrides {
    /// Create a builder.
    pub fn builder() -> GenerationOverridesBuilder {
        GenerationOverridesBuilder::default()
    }
}

/// Builds structured requests, calls the provider and parses replies.
///
/// Owns no global state: construct one per service and share it by `Arc`.
#[derive(Clone)]
pub struct StructuredGenerator {
    transport: Arc<dyn ChatTransport>,
    config: LlmConfig,
}

impl std::fmt::Debug for StructuredGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructuredGenerator")
            .field("model", &self.config.model)
            .field("base_url", &self.config.base_url)
            .finish()
    }
}

impl StructuredGenerator {
    /// Create a generator over a custom transport.
    pub fn new(transport: Arc<dyn ChatTransport>, config: LlmConfig) -> Self {
        Self { transport, config }
    }

    /// Create a generator talking to an OpenAI-compatible API.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the API key is missing.
    pub fn from_config(config: &LlmConfig) -> Result<Self, ConfigError> {
        let client = OpenAiClient::new(config)?;
        Ok(Self::new(Arc::new(client), config.clone()))
    }

    /// Configured default model.
    pub fn default_model(&self) -> &str {
        &self.config.model
    }

    /// Build the provider request for one call.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationErrorKind::EmptyPrompt`] for blank prompt text.
    pub fn build_request(
        &self,
        prompt_text: &str,
        fields: &[FieldSpec],
        image_url: Option<&str>,
        overrides: &GenerationOverrides,
    ) -> Result<ChatCompletionRequest, GenerationError> {
        if prompt_text.trim().is_empty() {
            return Err(GenerationError::new(GenerationErrorKind::EmptyPrompt));
        }

        let instructions = render_field_instructions(fields);
        let messages = build_messages(prompt_text, &instructions, image_url);
        let model = overrides
            .model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.config.model.clone());
        let temperature = overrides.temperature.unwrap_or(self.config.temperature);
        let max_tokens = self
            .config
            .send_max_tokens
            .then_some(self.config.max_tokens)
            .flatten();

        Ok(ChatCompletionRequest {
            model,
            messages,
            temperature: Some(temperature),
            max_tokens,
            response_format: Some(ResponseFormat::json_object()),
        })
    }

    /// Generate structured output for a prompt.
    ///
    /// # Errors
    ///
    /// - [`GenerationErrorKind::EmptyPrompt`] before any network call
    /// - [`GenerationErrorKind::Connection`] for connectivity or rate limiting
    /// - [`GenerationErrorKind::Rejected`] when the provider refuses the request
    ///
    /// A reply that is not JSON is not an error.
    #[instrument(skip(self, prompt_text, fields), fields(fields = fields.len(), has_image = image_url.is_some()))]
    pub async fn generate(
        &self,
        prompt_text: &str,
        fields: &[FieldSpec],
        image_url: Option<&str>,
        overrides: &GenerationOverrides,
    ) -> Result<GenerationResult, GenerationError> {
        let request = self.build_request(prompt_text, fields, image_url, overrides)?;
        debug!(model = %request.model, "Sending to model");

        let response = self.transport.send(&request).await?;

        let choice = response.choices.into_iter().next().ok_or_else(|| {
            GenerationError::new(GenerationErrorKind::Rejected(
                "provider returned no choices".to_string(),
            ))
        })?;
        let raw_text = choice.message.content.unwrap_or_default();
        let structured_data = parse_structured(&raw_text);
        let usage = response.usage.map(TokenUsage::from).unwrap_or_default();
        let model = response
            .model
            .filter(|m| !m.is_empty())
            .unwrap_or(request.model);

        info!(model = %model, total_tokens = usage.total_tokens(), "Structured generation complete");
        Ok(GenerationResult::new(structured_data, raw_text, model, usage))
    }
}

/// Parse reply text as JSON, falling back to `{"raw_response": text}`.
fn parse_structured(raw_text: &str) -> Value {
    match serde_json::from_str(raw_text) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Provider returned invalid JSON, keeping raw text");
            json!({ "raw_response": raw_text })
        }
    }
}
