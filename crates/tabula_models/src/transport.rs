//! Provider transport.

use crate::{ChatCompletionRequest, ChatCompletionResponse};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tabula_core::LlmConfig;
use tabula_error::{ConfigError, GenerationError, GenerationErrorKind};
use tracing::{debug, error, instrument, warn};

/// Sends one chat completion request to a provider.
///
/// Implementations translate every provider failure into
/// [`GenerationErrorKind::Connection`] or [`GenerationErrorKind::Rejected`].
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a request and return the parsed envelope.
    async fn send(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, GenerationError>;
}

/// OpenAI-compatible HTTP client.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the API key is blank, before any
    /// network call is made.
    #[instrument(skip(config), fields(base_url = %config.base_url))]
    pub fn new(config: &LlmConfig) -> Result<Self, ConfigError> {
        let api_key = config.api_key.trim();
        if api_key.is_empty() {
            return Err(ConfigError::new("LLM API key is not configured"));
        }

        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build HTTP client: {}", e)))?;

        debug!("Created OpenAI-compatible client");
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Chat completions endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// Classify a non-success status.
fn classify_status(status: StatusCode, body: &str) -> GenerationErrorKind {
    if status == StatusCode::TOO_MANY_REQUESTS {
        GenerationErrorKind::Connection(format!("rate limited ({})", status.as_u16()))
    } else {
        GenerationErrorKind::Rejected(format!("{}: {}", status.as_u16(), body))
    }
}

#[async_trait::async_trait]
impl ChatTransport for OpenAiClient {
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn send(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, GenerationError> {
        debug!(messages = request.messages.len(), "Sending chat completion request");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, timeout = e.is_timeout(), "Provider connection failed");
                GenerationError::new(GenerationErrorKind::Connection(e.to_string()))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let kind = classify_status(status, &body);
            if kind.is_retryable() {
                warn!(status = %status, "Provider rate limited the request");
            } else {
                error!(status = %status, body = %body, "Provider rejected the request");
            }
            return Err(GenerationError::new(kind));
        }

        response.json::<ChatCompletionResponse>().await.map_err(|e| {
            error!(error = %e, "Failed to parse provider envelope");
            GenerationError::new(GenerationErrorKind::Rejected(format!(
                "Failed to parse response: {}",
                e
            )))
        })
    }
}
