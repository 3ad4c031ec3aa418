//! Structured generation results.

use serde::{Deserialize, Serialize};

/// Token usage counters reported by the provider.
///
/// Counters the provider omits stay at zero.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_getters::Getters,
)]
pub struct TokenUsage {
    /// Tokens in the prompt
    #[serde(default)]
    prompt_tokens: u32,
    /// Tokens in the completion
    #[serde(default)]
    completion_tokens: u32,
    /// Total tokens used
    #[serde(default)]
    total_tokens: u32,
}

impl TokenUsage {
    /// Create usage counters.
    pub fn new(prompt_tokens: u32, completion_tokens: u32, total_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens,
        }
    }
}

/// Outcome of one structured generation call. Immutable once built.
///
/// # Examples
///
/// ```
/// use tabula_core::{GenerationResult, TokenUsage};
/// use serde_json::json;
///
/// let result = GenerationResult::new(
///     json!({"age": 42}),
///     r#"{"age": 42}"#,
///     "gpt-4o-mini",
///     TokenUsage::default(),
/// );
/// assert_eq!(result.structured_data()["age"], 42);
/// assert_eq!(*result.usage().total_tokens(), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct GenerationResult {
    /// Parsed structured output, or `{"raw_response": ...}` when the reply was not JSON
    structured_data: serde_json::Value,
    /// Raw text the provider returned
    raw_text: String,
    /// Model the provider reports having used
    model: String,
    /// Token usage counters
    usage: TokenUsage,
}

impl GenerationResult {
    /// Create a generation result.
    pub fn new(
        structured_data: serde_json::Value,
        raw_text: impl Into<String>,
        model: impl Into<String>,
        usage: TokenUsage,
    ) -> Self {
        Self {
            structured_data,
            raw_text: raw_text.into(),
            model: model.into(),
            usage,
        }
    }
}
