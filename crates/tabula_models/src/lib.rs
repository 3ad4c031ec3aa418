//! Structured LLM generation for Tabula.
//!
//! [`StructuredGenerator`] turns a prompt, a list of desired output fields and an
//! optional image URL into a JSON-mode chat completion request, sends it through a
//! [`ChatTransport`], and parses the reply into a [`GenerationResult`].
//!
//! Provider failures are translated into [`GenerationErrorKind`] so callers never
//! see transport types. A reply that is not valid JSON is never an error: it
//! degrades to `{"raw_response": "<text>"}`.
//!
//! # Example
//!
//! ```no_run
//! use tabula_core::{FieldSpec, LlmConfig};
//! use tabula_models::{GenerationOverrides, StructuredGenerator};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = LlmConfig { api_key: "sk-...".into(), ..Default::default() };
//! let generator = StructuredGenerator::from_config(&config)?;
//! let result = generator
//!     .generate(
//!         "Who invented the telephone?",
//!         &[FieldSpec::string("inventor"), FieldSpec::number("year")],
//!         None,
//!         &GenerationOverrides::default(),
//!     )
//!     .await?;
//! println!("{}", result.structured_data());
//! # Ok(())
//! # }
//! ```
//!
//! [`GenerationResult`]: tabula_core::GenerationResult
//! [`GenerationErrorKind`]: tabula_error::GenerationErrorKind

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod dto;
mod generator;
mod prompt;
mod transport;

pub use dto::{
    ChatCompletionRequest, ChatCompletionRequestBuilder, ChatCompletionResponse, Choice,
    Message, ResponseFormat, ResponseMessage, Usage,
};
pub use generator::{GenerationOverrides, StructuredGenerator};
pub use prompt::{SYSTEM_INSTRUCTION, build_messages, render_field_instructions};
pub use transport::{ChatTransport, OpenAiClient};
