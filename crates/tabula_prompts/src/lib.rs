//! The Tabula request pipeline.
//!
//! - [`ImageUploadHandler`] validates, hashes and deduplicates image uploads per
//!   user, writing each distinct `(user, content)` pair to storage at most once.
//! - [`PromptRunner`] binds an optional upload, a structured generation call and
//!   the execution record into one request.
//! - [`parse_field_rows`] turns submitted form columns into field specs.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod fields;
mod runner;
mod upload;

pub use fields::{default_field_rows, parse_field_rows};
pub use runner::{
    DUPLICATE_NOTICE, EMPTY_PROMPT_MESSAGE, HistoryEntry, PROVIDER_NAME, PromptOutcome,
    PromptRequest, PromptRunner, PromptRunnerBuilder, PromptRunnerBuilderError,
};
pub use upload::{DUPLICATE_MESSAGE, ImageUploadHandler, ImageUploadResult, UPLOADED_MESSAGE};
