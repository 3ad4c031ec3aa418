//! Core data types for Tabula.
//!
//! This crate provides the data model shared by the upload pipeline, the
//! structured generation client and the persistence layer, together with the
//! layered configuration and tracing setup.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod asset;
mod config;
mod execution;
mod field;
mod generation;
mod schema;
mod telemetry;
mod user;

pub use asset::{ImageAsset, NewImageAsset, NewImageAssetBuilder};
pub use config::{
    DatabaseConfig, LlmConfig, S3Config, ServerConfig, StorageBackendKind, StorageConfig,
    TabulaConfig, UploadConfig,
};
pub use execution::{ExecutionRecord, ExecutionStatus, NewExecutionRecord, NewExecutionRecordBuilder};
pub use field::{FieldSpec, FieldType};
pub use generation::{GenerationResult, TokenUsage};
pub use schema::{PromptSchema, SchemaField};
pub use telemetry::init_tracing;
pub use user::UserId;
