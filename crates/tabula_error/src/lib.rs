//! Error types for Tabula.
//!
//! This crate provides the error types shared by every Tabula crate.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use tabula_error::{TabulaResult, ConfigError};
//!
//! fn load_key() -> TabulaResult<String> {
//!     Err(ConfigError::new("OPENAI_API_KEY is not configured"))?
//! }
//!
//! assert!(load_key().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod database;
mod error;
mod generation;
mod storage;
mod validation;

pub use config::ConfigError;
pub use database::{DatabaseError, DatabaseErrorKind};
pub use error::{TabulaError, TabulaErrorKind, TabulaResult};
pub use generation::{GenerationError, GenerationErrorKind};
pub use storage::{StorageError, StorageErrorKind};
pub use validation::{ValidationError, ValidationErrorKind};
