//! Top-level error wrapper types.

use crate::{ConfigError, DatabaseError, GenerationError, StorageError, ValidationError};

/// Every error a Tabula operation can surface.
///
/// # Examples
///
/// ```
/// use tabula_error::{TabulaError, ConfigError};
///
/// let err: TabulaError = ConfigError::new("missing key").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum TabulaErrorKind {
    /// Uploaded image failed validation
    #[from(ValidationError)]
    Validation(ValidationError),
    /// Storage backend failure
    #[from(StorageError)]
    Storage(StorageError),
    /// Missing or invalid configuration
    #[from(ConfigError)]
    Config(ConfigError),
    /// Structured generation failure
    #[from(GenerationError)]
    Generation(GenerationError),
    /// Persistence failure
    #[from(DatabaseError)]
    Database(DatabaseError),
}

/// Tabula error with kind discrimination.
///
/// # Examples
///
/// ```
/// use tabula_error::{TabulaResult, TabulaErrorKind, GenerationError, GenerationErrorKind};
///
/// fn generate() -> TabulaResult<()> {
///     Err(GenerationError::new(GenerationErrorKind::EmptyPrompt))?
/// }
///
/// let err = generate().unwrap_err();
/// assert!(matches!(err.kind(), TabulaErrorKind::Generation(_)));
/// assert_eq!(err.user_message(), "Prompt text is required");
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Tabula Error: {}", _0)]
pub struct TabulaError(Box<TabulaErrorKind>);

impl TabulaError {
    /// Create a new error from a kind.
    pub fn new(kind: TabulaErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &TabulaErrorKind {
        &self.0
    }

    /// Human-readable message without source location, suitable for end users.
    pub fn user_message(&self) -> String {
        match self.kind() {
            TabulaErrorKind::Validation(e) => e.kind.to_string(),
            TabulaErrorKind::Storage(e) => format!("Image upload failed: {}", e.kind),
            TabulaErrorKind::Config(e) => e.message.clone(),
            TabulaErrorKind::Generation(e) => e.kind.to_string(),
            TabulaErrorKind::Database(e) => e.kind.to_string(),
        }
    }
}

// Generic From implementation for any type that converts to TabulaErrorKind
impl<T> From<T> for TabulaError
where
    T: Into<TabulaErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Tabula operations.
pub type TabulaResult<T> = std::result::Result<T, TabulaError>;
