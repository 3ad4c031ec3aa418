//! Validation error types for uploads and schemas.

/// Reasons an upload or a schema definition is refused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ValidationErrorKind {
    /// File is larger than the configured maximum
    #[display("Image should not exceed {} MB.", max_mb)]
    FileTooLarge {
        /// Configured limit in mebibytes
        max_mb: u64,
        /// Actual size of the upload in bytes
        size_bytes: u64,
    },
    /// Declared content type is not in the allow-list
    #[display("Invalid image type '{}'. Allowed types: {}", content_type, allowed)]
    UnsupportedContentType {
        /// Content type declared by the client
        content_type: String,
        /// Comma-separated allow-list
        allowed: String,
    },
    /// Schema name is empty after trimming
    #[display("Schema name must not be empty")]
    BlankSchemaName,
    /// Two fields of one schema share a name
    #[display("Duplicate field '{}' in schema '{}'", field, schema)]
    DuplicateSchemaField {
        /// Schema name
        schema: String,
        /// Repeated field name
        field: String,
    },
}

/// Validation error with location tracking.
///
/// # Examples
///
/// ```
/// use tabula_error::{ValidationError, ValidationErrorKind};
///
/// let err = ValidationError::new(ValidationErrorKind::FileTooLarge {
///     max_mb: 10,
///     size_bytes: 11 * 1024 * 1024,
/// });
/// assert!(format!("{}", err).contains("10 MB"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Validation Error: {} at line {} in {}", kind, line, file)]
pub struct ValidationError {
    /// The kind of error that occurred
    pub kind: ValidationErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ValidationError {
    /// Create a new validation error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ValidationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
