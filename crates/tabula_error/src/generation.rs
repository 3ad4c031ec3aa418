//! Structured generation error types.

/// Closed vocabulary of generation failures.
///
/// Provider-specific failures are translated into these kinds so callers never
/// depend on provider error types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum GenerationErrorKind {
    /// Prompt text was empty or whitespace-only
    #[display("Prompt text is required")]
    EmptyPrompt,
    /// Provider unreachable, timed out or rate limited
    #[display("Provider connection error: {}", _0)]
    Connection(String),
    /// Provider refused the request
    #[display("Provider rejected the request, check fields: {}", _0)]
    Rejected(String),
}

impl GenerationErrorKind {
    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GenerationErrorKind::Connection(_))
    }
}

/// Generation error with location tracking.
///
/// # Examples
///
/// ```
/// use tabula_error::{GenerationError, GenerationErrorKind};
///
/// let err = GenerationError::new(GenerationErrorKind::Connection("reset".into()));
/// assert!(err.kind.is_retryable());
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Generation Error: {} at line {} in {}", kind, line, file)]
pub struct GenerationError {
    /// The kind of error that occurred
    pub kind: GenerationErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl GenerationError {
    /// Create a new generation error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: GenerationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
