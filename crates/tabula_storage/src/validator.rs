//! Upload precondition checks.

use crate::UploadedFile;
use tabula_core::UploadConfig;
use tabula_error::{ValidationError, ValidationErrorKind};
use tracing::{debug, instrument};

/// Checks uploads against size and content-type limits.
///
/// Pure: no I/O, no side effects.
#[derive(Debug, Clone)]
pub struct ImageValidator {
    config: UploadConfig,
}

impl ImageValidator {
    /// Create a validator for the given limits.
    pub fn new(config: UploadConfig) -> Self {
        Self { config }
    }

    /// The limits in force.
    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Validate size first, then declared content type.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrorKind::FileTooLarge`] or
    /// [`ValidationErrorKind::UnsupportedContentType`].
    #[instrument(skip(self, file), fields(filename = %file.filename(), size = file.size()))]
    pub fn validate(&self, file: &UploadedFile) -> Result<(), ValidationError> {
        debug!("Validating image");
        self.validate_size(file)?;
        self.validate_type(file)
    }

    /// Error for an upload of `size_bytes`, used when the upload was cut off
    /// before it could be buffered whole.
    pub fn too_large(&self, size_bytes: u64) -> ValidationError {
        ValidationError::new(ValidationErrorKind::FileTooLarge {
            max_mb: self.config.max_size_mb,
            size_bytes,
        })
    }

    fn validate_size(&self, file: &UploadedFile) -> Result<(), ValidationError> {
        if file.size() > self.config.max_size_bytes() {
            return Err(self.too_large(file.size()));
        }
        Ok(())
    }

    fn validate_type(&self, file: &UploadedFile) -> Result<(), ValidationError> {
        let content_type = file.content_type();
        if !self.config.allowed_types.iter().any(|t| t == content_type) {
            return Err(ValidationError::new(
                ValidationErrorKind::UnsupportedContentType {
                    content_type: content_type.clone(),
                    allowed: self.config.allowed_types.join(", "),
                },
            ));
        }
        Ok(())
    }
}
