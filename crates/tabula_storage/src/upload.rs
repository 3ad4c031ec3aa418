//! Inbound file representation.

/// An image received from a client, fully buffered.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct UploadedFile {
    /// Filename supplied by the client
    filename: String,
    /// Content type declared by the client
    content_type: String,
    /// Raw bytes
    data: Vec<u8>,
}

impl UploadedFile {
    /// Create an uploaded file.
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}
