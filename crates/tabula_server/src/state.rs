//! Shared handler state.

use std::sync::Arc;
use tabula_core::StorageConfig;
use tabula_prompts::PromptRunner;

/// State shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    runner: Arc<PromptRunner>,
    storage: StorageConfig,
    max_upload_bytes: usize,
}

impl AppState {
    /// Create handler state.
    pub fn new(runner: Arc<PromptRunner>, storage: StorageConfig, max_upload_bytes: usize) -> Self {
        Self {
            runner,
            storage,
            max_upload_bytes,
        }
    }

    /// Prompt runner.
    pub fn runner(&self) -> &PromptRunner {
        &self.runner
    }

    /// Storage settings, used to serve local media.
    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }

    /// Largest accepted upload in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }
}
