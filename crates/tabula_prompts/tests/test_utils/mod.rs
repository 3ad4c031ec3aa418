//! Test doubles for the upload and prompt pipelines.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tabula_core::{
    ImageAsset, LlmConfig, NewImageAsset, StorageBackendKind, UploadConfig, UserId,
};
use tabula_database::{DatabaseResult, ImageRepository, InMemoryRepository};
use tabula_error::{GenerationError, GenerationErrorKind, StorageError, StorageErrorKind, TabulaResult};
use tabula_models::{
    ChatCompletionRequest, ChatCompletionResponse, ChatTransport, Choice, ResponseMessage,
    StructuredGenerator, Usage,
};
use tabula_storage::{ImageStorage, ImageValidator, StoredImage};
use uuid::Uuid;

/// Storage that counts writes and never touches disk.
pub struct FakeStorage {
    backend: StorageBackendKind,
    writes: AtomicUsize,
    fail: bool,
}

impl FakeStorage {
    pub fn local() -> Arc<Self> {
        Arc::new(Self {
            backend: StorageBackendKind::Local,
            writes: AtomicUsize::new(0),
            fail: false,
        })
    }

    pub fn s3() -> Arc<Self> {
        Arc::new(Self {
            backend: StorageBackendKind::S3,
            writes: AtomicUsize::new(0),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            backend: StorageBackendKind::S3,
            writes: AtomicUsize::new(0),
            fail: true,
        })
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ImageStorage for FakeStorage {
    async fn store(
        &self,
        _data: &[u8],
        original_filename: &str,
        _content_type: &str,
    ) -> TabulaResult<StoredImage> {
        if self.fail {
            return Err(StorageError::new(StorageErrorKind::Upload("bucket unreachable".to_string())).into());
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        let ext = original_filename.rsplit('.').next().unwrap_or("bin");
        let name = format!("images/{}.{}", Uuid::new_v4().simple(), ext);
        Ok(match self.backend {
            StorageBackendKind::Local => {
                StoredImage::new(format!("/media/{}", name), Some(name), self.backend)
            }
            StorageBackendKind::S3 => StoredImage::new(
                format!("https://bucket.s3.us-east-1.amazonaws.com/{}", name),
                None,
                self.backend,
            ),
        })
    }

    fn backend(&self) -> StorageBackendKind {
        self.backend
    }
}

/// Repository whose first checksum lookup always misses, as if a concurrent
/// upload had not committed yet.
pub struct RacingRepository {
    inner: InMemoryRepository,
    misses_left: AtomicUsize,
}

impl RacingRepository {
    pub fn new(inner: InMemoryRepository) -> Arc<Self> {
        Arc::new(Self {
            inner,
            misses_left: AtomicUsize::new(1),
        })
    }

    pub async fn image_count(&self) -> usize {
        self.inner.image_count().await
    }
}

#[async_trait::async_trait]
impl ImageRepository for RacingRepository {
    async fn find_by_checksum(
        &self,
        user_id: UserId,
        checksum: &str,
    ) -> DatabaseResult<Option<ImageAsset>> {
        let miss = self
            .misses_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if miss {
            return Ok(None);
        }
        self.inner.find_by_checksum(user_id, checksum).await
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<ImageAsset>> {
        self.inner.find_by_id(id).await
    }

    async fn insert(&self, new_asset: NewImageAsset) -> DatabaseResult<ImageAsset> {
        self.inner.insert(new_asset).await
    }

    async fn list_for_user(&self, user_id: UserId, limit: usize) -> DatabaseResult<Vec<ImageAsset>> {
        self.inner.list_for_user(user_id, limit).await
    }
}

/// Provider transport replaying one outcome and recording requests.
pub struct FakeTransport {
    outcome: Result<ChatCompletionResponse, GenerationErrorKind>,
    calls: AtomicUsize,
    requests: Mutex<Vec<ChatCompletionRequest>>,
}

impl FakeTransport {
    pub fn replying(content: &str) -> Arc<Self> {
        Self::with_outcome(Ok(ChatCompletionResponse {
            id: None,
            model: Some("gpt-4o-mini-2024-07-18".to_string()),
            choices: vec![Choice {
                message: ResponseMessage {
                    role: Some("assistant".to_string()),
                    content: Some(content.to_string()),
                },
                ..Default::default()
            }],
            usage: Some(Usage {
                prompt_tokens: 30,
                completion_tokens: 10,
                total_tokens: 40,
            }),
        }))
    }

    pub fn failing(kind: GenerationErrorKind) -> Arc<Self> {
        Self::with_outcome(Err(kind))
    }

    fn with_outcome(outcome: Result<ChatCompletionResponse, GenerationErrorKind>) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ChatCompletionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait::async_trait]
impl ChatTransport for FakeTransport {
    async fn send(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        self.outcome.clone().map_err(GenerationError::new)
    }
}

pub fn validator() -> ImageValidator {
    ImageValidator::new(UploadConfig::default())
}

pub fn generator(transport: Arc<FakeTransport>) -> StructuredGenerator {
    StructuredGenerator::new(transport, LlmConfig::default())
}
