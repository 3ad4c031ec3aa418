//! S3-compatible object store backend.

use crate::{ImageStorage, StoredImage, unique_filename};
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use std::sync::Arc;
use tabula_core::{S3Config, StorageBackendKind};
use tabula_error::{StorageError, StorageErrorKind, TabulaError, TabulaResult};
use tokio::sync::OnceCell;
use tracing::{debug, error, info, instrument};

/// Minimal object-store surface the backend needs.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload `body` to `bucket/key` with the given content type.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<(), StorageError>;
}

/// Builds an [`ObjectStore`] from credentials.
///
/// Only called once credentials have been checked.
#[async_trait::async_trait]
pub trait ObjectStoreConnector: Send + Sync {
    /// Build a client for the given configuration.
    async fn connect(&self, config: &S3Config) -> Result<Arc<dyn ObjectStore>, StorageError>;
}

/// [`ObjectStore`] backed by the AWS SDK.
#[derive(Debug, Clone)]
pub struct AwsObjectStore {
    client: aws_sdk_s3::Client,
}

impl AwsObjectStore {
    /// Wrap an SDK client.
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl ObjectStore for AwsObjectStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| StorageError::new(StorageErrorKind::Upload(e.to_string())))?;
        Ok(())
    }
}

/// Connector building [`AwsObjectStore`] clients from static credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct AwsConnector;

#[async_trait::async_trait]
impl ObjectStoreConnector for AwsConnector {
    async fn connect(&self, config: &S3Config) -> Result<Arc<dyn ObjectStore>, StorageError> {
        let credentials = Credentials::new(
            config.access_key_id.trim(),
            config.secret_access_key.trim(),
            None,
            None,
            "tabula",
        );

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.effective_region().to_string()))
            .credentials_provider(credentials)
            .load()
            .await;

        Ok(Arc::new(AwsObjectStore::new(aws_sdk_s3::Client::new(&sdk_config))))
    }
}

/// Remote object-store backend.
///
/// The client is built lazily on the first upload and cached. Missing
/// credentials or bucket fail that call with a configuration error before
/// any client is built. A connector failure is reported as
/// [`StorageErrorKind::ClientInit`] and is retried on the next upload.
pub struct S3Storage {
    config: S3Config,
    prefix: String,
    connector: Arc<dyn ObjectStoreConnector>,
    client: OnceCell<Arc<dyn ObjectStore>>,
}

impl S3Storage {
    /// Create a backend using the AWS SDK.
    pub fn new(config: S3Config, prefix: impl Into<String>) -> Self {
        Self::with_connector(config, prefix, Arc::new(AwsConnector))
    }

    /// Create a backend with a custom client connector.
    pub fn with_connector(
        config: S3Config,
        prefix: impl Into<String>,
        connector: Arc<dyn ObjectStoreConnector>,
    ) -> Self {
        info!(bucket = %config.bucket, region = %config.effective_region(), "Configured S3 storage");
        Self {
            config,
            prefix: prefix.into().trim_matches('/').to_string(),
            connector,
            client: OnceCell::new(),
        }
    }

    /// Public URL of an object key.
    ///
    /// ```
    /// use tabula_core::S3Config;
    /// use tabula_storage::S3Storage;
    ///
    /// let config = S3Config { bucket: "pics".into(), region: "eu-west-1".into(), ..Default::default() };
    /// let storage = S3Storage::new(config, "images");
    /// assert_eq!(
    ///     storage.public_url("images/a.png"),
    ///     "https://pics.s3.eu-west-1.amazonaws.com/images/a.png"
    /// );
    /// ```
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            self.config.bucket.trim(),
            self.config.effective_region(),
            key
        )
    }

    fn object_key(&self, filename: &str) -> String {
        if self.prefix.is_empty() {
            filename.to_string()
        } else {
            format!("{}/{}", self.prefix, filename)
        }
    }

    /// Build the client once, after checking credentials.
    async fn ensure_client(&self) -> TabulaResult<&Arc<dyn ObjectStore>> {
        self.client
            .get_or_try_init(|| async {
                debug!(
                    access_key = %redact(&self.config.access_key_id),
                    secret_key = %redact(&self.config.secret_access_key),
                    "Initialising S3 client"
                );
                self.config.validate()?;

                let client = self.connector.connect(&self.config).await.map_err(|e| {
                    error!(error = %e, "Failed to create S3 client");
                    match e.kind {
                        StorageErrorKind::ClientInit(_) => e,
                        other => StorageError::new(StorageErrorKind::ClientInit(other.to_string())),
                    }
                })?;

                info!(bucket = %self.config.bucket, "S3 client initialised");
                Ok::<_, TabulaError>(client)
            })
            .await
    }
}

impl std::fmt::Debug for S3Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Storage")
            .field("bucket", &self.config.bucket)
            .field("region", &self.config.effective_region())
            .field("prefix", &self.prefix)
            .field("initialised", &self.client.initialized())
            .finish()
    }
}

#[async_trait::async_trait]
impl ImageStorage for S3Storage {
    #[instrument(skip(self, data), fields(size = data.len(), bucket = %self.config.bucket))]
    async fn store(
        &self,
        data: &[u8],
        original_filename: &str,
        content_type: &str,
    ) -> TabulaResult<StoredImage> {
        let key = self.object_key(&unique_filename(original_filename));
        info!(key = %key, "Uploading file to S3");

        let client = self.ensure_client().await?;
        client
            .put_object(self.config.bucket.trim(), &key, content_type, data.to_vec())
            .await
            .inspect_err(|e| error!(key = %key, error = %e, "S3 upload failed"))?;

        let url = self.public_url(&key);
        info!(key = %key, url = %url, "File uploaded to S3");
        Ok(StoredImage::new(url, None, StorageBackendKind::S3))
    }

    fn backend(&self) -> StorageBackendKind {
        StorageBackendKind::S3
    }
}

/// First four characters of a secret, or `MISSING`.
fn redact(secret: &str) -> String {
    let secret = secret.trim();
    if secret.is_empty() {
        "MISSING".to_string()
    } else {
        format!("{}...", secret.chars().take(4).collect::<String>())
    }
}
