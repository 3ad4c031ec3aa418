//! Layered service configuration.

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tabula_error::{ConfigError, TabulaResult};
use tracing::{debug, instrument};

/// Image upload limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Maximum accepted size in mebibytes
    #[serde(default = "default_max_size_mb")]
    pub max_size_mb: u64,
    /// Accepted content types
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
}

fn default_max_size_mb() -> u64 {
    10
}

fn default_allowed_types() -> Vec<String> {
    ["image/jpeg", "image/png", "image/webp", "image/gif"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_size_mb: default_max_size_mb(),
            allowed_types: default_allowed_types(),
        }
    }
}

impl UploadConfig {
    /// Maximum accepted size in bytes.
    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(1024 * 1024)
    }
}

/// Which storage backend serves uploads. Chosen once at startup.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    /// Local filesystem under `media_root`
    #[default]
    #[display("local")]
    Local,
    /// Remote S3-compatible object store
    #[display("s3")]
    S3,
}

/// Remote object-store credentials and location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Config {
    /// Bucket name
    #[serde(default)]
    pub bucket: String,
    /// Region
    #[serde(default = "default_region")]
    pub region: String,
    /// Access key id
    #[serde(default)]
    pub access_key_id: String,
    /// Secret access key
    #[serde(default)]
    pub secret_access_key: String,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: default_region(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
        }
    }
}

impl S3Config {
    /// Check that credentials and bucket are present.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming nothing secret if any value is blank.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let missing = [
            ("access key id", &self.access_key_id),
            ("secret access key", &self.secret_access_key),
            ("bucket name", &self.bucket),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect::<Vec<_>>();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::new(format!(
                "S3 credentials or bucket name missing: {}",
                missing.join(", ")
            )))
        }
    }

    /// Region, falling back to `us-east-1` when blank.
    pub fn effective_region(&self) -> &str {
        let region = self.region.trim();
        if region.is_empty() { "us-east-1" } else { region }
    }
}

/// Storage backend selection and locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Selected backend
    #[serde(default)]
    pub backend: StorageBackendKind,
    /// Root directory of the local backend
    #[serde(default = "default_media_root")]
    pub media_root: String,
    /// Base URL local media is served under
    #[serde(default = "default_media_url")]
    pub media_url: String,
    /// Logical prefix every stored object lives under
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Remote backend settings
    #[serde(default)]
    pub s3: S3Config,
}

fn default_media_root() -> String {
    "media".to_string()
}

fn default_media_url() -> String {
    "/media/".to_string()
}

fn default_prefix() -> String {
    "images".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::default(),
            media_root: default_media_root(),
            media_url: default_media_url(),
            prefix: default_prefix(),
            s3: S3Config::default(),
        }
    }
}

/// LLM provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key; required before the client can be built
    #[serde(default)]
    pub api_key: String,
    /// Base URL of the chat completion API
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Default model
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Completion token budget
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Whether `max_tokens` is sent to the provider
    #[serde(default)]
    pub send_max_tokens: bool,
    /// Transport timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: None,
            send_max_tokens: false,
            timeout_secs: None,
        }
    }
}

/// Persistence settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string; in-memory repositories when absent
    #[serde(default)]
    pub url: Option<String>,
}

/// HTTP surface settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Number of executions returned by the history endpoint
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_bind_address() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_history_limit() -> usize {
    5
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            history_limit: default_history_limit(),
        }
    }
}

/// Top-level Tabula configuration.
///
/// Loaded with a precedence system:
/// 1. Bundled defaults (include_str! from tabula.toml)
/// 2. User config (~/.config/tabula/tabula.toml)
/// 3. Local config (./tabula.toml)
/// 4. Environment variables prefixed `TABULA__`, e.g. `TABULA__LLM__API_KEY`
///
/// # Example
///
/// ```no_run
/// use tabula_core::TabulaConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = TabulaConfig::load()?;
/// println!("Max upload: {} MB", config.upload.max_size_mb);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabulaConfig {
    /// Upload limits
    #[serde(default)]
    pub upload: UploadConfig,
    /// Storage backend
    #[serde(default)]
    pub storage: StorageConfig,
    /// LLM provider
    #[serde(default)]
    pub llm: LlmConfig,
    /// Persistence
    #[serde(default)]
    pub database: DatabaseConfig,
    /// HTTP surface
    #[serde(default)]
    pub server: ServerConfig,
}

const DEFAULT_CONFIG: &str = include_str!("../../../tabula.toml");

impl TabulaConfig {
    /// Load configuration from a specific file path layered over the bundled defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> TabulaResult<Self> {
        debug!("Loading configuration from file");

        Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                ))
            })?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)).into())
    }

    /// Load configuration with precedence: env > current dir > home dir > bundled defaults.
    ///
    /// User config files are optional and silently skipped if not found.
    #[instrument]
    pub fn load() -> TabulaResult<Self> {
        debug!("Loading configuration with precedence: env > current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/tabula/tabula.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder
            .add_source(File::with_name("tabula").required(false))
            .add_source(
                Environment::with_prefix("TABULA")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("upload.allowed_types")
                    .try_parsing(true),
            );

        builder
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)).into())
    }

    /// Check settings that would otherwise only fail on first use.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a missing LLM API key, or missing
    /// S3 credentials when the S3 backend is selected.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.api_key.trim().is_empty() {
            return Err(ConfigError::new("LLM API key is not configured"));
        }
        if self.storage.backend == StorageBackendKind::S3 {
            self.storage.s3.validate()?;
        }
        Ok(())
    }
}
