//! Image validation and pluggable upload storage for Tabula.
//!
//! Uploads are validated against configured limits, then written to one of two
//! interchangeable backends chosen once at startup:
//!
//! - **Local**: files under a media root, served from a media base URL
//! - **S3**: objects in a bucket, addressed by a public virtual-hosted URL
//!
//! Both backends replace the uploaded filename with a random token, keeping
//! only the extension.
//!
//! # Example
//!
//! ```rust,no_run
//! use tabula_core::StorageConfig;
//! use tabula_storage::build_storage;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = build_storage(&StorageConfig::default())?;
//! let stored = storage.store(b"\x89PNG...", "photo.png", "image/png").await?;
//! println!("stored at {}", stored.url());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod filename;
mod filesystem;
mod hash;
mod s3;
mod storage;
mod upload;
mod validator;

pub use filename::unique_filename;
pub use filesystem::FileSystemStorage;
pub use hash::compute_hash;
pub use s3::{AwsConnector, AwsObjectStore, ObjectStore, ObjectStoreConnector, S3Storage};
pub use storage::{ImageStorage, StoredImage, build_storage};
pub use tabula_error::{StorageError, StorageErrorKind};
pub use upload::UploadedFile;
pub use validator::ImageValidator;
