//! Collision-resistant storage filenames.

use std::path::Path;
use uuid::Uuid;

/// Replace the stem of `original` with a random token, keeping the extension.
///
/// Only the final extension survives, with its case preserved; directories and
/// the original stem are discarded, so the result is always a bare filename.
///
/// ```
/// let name = tabula_storage::unique_filename("photo.PNG");
/// assert!(name.ends_with(".PNG"));
/// assert!(!name.starts_with("photo"));
/// ```
pub fn unique_filename(original: &str) -> String {
    let token = Uuid::new_v4().simple().to_string();
    match Path::new(original).extension().and_then(|ext| ext.to_str()) {
        Some(ext) if !ext.is_empty() => format!("{}.{}", token, ext),
        _ => token,
    }
}
