//! Content hashing.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of `data`.
///
/// Depends only on the bytes, never on filename or content type.
///
/// ```
/// let hash = tabula_storage::compute_hash(b"abc");
/// assert_eq!(hash.len(), 64);
/// assert_eq!(hash, tabula_storage::compute_hash(b"abc"));
/// ```
pub fn compute_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
