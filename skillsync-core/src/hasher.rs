//! Git blob hashing.
//!
//! Local content is hashed exactly the way the remote store names blobs:
//! `SHA-1("blob " + <decimal length> + "\0" + <bytes>)`, hex encoded. Any other
//! scheme would make every local/remote comparison a mismatch.

use std::path::Path;

use sha1::{Digest, Sha1};

use crate::error::{io_err, CoreError};

/// Sentinel for content that could not be read. Never equal to a real blob
/// hash, so unreadable files always compare as changed.
pub const UNKNOWN_HASH: &str = "unknown";

/// Blob hash of `content`.
pub fn blob_hash(content: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(format!("blob {}\0", content.len()).as_bytes());
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Blob hash of the file at `path`, propagating read failures.
pub fn try_hash_file(path: &Path) -> Result<String, CoreError> {
    let content = std::fs::read(path).map_err(|e| io_err(path, e))?;
    Ok(blob_hash(&content))
}

/// Blob hash of the file at `path`, or [`UNKNOWN_HASH`] if it cannot be read.
pub fn hash_file(path: &Path) -> String {
    match try_hash_file(path) {
        Ok(hash) => hash,
        Err(err) => {
            tracing::debug!("hash unavailable, treating as changed: {err}");
            UNKNOWN_HASH.to_string()
        }
    }
}
