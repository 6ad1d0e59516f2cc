use std::path::Path;

use base64::Engine;
use sha2::{Digest, Sha256};

/// SHA-256 of raw bytes, base64 encoded. Used as the extraction cache key.
pub fn content_hash(bytes: &[u8]) -> String {
    let hash = Sha256::digest(bytes);
    base64::engine::general_purpose::STANDARD.encode(hash)
}

/// Content hash of a file on disk. The name plays no part in the key.
pub fn compute_content_hash(path: &Path) -> Result<String, std::io::Error> {
    let content = std::fs::read(path)?;
    Ok(content_hash(&content))
}
