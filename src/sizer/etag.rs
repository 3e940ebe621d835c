//! Content fingerprint for conditional requests

use sha2::{Digest, Sha256};

/// Quoted SHA-256 over the encoded bytes followed by the canonical parameter string.
pub fn calculate_etag(encoded: &[u8], params: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(encoded);
    hasher.update(params.as_bytes());
    format!("\"{}\"", hex::encode(hasher.finalize()))
}
