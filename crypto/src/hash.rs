//! SHA-256 hashing.

use sha2::{Digest, Sha256};

/// Compute a SHA-256 hash of arbitrary data.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn sha256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Hex encoding of the first `bytes` bytes of `sha256_multi(parts)`.
pub fn sha256_hex_prefix(parts: &[&[u8]], bytes: usize) -> String {
    let digest = sha256_multi(parts);
    hex::encode(&digest[..bytes.min(digest.len())])
}
