//! Symmetric key material.
//!
//! [`KeyBytes`] holds the deployment's credential key. Its contents are
//! opaque: either 32 freshly generated random bytes, or whatever bytes the
//! operator supplied. The AES-256 key is always derived from them with
//! SHA-256, so any non-empty key material is usable.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::hash::sha256_multi;
use crate::CryptoError;

/// Length of generated key material in bytes.
pub const KEY_LEN: usize = 32;

const CIPHER_KEY_DOMAIN: &[u8] = b"dailyread-credential-key-v1";
const FINGERPRINT_DOMAIN: &[u8] = b"dailyread-key-fingerprint-v1";

/// Opaque key bytes. Zeroed on drop, redacted in `Debug`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyBytes {
    bytes: Vec<u8>,
}

impl KeyBytes {
    /// Generate fresh key material from the OS random source.
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Wrap raw key material. Empty material is rejected.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, CryptoError> {
        if bytes.is_empty() {
            return Err(CryptoError::InvalidKey("key material is empty".into()));
        }
        Ok(Self { bytes })
    }

    /// Use an operator-supplied key string verbatim (surrounding whitespace trimmed).
    pub fn from_operator(raw: &str) -> Result<Self, CryptoError> {
        Self::from_bytes(raw.trim().as_bytes().to_vec())
    }

    /// Decode the persisted (base64) form.
    pub fn decode(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CryptoError::InvalidKey(format!("invalid base64: {e}")))?;
        Self::from_bytes(bytes)
    }

    /// Encode for persistence in the configuration table.
    pub fn encode(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The 32-byte AES-256 key derived from this material.
    pub fn cipher_key(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(sha256_multi(&[CIPHER_KEY_DOMAIN, &self.bytes]))
    }

    /// A short, non-reversible identifier safe to log.
    pub fn fingerprint(&self) -> String {
        let digest = sha256_multi(&[FINGERPRINT_DOMAIN, &self.bytes]);
        hex::encode(&digest[..4])
    }
}

impl PartialEq for KeyBytes {
    fn eq(&self, other: &Self) -> bool {
        self.bytes.ct_eq(&other.bytes).into()
    }
}

impl Eq for KeyBytes {}

impl fmt::Debug for KeyBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyBytes(<redacted {} bytes>)", self.bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_differ() {
        let a = KeyBytes::generate();
        let b = KeyBytes::generate();
        assert_eq!(a.as_bytes().len(), KEY_LEN);
        assert_ne!(a, b);
    }

    #[test]
    fn encode_decode_roundtrip() {
        let key = KeyBytes::generate();
        let decoded = KeyBytes::decode(&key.encode()).unwrap();
        assert_eq!(decoded, key);
        assert_eq!(decoded.cipher_key().as_slice(), key.cipher_key().as_slice());
    }

    #[test]
    fn operator_key_is_used_verbatim() {
        let key = KeyBytes::from_operator("  correct horse battery staple \n").unwrap();
        assert_eq!(key.as_bytes(), b"correct horse battery staple");
    }

    #[test]
    fn empty_material_rejected() {
        assert!(KeyBytes::from_operator("   ").is_err());
        assert!(KeyBytes::decode("").is_err());
        assert!(KeyBytes::decode("not base64!!").is_err());
    }

    #[test]
    fn debug_never_shows_bytes() {
        let key = KeyBytes::from_operator("super-secret").unwrap();
        let printed = format!("{key:?}");
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("redacted"));
    }

    #[test]
    fn fingerprint_is_stable_and_short() {
        let key = KeyBytes::from_operator("k").unwrap();
        assert_eq!(key.fingerprint(), key.clone().fingerprint());
        assert_eq!(key.fingerprint().len(), 8);
    }
}
