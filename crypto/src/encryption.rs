//! AES-256-GCM envelopes for credentials at rest.
//!
//! Envelope format: `enc:v1:` followed by base64 of `nonce (12 bytes) || ciphertext+tag`.
//! A fresh random nonce is drawn for every seal, so sealing the same
//! plaintext twice yields different envelopes.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::{CryptoError, KeyBytes};

/// Marker prefix on every envelope.
pub const ENVELOPE_PREFIX: &str = "enc:v1:";

/// AES-GCM nonce length in bytes (96 bits).
const NONCE_LEN: usize = 12;
/// Poly1305-style GCM tag length in bytes.
const TAG_LEN: usize = 16;

/// Whether `s` looks like an envelope produced by [`seal`].
pub fn is_envelope(s: &str) -> bool {
    s.starts_with(ENVELOPE_PREFIX)
}

/// Encrypt `plaintext` under the cipher key derived from `key`.
pub fn seal(key: &KeyBytes, plaintext: &[u8]) -> Result<String, CryptoError> {
    let cipher_key = key.cipher_key();
    let cipher = Aes256Gcm::new_from_slice(cipher_key.as_slice())
        .map_err(|e| CryptoError::InvalidKey(format!("AES key init failed: {e}")))?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| CryptoError::Encryption)?;

    let mut payload = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    payload.extend_from_slice(&nonce_bytes);
    payload.extend_from_slice(&ciphertext);
    Ok(format!("{ENVELOPE_PREFIX}{}", STANDARD.encode(payload)))
}

/// Decrypt an envelope produced by [`seal`].
///
/// Never panics on foreign input: malformed envelopes and authentication
/// failures are reported as errors.
pub fn open(key: &KeyBytes, envelope: &str) -> Result<Vec<u8>, CryptoError> {
    let encoded = envelope
        .strip_prefix(ENVELOPE_PREFIX)
        .ok_or_else(|| CryptoError::Malformed("missing envelope prefix".into()))?;
    let payload = STANDARD
        .decode(encoded.trim())
        .map_err(|e| CryptoError::Malformed(format!("invalid base64: {e}")))?;
    if payload.len() < NONCE_LEN + TAG_LEN {
        return Err(CryptoError::Malformed(format!(
            "envelope too short: {} bytes",
            payload.len()
        )));
    }

    let (nonce_bytes, ciphertext) = payload.split_at(NONCE_LEN);
    let cipher_key = key.cipher_key();
    let cipher = Aes256Gcm::new_from_slice(cipher_key.as_slice())
        .map_err(|e| CryptoError::InvalidKey(format!("AES key init failed: {e}")))?;

    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| CryptoError::Authentication)
}
