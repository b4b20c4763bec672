//! Cryptographic primitives for dailyread.
//!
//! - **AES-256-GCM** envelopes for credentials stored at rest
//! - **SHA-256** for deriving cipher keys and content ids
//! - Random key material and one-time code generation
//! - Constant-time code comparison

pub mod codes;
pub mod encryption;
pub mod error;
pub mod hash;
pub mod keys;

pub use codes::{
    challenge_code, codes_match, codes_match_ignore_case, numeric_code, CHALLENGE_ALPHABET,
};
pub use encryption::{is_envelope, open, seal, ENVELOPE_PREFIX};
pub use error::CryptoError;
pub use hash::{sha256, sha256_hex_prefix, sha256_multi};
pub use keys::{KeyBytes, KEY_LEN};
