use dailyread_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretError {
    /// The durable store could not be read or written.
    #[error("secret store unavailable: {0}")]
    Unavailable(#[from] StoreError),

    /// A persisted key exists but cannot be decoded. It is never replaced.
    #[error("persisted credential key is corrupt: {0}")]
    Corrupt(String),

    #[error("operator-supplied key is invalid: {0}")]
    InvalidOperatorKey(String),
}

#[derive(Debug, Error)]
pub enum CipherError {
    #[error(transparent)]
    Secret(#[from] SecretError),

    /// The ciphertext is malformed or was sealed under another key.
    #[error("credential could not be decrypted: {0}")]
    Decrypt(String),

    #[error("credential could not be encrypted: {0}")]
    Encrypt(String),
}
