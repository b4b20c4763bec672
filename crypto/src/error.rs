use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("envelope is malformed: {0}")]
    Malformed(String),

    #[error("authentication failed: wrong key or corrupted data")]
    Authentication,

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("encryption failed")]
    Encryption,
}
