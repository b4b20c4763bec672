use dailyread_secrets::{CipherError, SecretError};
use dailyread_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("mail is not configured: {0}")]
    NotConfigured(String),

    #[error("mail relay unreachable: {0}")]
    Unreachable(String),

    #[error("mail relay rejected the message (HTTP {status})")]
    Rejected { status: u16, body: String },

    #[error("HTTP client unavailable: {0}")]
    Client(String),

    #[error("mail settings unavailable: {0}")]
    Settings(String),
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error(transparent)]
    Cipher(#[from] CipherError),
}
