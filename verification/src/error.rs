use dailyread_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerificationError {
    /// Wrong, expired and already-used codes are deliberately indistinguishable.
    #[error("invalid or expired code")]
    CodeInvalid,

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChallengeError {
    #[error("no challenge has been issued")]
    Missing,

    #[error("challenge expired")]
    Expired,

    #[error("challenge answer does not match")]
    Mismatch,

    #[error("challenge image could not be rendered: {0}")]
    Render(String),
}
