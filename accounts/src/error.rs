use dailyread_mail::DeliveryError;
use dailyread_store::StoreError;
use dailyread_verification::{ChallengeError, VerificationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("challenge failed: {0}")]
    Challenge(#[from] ChallengeError),

    #[error("invalid or expired code")]
    CodeInvalid,

    /// Unknown username and wrong password are reported the same way.
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("email address is already registered")]
    EmailTaken,

    #[error("username is already taken")]
    UsernameTaken,

    #[error("account not found")]
    NotFound,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("delivery failed: {0}")]
    DeliveryFailed(#[from] DeliveryError),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<VerificationError> for AccountError {
    fn from(e: VerificationError) -> Self {
        match e {
            VerificationError::CodeInvalid => AccountError::CodeInvalid,
            VerificationError::Store(inner) => AccountError::Store(inner),
        }
    }
}
