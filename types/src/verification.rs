//! One-time verification codes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{ParseError, Timestamp};

/// Row identifier of a stored verification code.
pub type CodeId = u64;

/// What a verification code proves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerificationKind {
    /// Ownership of an email address at registration time.
    RegisterEmail,
    /// Ownership of a new email address for an existing account.
    ChangeEmail,
    /// Authorization to reset an account password.
    PasswordReset,
}

impl VerificationKind {
    pub const ALL: [VerificationKind; 3] = [
        VerificationKind::RegisterEmail,
        VerificationKind::ChangeEmail,
        VerificationKind::PasswordReset,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RegisterEmail => "register_email",
            Self::ChangeEmail => "change_email",
            Self::PasswordReset => "password_reset",
        }
    }
}

impl fmt::Display for VerificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "register_email" => Ok(Self::RegisterEmail),
            "change_email" => Ok(Self::ChangeEmail),
            "password_reset" => Ok(Self::PasswordReset),
            other => Err(ParseError::UnknownKind(other.to_string())),
        }
    }
}

/// A stored verification code.
///
/// Valid while `used == false` and `now < expires_at`. Both `used` and
/// expiry are terminal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationCode {
    pub id: CodeId,
    /// User identifier and/or email address the code was issued to.
    pub subject: String,
    pub code: String,
    pub kind: VerificationKind,
    pub expires_at: Timestamp,
    pub used: bool,
    pub created_at: Timestamp,
}

impl VerificationCode {
    pub fn is_live(&self, now: Timestamp) -> bool {
        !self.used && now < self.expires_at
    }

    /// Whether a sweep may reclaim this row.
    pub fn is_reclaimable(&self, now: Timestamp) -> bool {
        !self.is_live(now)
    }
}
