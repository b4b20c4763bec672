//! Site accounts.

use serde::{Deserialize, Serialize};

use crate::Timestamp;

pub type AccountId = u64;

/// A registered reader.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub email: Option<String>,
    pub email_verified: bool,
    /// Argon2id hash in PHC string format.
    pub password_hash: String,
    pub created_at: Timestamp,
}

/// Fields supplied when creating an account.
#[derive(Clone, Debug)]
pub struct NewAccount {
    pub username: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub password_hash: String,
}
