//! Account storage trait.

use dailyread_types::{Account, AccountId, NewAccount, Timestamp};

use crate::StoreError;

/// Usernames and emails are unique; violating either is [`StoreError::Duplicate`].
pub trait AccountStore: Send + Sync {
    fn create_account(&self, new: NewAccount, now: Timestamp) -> Result<Account, StoreError>;

    fn get_account(&self, id: AccountId) -> Result<Option<Account>, StoreError>;

    fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError>;

    fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    /// Replace the account's email and mark it verified.
    fn set_email(&self, id: AccountId, email: &str) -> Result<Account, StoreError>;

    fn set_password_hash(&self, id: AccountId, password_hash: &str) -> Result<Account, StoreError>;
}
