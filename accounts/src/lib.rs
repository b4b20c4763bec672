//! Account workflows.
//!
//! Each workflow composes the challenge gate, the verification ledger and
//! the mail transport over an [`AccountStore`](dailyread_store::AccountStore).
//! Profile management is not part of this crate.

pub mod error;
pub mod password;
pub mod validate;
pub mod workflows;

pub use error::AccountError;
pub use password::PasswordHashing;
pub use workflows::{email_change_subject, AccountWorkflows};
