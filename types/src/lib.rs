//! Fundamental types for dailyread.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! timestamps and clocks, verification codes, content sources, accounts, and
//! entries of the key/value configuration table.

pub mod account;
pub mod article;
pub mod config;
pub mod error;
pub mod source;
pub mod time;
pub mod verification;

pub use account::{Account, AccountId, NewAccount};
pub use article::DailyArticle;
pub use config::ConfigEntry;
pub use error::ParseError;
pub use source::{ContentSource, NewContentSource, PollingAlgorithm, SourceId};
pub use time::{Clock, SystemClock, Timestamp};
pub use verification::{CodeId, VerificationCode, VerificationKind};
