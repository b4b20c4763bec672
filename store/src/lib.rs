//! Abstract storage traits for dailyread.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits.

pub mod account;
pub mod config;
pub mod error;
pub mod settings;
pub mod source;
pub mod verification;

pub use account::AccountStore;
pub use config::ConfigStore;
pub use error::StoreError;
pub use settings::{keys, Settings};
pub use source::{next_order_index, sort_sources, ContentSourceStore};
pub use verification::{newest_valid, NewCode, VerificationCodeStore};
