//! LMDB storage backend for dailyread.
//!
//! Implements all storage traits from `dailyread-store` using the `heed` LMDB bindings.
//! Each logical store maps to one or more LMDB databases within a single environment.

pub mod account;
mod codec;
pub mod config;
pub mod environment;
pub mod error;
pub mod integrity;
mod meta;
pub mod migration;
pub mod source;
pub mod verification;

pub use account::LmdbAccountStore;
pub use config::LmdbConfigStore;
pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use source::LmdbContentSourceStore;
pub use verification::LmdbVerificationCodeStore;
