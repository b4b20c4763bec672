//! Nullable infrastructure for deterministic testing.
//!
//! All external dependencies (clock, storage, mail, content sources,
//! sessions) are abstracted behind traits. This crate provides
//! test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod mail;
pub mod session;
pub mod sources;
pub mod store;

pub use clock::NullClock;
pub use mail::NullMailer;
pub use session::NullSession;
pub use sources::NullFetcher;
pub use store::{NullAccountStore, NullCodeStore, NullConfigStore, NullSourceStore};
