//! Secret material for dailyread.
//!
//! [`SecretStore`] owns the one symmetric key protecting stored
//! third-party credentials. [`CredentialCipher`] wraps it to seal and open
//! credential strings, bootstrapping the key on first use.

pub mod cipher;
pub mod error;
pub mod record;
pub mod store;

pub use cipher::CredentialCipher;
pub use error::{CipherError, SecretError};
pub use record::{KeyOrigin, SecretRecord};
pub use store::SecretStore;
