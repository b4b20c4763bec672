//! At-rest encryption of credential strings.

use std::sync::{Mutex, OnceLock};

use dailyread_crypto::{open, seal, KeyBytes};

use crate::{CipherError, SecretError, SecretRecord, SecretStore};

/// Seals and opens credential strings under the deployment key.
///
/// The key is fetched from the [`SecretStore`] on first use and then held
/// for the life of the value. Construct one per process and share it.
pub struct CredentialCipher {
    secrets: SecretStore,
    key: OnceLock<SecretRecord>,
    init: Mutex<()>,
}

impl CredentialCipher {
    pub fn new(secrets: SecretStore) -> Self {
        Self {
            secrets,
            key: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    /// The cached key record, bootstrapping it if this is the first use.
    ///
    /// Concurrent first callers wait on one bootstrap. A failed bootstrap
    /// is not cached, so the next call tries again.
    pub fn record(&self) -> Result<&SecretRecord, SecretError> {
        if let Some(record) = self.key.get() {
            return Ok(record);
        }
        let _guard = self.init.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(record) = self.key.get() {
            return Ok(record);
        }
        let record = self.secrets.get_or_create_key()?;
        tracing::debug!(origin = %record.origin, "credential key loaded");
        Ok(self.key.get_or_init(|| record))
    }

    pub fn is_initialized(&self) -> bool {
        self.key.get().is_some()
    }

    fn key(&self) -> Result<&KeyBytes, SecretError> {
        Ok(&self.record()?.key)
    }

    /// Seal `plaintext`. The empty string stays empty.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }
        seal(self.key()?, plaintext.as_bytes()).map_err(|e| CipherError::Encrypt(e.to_string()))
    }

    /// Open `ciphertext`. The empty string stays empty.
    ///
    /// Malformed input and input sealed under another key both fail with
    /// [`CipherError::Decrypt`]; nothing is ever returned in their place.
    pub fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError> {
        if ciphertext.is_empty() {
            return Ok(String::new());
        }
        let plaintext = open(self.key()?, ciphertext).map_err(|e| CipherError::Decrypt(e.to_string()))?;
        String::from_utf8(plaintext).map_err(|_| CipherError::Decrypt("plaintext is not UTF-8".into()))
    }

    /// Open a stored credential, treating an undecryptable one as unset.
    ///
    /// Only an unavailable secret store is reported as an error.
    pub fn decrypt_or_unset(&self, ciphertext: &str) -> Result<Option<String>, SecretError> {
        match self.decrypt(ciphertext) {
            Ok(plaintext) if plaintext.is_empty() => Ok(None),
            Ok(plaintext) => Ok(Some(plaintext)),
            Err(CipherError::Secret(e)) => Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "stored credential is unreadable, treating it as not configured");
                Ok(None)
            }
        }
    }
}

impl std::fmt::Debug for CredentialCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCipher")
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}
