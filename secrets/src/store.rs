//! Bootstrap and persistence of the credential key.

use std::sync::Arc;

use dailyread_crypto::KeyBytes;
use dailyread_store::{keys, ConfigStore, Settings};
use dailyread_types::{Clock, ConfigEntry};

use crate::{KeyOrigin, SecretError, SecretRecord};

/// Serves the single symmetric key for this deployment.
///
/// Resolution order on every call:
/// 1. the operator key, used verbatim and never written anywhere;
/// 2. the key persisted under [`keys::CREDENTIAL_KEY`];
/// 3. a freshly generated key, persisted with an atomic insert-if-absent.
///    When two callers race here, both return the row that was stored.
#[derive(Clone)]
pub struct SecretStore {
    config: Arc<dyn ConfigStore>,
    clock: Arc<dyn Clock>,
    operator_key: Option<KeyBytes>,
}

impl SecretStore {
    pub fn new(config: Arc<dyn ConfigStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            operator_key: None,
        }
    }

    /// Use an operator-supplied key. An empty or whitespace value is ignored.
    pub fn with_operator_key(mut self, raw: Option<&str>) -> Result<Self, SecretError> {
        self.operator_key = match raw.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(
                KeyBytes::from_operator(raw)
                    .map_err(|e| SecretError::InvalidOperatorKey(e.to_string()))?,
            ),
            None => None,
        };
        Ok(self)
    }

    pub fn has_operator_key(&self) -> bool {
        self.operator_key.is_some()
    }

    pub fn get_or_create_key(&self) -> Result<SecretRecord, SecretError> {
        if let Some(key) = &self.operator_key {
            return Ok(SecretRecord {
                key: key.clone(),
                origin: KeyOrigin::Operator,
                persisted_at: None,
            });
        }

        if let Some(entry) = self.config.get_entry(keys::CREDENTIAL_KEY)? {
            return Self::decode_entry(&entry, KeyOrigin::Persisted);
        }

        let candidate = KeyBytes::generate();
        let entry = ConfigEntry::new(
            candidate.encode(),
            Settings::describe(keys::CREDENTIAL_KEY),
            self.clock.now(),
        );
        let stored = self.config.insert_if_absent(keys::CREDENTIAL_KEY, &entry)?;
        if stored.value == entry.value {
            tracing::info!(fingerprint = %candidate.fingerprint(), "generated and persisted a new credential key");
            Self::decode_entry(&stored, KeyOrigin::Generated)
        } else {
            tracing::debug!("lost credential key bootstrap race, using the stored key");
            Self::decode_entry(&stored, KeyOrigin::Persisted)
        }
    }

    fn decode_entry(entry: &ConfigEntry, origin: KeyOrigin) -> Result<SecretRecord, SecretError> {
        let key = KeyBytes::decode(&entry.value).map_err(|e| SecretError::Corrupt(e.to_string()))?;
        Ok(SecretRecord {
            key,
            origin,
            persisted_at: Some(entry.updated_at),
        })
    }
}

impl std::fmt::Debug for SecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretStore")
            .field("operator_key", &self.operator_key.is_some())
            .finish_non_exhaustive()
    }
}
