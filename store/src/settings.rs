//! Typed access to runtime settings kept in the [`ConfigStore`].

use std::str::FromStr;
use std::sync::Arc;

use dailyread_types::{Clock, ConfigEntry};

use crate::{ConfigStore, StoreError};

/// Setting keys. Nothing outside this module spells a key as a literal.
pub mod keys {
    /// Key under which the credential key is persisted.
    pub const CREDENTIAL_KEY: &str = "credential_key";

    pub const MAIL_ENDPOINT: &str = "mail_endpoint";
    pub const MAIL_USERNAME: &str = "mail_username";
    /// Stored as a credential envelope, never plaintext.
    pub const MAIL_PASSWORD: &str = "mail_password";
    pub const MAIL_FROM_ADDRESS: &str = "mail_from_address";
    pub const MAIL_FROM_NAME: &str = "mail_from_name";
    pub const MAIL_ENABLED: &str = "mail_enabled";

    /// Global source polling algorithm (`sequential` or `random`).
    pub const SOURCE_POLLING_ALGORITHM: &str = "source_polling_algorithm";

    /// Every key that [`super::Settings::describe`] knows a description for.
    pub const ALL: [&str; 7] = [
        MAIL_ENDPOINT,
        MAIL_USERNAME,
        MAIL_PASSWORD,
        MAIL_FROM_ADDRESS,
        MAIL_FROM_NAME,
        MAIL_ENABLED,
        SOURCE_POLLING_ALGORITHM,
    ];
}

/// Typed view over a [`ConfigStore`].
#[derive(Clone)]
pub struct Settings {
    store: Arc<dyn ConfigStore>,
    clock: Arc<dyn Clock>,
}

impl Settings {
    pub fn new(store: Arc<dyn ConfigStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &Arc<dyn ConfigStore> {
        &self.store
    }

    pub fn get_string(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.store.get_entry(key)?.map(|entry| entry.value))
    }

    pub fn set_string(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let entry = ConfigEntry::new(value, Self::describe(key), self.clock.now());
        self.store.upsert_entry(key, &entry)
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, StoreError> {
        self.get_parsed(key)
    }

    pub fn set_bool(&self, key: &str, value: bool) -> Result<(), StoreError> {
        self.set_string(key, if value { "true" } else { "false" })
    }

    pub fn get_u64(&self, key: &str) -> Result<Option<u64>, StoreError> {
        self.get_parsed(key)
    }

    pub fn set_u64(&self, key: &str, value: u64) -> Result<(), StoreError> {
        self.set_string(key, &value.to_string())
    }

    /// Parse a stored value. A value that fails to parse is an error,
    /// never silently treated as unset.
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.get_string(key)? {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| StoreError::Serialization(format!("setting {key} has invalid value"))),
        }
    }

    pub fn remove(&self, key: &str) -> Result<bool, StoreError> {
        self.store.delete_entry(key)
    }

    /// Human-readable description recorded alongside a setting row.
    pub fn describe(key: &str) -> &'static str {
        match key {
            keys::CREDENTIAL_KEY => "credential encryption key",
            keys::MAIL_ENDPOINT => "mail relay endpoint URL",
            keys::MAIL_USERNAME => "mail relay username",
            keys::MAIL_PASSWORD => "mail relay password (encrypted)",
            keys::MAIL_FROM_ADDRESS => "sender address for outgoing mail",
            keys::MAIL_FROM_NAME => "sender display name for outgoing mail",
            keys::MAIL_ENABLED => "whether outgoing mail is enabled",
            keys::SOURCE_POLLING_ALGORITHM => "content source polling algorithm",
            _ => "",
        }
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings").finish_non_exhaustive()
    }
}
