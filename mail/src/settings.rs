//! Mail relay settings, persisted in the config table.

use std::fmt;

use dailyread_secrets::CredentialCipher;
use dailyread_store::{keys, Settings};

use crate::MailError;

#[derive(Clone, Default, PartialEq, Eq)]
pub struct MailSettings {
    pub endpoint: Option<String>,
    pub username: Option<String>,
    /// Plaintext in memory only; persisted sealed.
    pub password: Option<String>,
    pub from_address: Option<String>,
    pub from_name: Option<String>,
    pub enabled: bool,
}

/// A partial change to the stored mail settings. `None` leaves a field as is.
#[derive(Clone, Default)]
pub struct MailUpdate {
    pub endpoint: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: Option<String>,
    pub from_name: Option<String>,
    pub enabled: Option<bool>,
}

impl MailUpdate {
    pub fn is_empty(&self) -> bool {
        self.endpoint.is_none()
            && self.username.is_none()
            && self.password.is_none()
            && self.from_address.is_none()
            && self.from_name.is_none()
            && self.enabled.is_none()
    }
}

impl fmt::Debug for MailUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailUpdate")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("from_address", &self.from_address)
            .field("from_name", &self.from_name)
            .field("enabled", &self.enabled)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl MailSettings {
    /// Read every mail key and open the stored password.
    ///
    /// A password that no longer decrypts is treated as not configured.
    /// `mail_enabled` defaults to true when unset.
    pub fn load(settings: &Settings, cipher: &CredentialCipher) -> Result<Self, MailError> {
        let password = match non_empty(settings.get_string(keys::MAIL_PASSWORD)?) {
            Some(sealed) => cipher.decrypt_or_unset(&sealed)?,
            None => None,
        };
        Ok(Self {
            endpoint: non_empty(settings.get_string(keys::MAIL_ENDPOINT)?),
            username: non_empty(settings.get_string(keys::MAIL_USERNAME)?),
            password,
            from_address: non_empty(settings.get_string(keys::MAIL_FROM_ADDRESS)?),
            from_name: non_empty(settings.get_string(keys::MAIL_FROM_NAME)?),
            enabled: settings.get_bool(keys::MAIL_ENABLED)?.unwrap_or(true),
        })
    }

    /// Persist every field. The password is sealed first; `None` stores empty.
    pub fn save(&self, settings: &Settings, cipher: &CredentialCipher) -> Result<(), MailError> {
        let sealed = cipher.encrypt(self.password.as_deref().unwrap_or(""))?;
        settings.set_string(keys::MAIL_ENDPOINT, self.endpoint.as_deref().unwrap_or(""))?;
        settings.set_string(keys::MAIL_USERNAME, self.username.as_deref().unwrap_or(""))?;
        settings.set_string(keys::MAIL_PASSWORD, &sealed)?;
        settings.set_string(keys::MAIL_FROM_ADDRESS, self.from_address.as_deref().unwrap_or(""))?;
        settings.set_string(keys::MAIL_FROM_NAME, self.from_name.as_deref().unwrap_or(""))?;
        settings.set_bool(keys::MAIL_ENABLED, self.enabled)?;
        Ok(())
    }

    /// Persist only the fields present in `update`.
    ///
    /// The stored password is left untouched unless a new one is supplied,
    /// so a sealed credential this process cannot open is never overwritten.
    pub fn apply(update: &MailUpdate, settings: &Settings, cipher: &CredentialCipher) -> Result<(), MailError> {
        if let Some(password) = &update.password {
            let sealed = cipher.encrypt(password)?;
            settings.set_string(keys::MAIL_PASSWORD, &sealed)?;
        }
        let fields = [
            (keys::MAIL_ENDPOINT, &update.endpoint),
            (keys::MAIL_USERNAME, &update.username),
            (keys::MAIL_FROM_ADDRESS, &update.from_address),
            (keys::MAIL_FROM_NAME, &update.from_name),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                settings.set_string(key, value.trim())?;
            }
        }
        if let Some(enabled) = update.enabled {
            settings.set_bool(keys::MAIL_ENABLED, enabled)?;
        }
        Ok(())
    }

    /// Enough is set to attempt a delivery.
    pub fn is_configured(&self) -> bool {
        self.enabled && self.endpoint.is_some() && self.from_address.is_some()
    }
}

impl fmt::Debug for MailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailSettings")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("from_address", &self.from_address)
            .field("from_name", &self.from_name)
            .field("enabled", &self.enabled)
            .finish()
    }
}
