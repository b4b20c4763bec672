//! Nullable stores: thread-safe in-memory storage for testing.

use dailyread_store::{
    newest_valid, next_order_index, sort_sources, AccountStore, ConfigStore, ContentSourceStore,
    NewCode, StoreError, VerificationCodeStore,
};
use dailyread_types::{
    Account, AccountId, CodeId, ConfigEntry, ContentSource, NewAccount, NewContentSource, SourceId,
    Timestamp, VerificationCode, VerificationKind,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// An in-memory config table.
///
/// Can be switched into an unavailable state where every call fails with
/// [`StoreError::Backend`].
pub struct NullConfigStore {
    entries: Mutex<BTreeMap<String, ConfigEntry>>,
    unavailable: AtomicBool,
}

impl NullConfigStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("null config store is unavailable".into()));
        }
        Ok(())
    }
}

impl Default for NullConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for NullConfigStore {
    fn get_entry(&self, key: &str) -> Result<Option<ConfigEntry>, StoreError> {
        self.check()?;
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn upsert_entry(&self, key: &str, entry: &ConfigEntry) -> Result<(), StoreError> {
        self.check()?;
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), entry.clone());
        Ok(())
    }

    fn insert_if_absent(&self, key: &str, entry: &ConfigEntry) -> Result<ConfigEntry, StoreError> {
        self.check()?;
        Ok(self
            .entries
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_insert_with(|| entry.clone())
            .clone())
    }

    fn delete_entry(&self, key: &str) -> Result<bool, StoreError> {
        self.check()?;
        Ok(self.entries.lock().unwrap().remove(key).is_some())
    }

    fn list_entries(&self) -> Result<Vec<(String, ConfigEntry)>, StoreError> {
        self.check()?;
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

/// An in-memory verification code table.
pub struct NullCodeStore {
    rows: Mutex<(CodeId, Vec<VerificationCode>)>,
}

impl NullCodeStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new((0, Vec::new())),
        }
    }

    /// Every row, in insertion order.
    pub fn all(&self) -> Vec<VerificationCode> {
        self.rows.lock().unwrap().1.clone()
    }
}

impl Default for NullCodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VerificationCodeStore for NullCodeStore {
    fn insert_code(&self, new: NewCode) -> Result<VerificationCode, StoreError> {
        let mut guard = self.rows.lock().unwrap();
        guard.0 += 1;
        let row = VerificationCode {
            id: guard.0,
            subject: new.subject,
            code: new.code,
            kind: new.kind,
            expires_at: new.expires_at,
            used: false,
            created_at: new.created_at,
        };
        guard.1.push(row.clone());
        Ok(row)
    }

    fn get_code(&self, id: CodeId) -> Result<Option<VerificationCode>, StoreError> {
        Ok(self.rows.lock().unwrap().1.iter().find(|r| r.id == id).cloned())
    }

    fn find_valid(
        &self,
        subject: &str,
        code: &str,
        kind: Option<VerificationKind>,
        now: Timestamp,
    ) -> Result<Option<VerificationCode>, StoreError> {
        let guard = self.rows.lock().unwrap();
        let rows = guard.1.iter().filter(|r| r.subject == subject);
        Ok(newest_valid(rows, code, kind, now).cloned())
    }

    fn mark_used(&self, id: CodeId) -> Result<bool, StoreError> {
        let mut guard = self.rows.lock().unwrap();
        let row = guard
            .1
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("verification code {id}")))?;
        let flipped = !row.used;
        row.used = true;
        Ok(flipped)
    }

    fn consume_valid(
        &self,
        subject: &str,
        code: &str,
        kind: Option<VerificationKind>,
        now: Timestamp,
    ) -> Result<Option<VerificationCode>, StoreError> {
        let mut guard = self.rows.lock().unwrap();
        let id = newest_valid(guard.1.iter().filter(|r| r.subject == subject), code, kind, now)
            .map(|r| r.id);
        let Some(id) = id else {
            return Ok(None);
        };
        let row = guard.1.iter_mut().find(|r| r.id == id);
        Ok(row.map(|r| {
            r.used = true;
            r.clone()
        }))
    }

    fn sweep(&self, now: Timestamp) -> Result<u64, StoreError> {
        let mut guard = self.rows.lock().unwrap();
        let before = guard.1.len();
        guard.1.retain(|r| !r.is_reclaimable(now));
        Ok((before - guard.1.len()) as u64)
    }

    fn codes_for_subject(&self, subject: &str) -> Result<Vec<VerificationCode>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .1
            .iter()
            .filter(|r| r.subject == subject)
            .cloned()
            .collect())
    }
}

/// An in-memory content source table.
pub struct NullSourceStore {
    sources: Mutex<(SourceId, Vec<ContentSource>)>,
}

impl NullSourceStore {
    pub fn new() -> Self {
        Self {
            sources: Mutex::new((0, Vec::new())),
        }
    }
}

impl Default for NullSourceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentSourceStore for NullSourceStore {
    fn put_source(&self, new: NewContentSource, now: Timestamp) -> Result<ContentSource, StoreError> {
        let mut guard = self.sources.lock().unwrap();
        let order_index = new
            .order_index
            .unwrap_or_else(|| next_order_index(&guard.1));
        guard.0 += 1;
        let source = ContentSource {
            id: guard.0,
            name: new.name,
            url: new.url,
            enabled: new.enabled,
            order_index,
            polling_algorithm: new.polling_algorithm,
            created_at: now,
        };
        guard.1.push(source.clone());
        Ok(source)
    }

    fn get_source(&self, id: SourceId) -> Result<Option<ContentSource>, StoreError> {
        Ok(self.sources.lock().unwrap().1.iter().find(|s| s.id == id).cloned())
    }

    fn list_sources(&self) -> Result<Vec<ContentSource>, StoreError> {
        let mut sources = self.sources.lock().unwrap().1.clone();
        sort_sources(&mut sources);
        Ok(sources)
    }

    fn set_enabled(&self, id: SourceId, enabled: bool) -> Result<ContentSource, StoreError> {
        let mut guard = self.sources.lock().unwrap();
        let source = guard
            .1
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("content source {id}")))?;
        source.enabled = enabled;
        Ok(source.clone())
    }
}

/// An in-memory account table with unique usernames and emails.
pub struct NullAccountStore {
    accounts: Mutex<(AccountId, Vec<Account>)>,
}

impl NullAccountStore {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new((0, Vec::new())),
        }
    }
}

impl Default for NullAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountStore for NullAccountStore {
    fn create_account(&self, new: NewAccount, now: Timestamp) -> Result<Account, StoreError> {
        let mut guard = self.accounts.lock().unwrap();
        if guard.1.iter().any(|a| a.username == new.username) {
            return Err(StoreError::Duplicate(format!("username {}", new.username)));
        }
        if let Some(email) = &new.email {
            if guard.1.iter().any(|a| a.email.as_ref() == Some(email)) {
                return Err(StoreError::Duplicate(format!("email {email}")));
            }
        }
        guard.0 += 1;
        let account = Account {
            id: guard.0,
            username: new.username,
            email: new.email,
            email_verified: new.email_verified,
            password_hash: new.password_hash,
            created_at: now,
        };
        guard.1.push(account.clone());
        Ok(account)
    }

    fn get_account(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.lock().unwrap().1.iter().find(|a| a.id == id).cloned())
    }

    fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .1
            .iter()
            .find(|a| a.username == username)
            .cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .1
            .iter()
            .find(|a| a.email.as_deref() == Some(email))
            .cloned())
    }

    fn set_email(&self, id: AccountId, email: &str) -> Result<Account, StoreError> {
        let mut guard = self.accounts.lock().unwrap();
        if guard
            .1
            .iter()
            .any(|a| a.id != id && a.email.as_deref() == Some(email))
        {
            return Err(StoreError::Duplicate(format!("email {email}")));
        }
        let account = guard
            .1
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("account {id}")))?;
        account.email = Some(email.to_string());
        account.email_verified = true;
        Ok(account.clone())
    }

    fn set_password_hash(&self, id: AccountId, password_hash: &str) -> Result<Account, StoreError> {
        let mut guard = self.accounts.lock().unwrap();
        let account = guard
            .1
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("account {id}")))?;
        account.password_hash = password_hash.to_string();
        Ok(account.clone())
    }
}
