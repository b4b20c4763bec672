//! LMDB implementation of AccountStore.
//!
//! `account_usernames` and `account_emails` map the unique fields to the
//! big-endian account id and are kept in step within each write.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, RoTxn, RwTxn};

use dailyread_store::{AccountStore, StoreError};
use dailyread_types::{Account, AccountId, NewAccount, Timestamp};

use crate::codec::{decode, decode_id, encode, id_key};
use crate::meta::{allocate_id, NEXT_ACCOUNT_ID};
use crate::LmdbError;

pub struct LmdbAccountStore {
    pub(crate) env: Arc<Env>,
    pub(crate) accounts_db: Database<Bytes, Bytes>,
    pub(crate) account_emails_db: Database<Bytes, Bytes>,
    pub(crate) account_usernames_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbAccountStore {
    fn load(&self, txn: &RoTxn, id: AccountId) -> Result<Option<Account>, LmdbError> {
        match self.accounts_db.get(txn, &id_key(id))? {
            Some(bytes) => Ok(Some(decode(bytes)?)),
            None => Ok(None),
        }
    }

    fn load_indexed(
        &self,
        txn: &RoTxn,
        index: &Database<Bytes, Bytes>,
        key: &str,
    ) -> Result<Option<Account>, LmdbError> {
        let id = match index.get(txn, key.as_bytes())? {
            Some(bytes) => decode_id(bytes)?,
            None => return Ok(None),
        };
        self.load(txn, id)
    }

    fn require(&self, txn: &RoTxn, id: AccountId) -> Result<Account, LmdbError> {
        self.load(txn, id)?
            .ok_or_else(|| LmdbError::NotFound(format!("account {id}")))
    }

    fn save(&self, wtxn: &mut RwTxn, account: &Account) -> Result<(), LmdbError> {
        let value = encode(account)?;
        self.accounts_db.put(wtxn, &id_key(account.id), &value)?;
        Ok(())
    }
}

impl AccountStore for LmdbAccountStore {
    fn create_account(&self, new: NewAccount, now: Timestamp) -> Result<Account, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if self
            .account_usernames_db
            .get(&wtxn, new.username.as_bytes())
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Duplicate(format!("username {}", new.username)));
        }
        if let Some(email) = &new.email {
            if self
                .account_emails_db
                .get(&wtxn, email.as_bytes())
                .map_err(LmdbError::from)?
                .is_some()
            {
                return Err(StoreError::Duplicate(format!("email {email}")));
            }
        }

        let id = allocate_id(&self.meta_db, &mut wtxn, NEXT_ACCOUNT_ID)?;
        let account = Account {
            id,
            username: new.username,
            email: new.email,
            email_verified: new.email_verified,
            password_hash: new.password_hash,
            created_at: now,
        };
        self.save(&mut wtxn, &account)?;
        self.account_usernames_db
            .put(&mut wtxn, account.username.as_bytes(), &id_key(id))
            .map_err(LmdbError::from)?;
        if let Some(email) = &account.email {
            self.account_emails_db
                .put(&mut wtxn, email.as_bytes(), &id_key(id))
                .map_err(LmdbError::from)?;
        }
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(account)
    }

    fn get_account(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.load(&rtxn, id)?)
    }

    fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.load_indexed(&rtxn, &self.account_usernames_db, username)?)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.load_indexed(&rtxn, &self.account_emails_db, email)?)
    }

    fn set_email(&self, id: AccountId, email: &str) -> Result<Account, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut account = self.require(&wtxn, id)?;

        let owner = self
            .account_emails_db
            .get(&wtxn, email.as_bytes())
            .map_err(LmdbError::from)?
            .map(decode_id)
            .transpose()?;
        if owner.is_some_and(|owner| owner != id) {
            return Err(StoreError::Duplicate(format!("email {email}")));
        }

        if let Some(old) = account.email.take() {
            self.account_emails_db
                .delete(&mut wtxn, old.as_bytes())
                .map_err(LmdbError::from)?;
        }
        account.email = Some(email.to_string());
        account.email_verified = true;
        self.save(&mut wtxn, &account)?;
        self.account_emails_db
            .put(&mut wtxn, email.as_bytes(), &id_key(id))
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(account)
    }

    fn set_password_hash(&self, id: AccountId, password_hash: &str) -> Result<Account, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut account = self.require(&wtxn, id)?;
        account.password_hash = password_hash.to_string();
        self.save(&mut wtxn, &account)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(account)
    }
}
