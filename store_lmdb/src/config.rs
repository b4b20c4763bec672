//! LMDB implementation of ConfigStore.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use dailyread_store::{ConfigStore, StoreError};
use dailyread_types::ConfigEntry;

use crate::codec::{decode, encode};
use crate::LmdbError;

pub struct LmdbConfigStore {
    pub(crate) env: Arc<Env>,
    pub(crate) config_db: Database<Bytes, Bytes>,
}

impl ConfigStore for LmdbConfigStore {
    fn get_entry(&self, key: &str) -> Result<Option<ConfigEntry>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .config_db
            .get(&rtxn, key.as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(decode(bytes)?)),
            None => Ok(None),
        }
    }

    fn upsert_entry(&self, key: &str, entry: &ConfigEntry) -> Result<(), StoreError> {
        let value = encode(entry)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.config_db
            .put(&mut wtxn, key.as_bytes(), &value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn insert_if_absent(&self, key: &str, entry: &ConfigEntry) -> Result<ConfigEntry, StoreError> {
        // LMDB admits one writer at a time, so the read and the insert below
        // cannot interleave with another caller's.
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let existing = self
            .config_db
            .get(&wtxn, key.as_bytes())
            .map_err(LmdbError::from)?
            .map(decode::<ConfigEntry>)
            .transpose()?;
        if let Some(existing) = existing {
            wtxn.abort();
            return Ok(existing);
        }
        let value = encode(entry)?;
        self.config_db
            .put(&mut wtxn, key.as_bytes(), &value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(entry.clone())
    }

    fn delete_entry(&self, key: &str) -> Result<bool, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let removed = self
            .config_db
            .delete(&mut wtxn, key.as_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(removed)
    }

    fn list_entries(&self) -> Result<Vec<(String, ConfigEntry)>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut entries = Vec::new();
        for result in self.config_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (key, value) = result.map_err(LmdbError::from)?;
            let key = String::from_utf8(key.to_vec())
                .map_err(|_| StoreError::Corruption("config key is not UTF-8".into()))?;
            entries.push((key, decode(value)?));
        }
        Ok(entries)
    }
}
