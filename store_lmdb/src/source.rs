//! LMDB implementation of ContentSourceStore.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, RoTxn};

use dailyread_store::{next_order_index, sort_sources, ContentSourceStore, StoreError};
use dailyread_types::{ContentSource, NewContentSource, SourceId, Timestamp};

use crate::codec::{decode, encode, id_key};
use crate::meta::{allocate_id, NEXT_SOURCE_ID};
use crate::LmdbError;

pub struct LmdbContentSourceStore {
    pub(crate) env: Arc<Env>,
    pub(crate) sources_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbContentSourceStore {
    fn all(&self, txn: &RoTxn) -> Result<Vec<ContentSource>, LmdbError> {
        let mut sources = Vec::new();
        for result in self.sources_db.iter(txn)? {
            let (_, bytes) = result?;
            sources.push(decode(bytes)?);
        }
        Ok(sources)
    }
}

impl ContentSourceStore for LmdbContentSourceStore {
    fn put_source(&self, new: NewContentSource, now: Timestamp) -> Result<ContentSource, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let order_index = match new.order_index {
            Some(index) => index,
            None => next_order_index(&self.all(&wtxn)?),
        };
        let id = allocate_id(&self.meta_db, &mut wtxn, NEXT_SOURCE_ID)?;
        let source = ContentSource {
            id,
            name: new.name,
            url: new.url,
            enabled: new.enabled,
            order_index,
            polling_algorithm: new.polling_algorithm,
            created_at: now,
        };
        let value = encode(&source)?;
        self.sources_db
            .put(&mut wtxn, &id_key(id), &value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        tracing::debug!(id, name = %source.name, order_index, "content source added");
        Ok(source)
    }

    fn get_source(&self, id: SourceId) -> Result<Option<ContentSource>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .sources_db
            .get(&rtxn, &id_key(id))
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(decode(bytes)?)),
            None => Ok(None),
        }
    }

    fn list_sources(&self) -> Result<Vec<ContentSource>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut sources = self.all(&rtxn)?;
        sort_sources(&mut sources);
        Ok(sources)
    }

    fn set_enabled(&self, id: SourceId, enabled: bool) -> Result<ContentSource, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut source: ContentSource = self
            .sources_db
            .get(&wtxn, &id_key(id))
            .map_err(LmdbError::from)?
            .map(decode)
            .transpose()?
            .ok_or_else(|| StoreError::NotFound(format!("content source {id}")))?;
        source.enabled = enabled;
        let value = encode(&source)?;
        self.sources_db
            .put(&mut wtxn, &id_key(id), &value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(source)
    }
}
