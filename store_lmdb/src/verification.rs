//! LMDB implementation of VerificationCodeStore.
//!
//! Rows live in `verification_codes` keyed by big-endian id. A second
//! database, `verification_subjects`, holds one empty value per row under
//! the composite key `subject ++ 0x00 ++ id_be`, so every code issued to a
//! subject is a prefix range-scan.

use std::ops::Bound;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, RoTxn};

use dailyread_store::{newest_valid, NewCode, StoreError, VerificationCodeStore};
use dailyread_types::{CodeId, Timestamp, VerificationCode, VerificationKind};

use crate::codec::{decode, encode, id_key, increment_prefix, subject_index_key, subject_prefix};
use crate::meta::{allocate_id, NEXT_CODE_ID};
use crate::LmdbError;

pub struct LmdbVerificationCodeStore {
    pub(crate) env: Arc<Env>,
    pub(crate) codes_db: Database<Bytes, Bytes>,
    pub(crate) code_subjects_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbVerificationCodeStore {
    /// Load every row for `subject`, in id order.
    fn subject_rows(&self, txn: &RoTxn, subject: &str) -> Result<Vec<VerificationCode>, LmdbError> {
        let prefix = subject_prefix(subject);
        let mut upper = prefix.clone();
        increment_prefix(&mut upper);
        let upper_bound = if upper.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Excluded(upper.as_slice())
        };
        let bounds = (Bound::Included(prefix.as_slice()), upper_bound);

        let mut ids = Vec::new();
        for result in self.code_subjects_db.range(txn, &bounds)? {
            let (key, _) = result?;
            ids.push(key[prefix.len()..].to_vec());
        }

        let mut rows = Vec::with_capacity(ids.len());
        for id in ids {
            match self.codes_db.get(txn, &id)? {
                Some(bytes) => {
                    let row: VerificationCode = decode(bytes)?;
                    // A subject containing NUL can share a prefix with another.
                    if row.subject == subject {
                        rows.push(row);
                    }
                }
                None => tracing::warn!(subject, "verification index points at a missing row"),
            }
        }
        Ok(rows)
    }

    fn load(&self, txn: &RoTxn, id: CodeId) -> Result<Option<VerificationCode>, LmdbError> {
        match self.codes_db.get(txn, &id_key(id))? {
            Some(bytes) => Ok(Some(decode(bytes)?)),
            None => Ok(None),
        }
    }
}

impl VerificationCodeStore for LmdbVerificationCodeStore {
    fn insert_code(&self, new: NewCode) -> Result<VerificationCode, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let id = allocate_id(&self.meta_db, &mut wtxn, NEXT_CODE_ID)?;
        let row = VerificationCode {
            id,
            subject: new.subject,
            code: new.code,
            kind: new.kind,
            expires_at: new.expires_at,
            used: false,
            created_at: new.created_at,
        };
        let value = encode(&row)?;
        self.codes_db
            .put(&mut wtxn, &id_key(id), &value)
            .map_err(LmdbError::from)?;
        self.code_subjects_db
            .put(&mut wtxn, &subject_index_key(&row.subject, id), &[])
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(row)
    }

    fn get_code(&self, id: CodeId) -> Result<Option<VerificationCode>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.load(&rtxn, id)?)
    }

    fn find_valid(
        &self,
        subject: &str,
        code: &str,
        kind: Option<VerificationKind>,
        now: Timestamp,
    ) -> Result<Option<VerificationCode>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let rows = self.subject_rows(&rtxn, subject)?;
        Ok(newest_valid(&rows, code, kind, now).cloned())
    }

    fn mark_used(&self, id: CodeId) -> Result<bool, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut row = self
            .load(&wtxn, id)?
            .ok_or_else(|| LmdbError::NotFound(format!("verification code {id}")))?;
        if row.used {
            wtxn.abort();
            return Ok(false);
        }
        row.used = true;
        let value = encode(&row)?;
        self.codes_db
            .put(&mut wtxn, &id_key(id), &value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(true)
    }

    fn consume_valid(
        &self,
        subject: &str,
        code: &str,
        kind: Option<VerificationKind>,
        now: Timestamp,
    ) -> Result<Option<VerificationCode>, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let rows = self.subject_rows(&wtxn, subject)?;
        let Some(mut row) = newest_valid(&rows, code, kind, now).cloned() else {
            wtxn.abort();
            return Ok(None);
        };
        row.used = true;
        let value = encode(&row)?;
        self.codes_db
            .put(&mut wtxn, &id_key(row.id), &value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(Some(row))
    }

    fn sweep(&self, now: Timestamp) -> Result<u64, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut doomed = Vec::new();
        for result in self.codes_db.iter(&wtxn).map_err(LmdbError::from)? {
            let (_, bytes) = result.map_err(LmdbError::from)?;
            let row: VerificationCode = decode(bytes)?;
            if row.is_reclaimable(now) {
                doomed.push((row.id, row.subject));
            }
        }
        for (id, subject) in &doomed {
            self.codes_db
                .delete(&mut wtxn, &id_key(*id))
                .map_err(LmdbError::from)?;
            self.code_subjects_db
                .delete(&mut wtxn, &subject_index_key(subject, *id))
                .map_err(LmdbError::from)?;
        }
        wtxn.commit().map_err(LmdbError::from)?;
        tracing::debug!(removed = doomed.len(), "swept verification codes");
        Ok(doomed.len() as u64)
    }

    fn codes_for_subject(&self, subject: &str) -> Result<Vec<VerificationCode>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.subject_rows(&rtxn, subject)?)
    }
}
