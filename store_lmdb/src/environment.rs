//! LMDB environment setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::migration::Migrator;
use crate::{
    LmdbAccountStore, LmdbConfigStore, LmdbContentSourceStore, LmdbError,
    LmdbVerificationCodeStore,
};

/// Number of named databases the environment creates.
pub const DATABASE_COUNT: u32 = 8;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    path: PathBuf,
    pub(crate) config_db: Database<Bytes, Bytes>,
    pub(crate) codes_db: Database<Bytes, Bytes>,
    pub(crate) code_subjects_db: Database<Bytes, Bytes>,
    pub(crate) sources_db: Database<Bytes, Bytes>,
    pub(crate) accounts_db: Database<Bytes, Bytes>,
    pub(crate) account_emails_db: Database<Bytes, Bytes>,
    pub(crate) account_usernames_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    ///
    /// Creates the directory and every database on first open, then brings
    /// the schema up to date.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path).map_err(|e| LmdbError::Io(e.to_string()))?;

        // SAFETY: the environment is opened once per path per process and
        // the data file is not modified by anything outside LMDB.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(max_dbs.max(DATABASE_COUNT))
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let config_db = env.create_database(&mut wtxn, Some("config"))?;
        let codes_db = env.create_database(&mut wtxn, Some("verification_codes"))?;
        let code_subjects_db = env.create_database(&mut wtxn, Some("verification_subjects"))?;
        let sources_db = env.create_database(&mut wtxn, Some("content_sources"))?;
        let accounts_db = env.create_database(&mut wtxn, Some("accounts"))?;
        let account_emails_db = env.create_database(&mut wtxn, Some("account_emails"))?;
        let account_usernames_db = env.create_database(&mut wtxn, Some("account_usernames"))?;
        let meta_db = env.create_database(&mut wtxn, Some("meta"))?;
        wtxn.commit()?;

        let environment = Self {
            env: Arc::new(env),
            path: path.to_path_buf(),
            config_db,
            codes_db,
            code_subjects_db,
            sources_db,
            accounts_db,
            account_emails_db,
            account_usernames_db,
            meta_db,
        };

        Migrator::run(&environment)?;
        tracing::info!(path = %path.display(), "LMDB environment opened");
        Ok(environment)
    }

    pub fn env(&self) -> &Arc<Env> {
        &self.env
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config_store(&self) -> LmdbConfigStore {
        LmdbConfigStore {
            env: Arc::clone(&self.env),
            config_db: self.config_db,
        }
    }

    pub fn verification_store(&self) -> LmdbVerificationCodeStore {
        LmdbVerificationCodeStore {
            env: Arc::clone(&self.env),
            codes_db: self.codes_db,
            code_subjects_db: self.code_subjects_db,
            meta_db: self.meta_db,
        }
    }

    pub fn source_store(&self) -> LmdbContentSourceStore {
        LmdbContentSourceStore {
            env: Arc::clone(&self.env),
            sources_db: self.sources_db,
            meta_db: self.meta_db,
        }
    }

    pub fn account_store(&self) -> LmdbAccountStore {
        LmdbAccountStore {
            env: Arc::clone(&self.env),
            accounts_db: self.accounts_db,
            account_emails_db: self.account_emails_db,
            account_usernames_db: self.account_usernames_db,
            meta_db: self.meta_db,
        }
    }
}
