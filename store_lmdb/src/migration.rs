//! Database schema migration engine.
//!
//! Tracks a monotonically increasing schema version in the meta database and
//! runs sequential migration functions to bring an older database up to date.

use crate::environment::LmdbEnvironment;
use crate::meta::{read_schema_version, write_schema_version};
use crate::LmdbError;

/// The schema version that the current code expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Runs database migrations to bring the schema up to date.
pub struct Migrator;

impl Migrator {
    /// Check the stored schema version and run any needed migrations.
    ///
    /// - Version 0 means a fresh database (no version stored yet).
    /// - If the stored version matches `CURRENT_SCHEMA_VERSION`, this is a no-op.
    /// - A stored version *higher* than this code supports means the database
    ///   was written by a newer build, and it is refused.
    pub fn run(environment: &LmdbEnvironment) -> Result<(), LmdbError> {
        let current = {
            let rtxn = environment.env().read_txn()?;
            read_schema_version(&environment.meta_db, &rtxn)?
        };

        if current == CURRENT_SCHEMA_VERSION {
            tracing::debug!(version = current, "database schema is up to date");
            return Ok(());
        }

        if current > CURRENT_SCHEMA_VERSION {
            return Err(LmdbError::SchemaTooNew {
                found: current,
                supported: CURRENT_SCHEMA_VERSION,
            });
        }

        let mut wtxn = environment.env().write_txn()?;
        for version in current..CURRENT_SCHEMA_VERSION {
            tracing::info!(from = version, to = version + 1, "running migration");
            run_migration(version, version + 1)?;
        }
        write_schema_version(&environment.meta_db, &mut wtxn, CURRENT_SCHEMA_VERSION)?;
        wtxn.commit()?;

        tracing::info!(version = CURRENT_SCHEMA_VERSION, "migration complete");
        Ok(())
    }
}

fn run_migration(from: u32, to: u32) -> Result<(), LmdbError> {
    match (from, to) {
        // Initial schema: nothing to migrate from a blank slate.
        (0, 1) => Ok(()),
        _ => Err(LmdbError::Heed(format!("unknown migration: {} -> {}", from, to))),
    }
}
