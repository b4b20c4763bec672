//! Startup consistency checks for the dailyread tables.
//!
//! Every record must decode, every secondary index must point at a row that
//! agrees with it, and a persisted credential key must be usable. Problems
//! are collected into the report; only a failure to read at all is an error.

use std::path::Path;

use dailyread_crypto::KeyBytes;
use dailyread_store::keys;
use dailyread_types::{Account, ConfigEntry, ContentSource, VerificationCode};
use heed::types::Bytes;
use heed::{Database, RoTxn};
use serde::de::DeserializeOwned;

use crate::codec::{decode, decode_id, id_key};
use crate::{LmdbEnvironment, LmdbError};

#[derive(Debug, Default)]
pub struct IntegrityReport {
    pub records_checked: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

pub fn check_integrity(environment: &LmdbEnvironment) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport::default();
    let rtxn = environment.env().read_txn()?;

    check_config(environment, &rtxn, &mut report)?;
    check_rows(&rtxn, &environment.sources_db, "content_sources", |s: &ContentSource| s.id, &mut report)?;
    check_rows(&rtxn, &environment.codes_db, "verification_codes", |c: &VerificationCode| c.id, &mut report)?;
    check_rows(&rtxn, &environment.accounts_db, "accounts", |a: &Account| a.id, &mut report)?;
    check_code_subjects(environment, &rtxn, &mut report)?;
    check_account_index(
        environment,
        &rtxn,
        &environment.account_usernames_db,
        "account_usernames",
        |account, name| account.username == name,
        &mut report,
    )?;
    check_account_index(
        environment,
        &rtxn,
        &environment.account_emails_db,
        "account_emails",
        |account, email| account.email.as_deref() == Some(email),
        &mut report,
    )?;

    Ok(report)
}

fn check_config(
    environment: &LmdbEnvironment,
    rtxn: &RoTxn,
    report: &mut IntegrityReport,
) -> Result<(), LmdbError> {
    for result in environment.config_db.iter(rtxn)? {
        let (key, bytes) = result?;
        report.records_checked += 1;
        let name = String::from_utf8_lossy(key);
        let entry: ConfigEntry = match decode(bytes) {
            Ok(entry) => entry,
            Err(e) => {
                report.errors.push(format!("config '{name}' does not decode: {e}"));
                continue;
            }
        };
        if name == keys::CREDENTIAL_KEY {
            if let Err(e) = KeyBytes::decode(&entry.value) {
                report.errors.push(format!("stored credential key is unusable: {e}"));
            }
        }
    }
    Ok(())
}

/// Rows keyed by big-endian id must decode and carry the id they are filed under.
fn check_rows<T: DeserializeOwned>(
    rtxn: &RoTxn,
    db: &Database<Bytes, Bytes>,
    table: &str,
    id_of: impl Fn(&T) -> u64,
    report: &mut IntegrityReport,
) -> Result<(), LmdbError> {
    for result in db.iter(rtxn)? {
        let (key, bytes) = result?;
        report.records_checked += 1;
        let id = match decode_id(key) {
            Ok(id) => id,
            Err(e) => {
                report.errors.push(format!("{table}: bad key: {e}"));
                continue;
            }
        };
        match decode::<T>(bytes) {
            Ok(row) if id_of(&row) == id => {}
            Ok(row) => report
                .errors
                .push(format!("{table}: row {id} claims id {}", id_of(&row))),
            Err(e) => report.errors.push(format!("{table}: row {id} does not decode: {e}")),
        }
    }
    Ok(())
}

/// Every `subject ++ 0x00 ++ id` entry must name a code row with that subject.
fn check_code_subjects(
    environment: &LmdbEnvironment,
    rtxn: &RoTxn,
    report: &mut IntegrityReport,
) -> Result<(), LmdbError> {
    for result in environment.code_subjects_db.iter(rtxn)? {
        let (key, _) = result?;
        report.records_checked += 1;
        if key.len() < 9 || key[key.len() - 9] != 0 {
            report.errors.push("verification_subjects: malformed key".to_string());
            continue;
        }
        let (subject, id) = key.split_at(key.len() - 9);
        let subject = String::from_utf8_lossy(subject);
        let id = decode_id(&id[1..])?;
        match environment.codes_db.get(rtxn, &id_key(id))? {
            None => report
                .errors
                .push(format!("verification_subjects: '{subject}' points at missing code {id}")),
            Some(bytes) => match decode::<VerificationCode>(bytes) {
                Ok(row) if row.subject == subject => {}
                Ok(row) => report.errors.push(format!(
                    "verification_subjects: '{subject}' points at code {id} issued to '{}'",
                    row.subject
                )),
                // Already reported by the row pass.
                Err(_) => {}
            },
        }
    }
    Ok(())
}

fn check_account_index(
    environment: &LmdbEnvironment,
    rtxn: &RoTxn,
    index: &Database<Bytes, Bytes>,
    table: &str,
    agrees: impl Fn(&Account, &str) -> bool,
    report: &mut IntegrityReport,
) -> Result<(), LmdbError> {
    for result in index.iter(rtxn)? {
        let (key, value) = result?;
        report.records_checked += 1;
        let name = String::from_utf8_lossy(key);
        let id = match decode_id(value) {
            Ok(id) => id,
            Err(e) => {
                report.errors.push(format!("{table}: '{name}' has a bad id: {e}"));
                continue;
            }
        };
        match environment.accounts_db.get(rtxn, &id_key(id))? {
            None => report
                .errors
                .push(format!("{table}: '{name}' points at missing account {id}")),
            Some(bytes) => match decode::<Account>(bytes) {
                Ok(account) if agrees(&account, &*name) => {}
                Ok(_) => report
                    .errors
                    .push(format!("{table}: '{name}' points at account {id}, which no longer has it")),
                Err(_) => {}
            },
        }
    }
    Ok(())
}

/// A data directory either does not exist yet or holds `data.mdb`.
pub fn check_data_dir(path: &Path) -> Result<(), String> {
    if path.exists() && !path.join("data.mdb").exists() {
        return Err(format!("{} exists but holds no data.mdb", path.display()));
    }
    Ok(())
}
