//! Id counters and schema version, kept in the `meta` database.

use heed::types::Bytes;
use heed::{Database, RoTxn, RwTxn};

use crate::LmdbError;

pub(crate) const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";
pub(crate) const NEXT_CODE_ID: &[u8] = b"next_code_id";
pub(crate) const NEXT_SOURCE_ID: &[u8] = b"next_source_id";
pub(crate) const NEXT_ACCOUNT_ID: &[u8] = b"next_account_id";

/// Allocate the next id for `counter` inside the caller's write transaction.
///
/// Ids start at 1 and are never reused, even after the row is deleted.
pub(crate) fn allocate_id(
    meta_db: &Database<Bytes, Bytes>,
    wtxn: &mut RwTxn,
    counter: &[u8],
) -> Result<u64, LmdbError> {
    let current = match meta_db.get(wtxn, counter)? {
        Some(bytes) => crate::codec::decode_id(bytes)?,
        None => 0,
    };
    let next = current + 1;
    meta_db.put(wtxn, counter, &next.to_be_bytes())?;
    Ok(next)
}

pub(crate) fn read_schema_version(
    meta_db: &Database<Bytes, Bytes>,
    rtxn: &RoTxn,
) -> Result<u32, LmdbError> {
    match meta_db.get(rtxn, SCHEMA_VERSION_KEY)? {
        Some(bytes) => {
            let arr: [u8; 4] = bytes.try_into().map_err(|_| {
                LmdbError::Serialization("schema_version has unexpected byte length".to_string())
            })?;
            Ok(u32::from_le_bytes(arr))
        }
        None => Ok(0),
    }
}

pub(crate) fn write_schema_version(
    meta_db: &Database<Bytes, Bytes>,
    wtxn: &mut RwTxn,
    version: u32,
) -> Result<(), LmdbError> {
    meta_db.put(wtxn, SCHEMA_VERSION_KEY, &version.to_le_bytes())?;
    Ok(())
}
