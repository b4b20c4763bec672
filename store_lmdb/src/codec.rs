//! Key layouts and record encoding shared by the LMDB stores.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::LmdbError;

/// Numeric ids are stored big-endian so LMDB's byte order is numeric order.
pub(crate) fn id_key(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

pub(crate) fn decode_id(bytes: &[u8]) -> Result<u64, LmdbError> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| LmdbError::Serialization(format!("id has {} bytes, expected 8", bytes.len())))?;
    Ok(u64::from_be_bytes(arr))
}

/// `subject ++ 0x00`: the scan prefix for every code issued to `subject`.
pub(crate) fn subject_prefix(subject: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(subject.len() + 1);
    key.extend_from_slice(subject.as_bytes());
    key.push(0);
    key
}

/// `subject ++ 0x00 ++ id_be`.
pub(crate) fn subject_index_key(subject: &str, id: u64) -> Vec<u8> {
    let mut key = subject_prefix(subject);
    key.extend_from_slice(&id_key(id));
    key
}

/// Turn `prefix` into the smallest key greater than every key starting with it.
///
/// An all-`0xff` prefix has no such key; it is left as an empty vector,
/// which callers treat as an unbounded scan.
pub(crate) fn increment_prefix(prefix: &mut Vec<u8>) {
    while let Some(last) = prefix.pop() {
        if last < 0xff {
            prefix.push(last + 1);
            return;
        }
    }
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, LmdbError> {
    Ok(bincode::serialize(value)?)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, LmdbError> {
    Ok(bincode::deserialize(bytes)?)
}
