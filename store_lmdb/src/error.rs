use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(String),

    #[error("key not found: {0}")]
    NotFound(String),

    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("database schema version {found} is newer than supported version {supported}")]
    SchemaTooNew { found: u32, supported: u32 },
}

impl From<heed::Error> for LmdbError {
    fn from(e: heed::Error) -> Self {
        LmdbError::Heed(e.to_string())
    }
}

impl From<bincode::Error> for LmdbError {
    fn from(e: bincode::Error) -> Self {
        LmdbError::Serialization(e.to_string())
    }
}

impl From<LmdbError> for dailyread_store::StoreError {
    fn from(e: LmdbError) -> Self {
        use dailyread_store::StoreError;
        match e {
            LmdbError::NotFound(what) => StoreError::NotFound(what),
            LmdbError::Duplicate(what) => StoreError::Duplicate(what),
            LmdbError::Serialization(what) => StoreError::Serialization(what),
            other => StoreError::Backend(other.to_string()),
        }
    }
}
