use dailyread_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source unreachable: {0}")]
    Unreachable(String),

    #[error("source returned HTTP status {0}")]
    Status(u16),

    #[error("source returned an unusable body: {0}")]
    InvalidBody(String),

    #[error("HTTP client unavailable: {0}")]
    Client(String),

    #[error("no content source is enabled")]
    NoEnabledSources,

    /// Every enabled source was tried once and failed.
    #[error("all {attempts} content sources failed")]
    AllSourcesExhausted { attempts: usize },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
