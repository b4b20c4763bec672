use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("store error: {0}")]
    Store(#[from] dailyread_store::StoreError),

    #[error("LMDB error: {0}")]
    Lmdb(#[from] dailyread_store_lmdb::LmdbError),

    #[error("secret error: {0}")]
    Secret(#[from] dailyread_secrets::SecretError),

    #[error("verification error: {0}")]
    Verification(#[from] dailyread_verification::VerificationError),

    #[error("content source error: {0}")]
    Sources(#[from] dailyread_sources::SourceError),

    #[error("mail error: {0}")]
    Mail(#[from] dailyread_mail::DeliveryError),

    #[error("config error: {0}")]
    Config(String),

    #[error("data directory error: {0}")]
    DataDir(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RPC server error: {0}")]
    Rpc(#[from] dailyread_rpc::RpcError),

    #[error("node already started")]
    AlreadyStarted,

    #[error("shutdown timeout")]
    ShutdownTimeout,
}
