use crate::crypto::IdError;
use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("missing secret_id")]
    MissingCredential,
    #[error("missing groups and/or apps")]
    MissingBindingTarget,
    #[error("secret_id_num_uses cannot be negative")]
    NegativeUsesCount,
    #[error("token_ttl should not be greater than token_max_ttl")]
    TtlOrdering,
    #[error("bind_secret_id is not set")]
    UnsupportedBindingMode,
    #[error("missing binding name")]
    MissingName,
    #[error("failed to generate {what}: {source}")]
    IdentifierGeneration {
        what: &'static str,
        #[source]
        source: IdError,
    },
    #[error("storage write failed: {0}")]
    StorageWrite(#[source] StorageError),
    #[error("storage read failed: {0}")]
    StorageRead(#[source] StorageError),
    #[error("keyed hash: {0}")]
    Crypto(String),
    #[error("invalid secret_id")]
    NotFound,
    #[error("secret_id has expired")]
    Expired,
    #[error("secret_id is already registered")]
    AlreadyRegistered,
    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Error {
    /// Errors caused by the request itself. These are reported back to the
    /// caller and are raised before anything is written.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::MissingCredential
                | Error::MissingBindingTarget
                | Error::NegativeUsesCount
                | Error::TtlOrdering
                | Error::UnsupportedBindingMode
                | Error::MissingName
        )
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
