use sessionstore_codec::CodecError;
use thiserror::Error;

/// Failures reported by a [`StoreClient`](crate::client::StoreClient).
///
/// The session layer does not interpret these further; they are either
/// surfaced to the caller or, for sweep passes, logged and retried.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),

    #[error("record serialization error: {0}")]
    Serialization(String),

    #[error("store lock poisoned: {0}")]
    Lock(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Backend(e.to_string())
    }
}

/// Typed error hierarchy for session operations.
///
/// Codec failures are recoverable: a cookie or record that fails to
/// authenticate is treated as an absent session. Store and internal
/// failures are infrastructure problems and always reach the caller.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("cookie error: {0}")]
    Cookie(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl SessionError {
    /// Whether a load path may swallow this error and hand out a new session.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Codec(_) => true,
            Self::Store(_) | Self::Cookie(_) | Self::Config(_) | Self::Internal(_) => false,
        }
    }
}

pub type Result<T, E = SessionError> = std::result::Result<T, E>;
