use thiserror::Error;

use crate::models::NotificationKind;

/// Everything that can go wrong while building the feed
///
/// None of these are fatal. Callers degrade to showing whatever they have.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{kind} source unavailable: {reason}")]
    SourceUnavailable {
        kind: NotificationKind,
        reason: String,
    },

    #[error("State store error: {0}")]
    StateError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<campusfeed_cache::CacheError> for Error {
    fn from(err: campusfeed_cache::CacheError) -> Self {
        Error::StateError(err.to_string())
    }
}
