//! Error type for board operations.

use thiserror::Error;

use crate::comments::CommentError;
use crate::roster::RosterError;

/// Result alias for board operations.
pub type Result<T> = std::result::Result<T, BoardError>;

/// Errors surfaced by [`crate::board::EventBoard`].
///
/// Domain rejections (full roster, password mismatch) are not errors; they
/// are reported as a [`crate::roster::MergeOutcome`].
#[derive(Debug, Error)]
pub enum BoardError {
    /// Registration without a `User-Agent` header.
    #[error("missing user agent")]
    MissingUserAgent,

    /// Malformed registration.
    #[error(transparent)]
    Roster(#[from] RosterError),

    /// Malformed comment.
    #[error(transparent)]
    Comment(#[from] CommentError),

    /// Malformed request input other than the above.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested object does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Storage backend failure.
    #[error("storage error: {0}")]
    Backend(String),

    /// A stored JSON blob could not be decoded or encoded.
    #[error("corrupt blob {key}: {source}")]
    Corrupt {
        /// Object key.
        key: String,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },

    /// Optimistic writes kept losing to concurrent writers.
    #[error("concurrent modification of {key} after {attempts} attempts")]
    Conflict {
        /// Object key.
        key: String,
        /// Attempts made.
        attempts: u32,
    },
}

impl BoardError {
    /// Wrap a storage error.
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Wrap a JSON error for a blob.
    pub fn corrupt(key: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Corrupt {
            key: key.into(),
            source,
        }
    }
}
