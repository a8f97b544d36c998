use perch_shared::types::TweetId;
use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Generic I/O error (e.g. creating the storage directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No file exists for the requested (id, author) pair.
    #[error("No stored tweet {id} by '{username}'")]
    NotFound { id: TweetId, username: String },

    /// A file exists but its content does not decode as a tweet record.
    #[error("Malformed tweet file '{name}': {source}")]
    Malformed {
        name: String,
        source: serde_json::Error,
    },

    /// Failed to serialize a record for writing.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
