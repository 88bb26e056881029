//! Error types for the Relaycast services

use thiserror::Error;

/// Result type alias for Relaycast operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur across the Relaycast crates
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (malformed connection string, missing setting)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Broadcast channel error (publish rejected, service unreachable)
    #[error("Channel error: {0}")]
    Channel(String),

    /// Access token generation failed
    #[error("Token error: {0}")]
    Token(String),

    /// Table store error (query, read, or write failed)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Etag precondition failed on a merge (concurrent writer won)
    #[error("Storage conflict on {table} ({partition_key}/{row_key})")]
    StorageConflict {
        /// Table the merge targeted
        table: String,
        /// Partition key of the contested row
        partition_key: String,
        /// Row key of the contested row
        row_key: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl Error {
    /// Whether this error is an etag conflict that a caller may retry
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::StorageConflict { .. })
    }
}
