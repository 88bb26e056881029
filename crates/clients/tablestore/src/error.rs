//! Error types for the table store client

use thiserror::Error;

/// Errors raised by the table store client
#[derive(Debug, Error)]
pub enum TableError {
    /// Endpoint URL was malformed
    #[error("Invalid table endpoint: {0}")]
    Endpoint(String),

    /// Request could not be sent
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Store answered with a non-success status
    #[error("Table store returned status {status} for {operation} on {table}")]
    Status {
        /// HTTP status the store returned
        status: u16,
        /// Operation that failed
        operation: &'static str,
        /// Table the operation targeted
        table: String,
    },

    /// Etag precondition failed on a merge
    #[error("Etag mismatch on {table} ({partition_key}/{row_key})")]
    Conflict {
        table: String,
        partition_key: String,
        row_key: String,
    },

    /// Response body did not have the expected shape
    #[error("Unexpected response body: {0}")]
    Body(String),
}

impl From<TableError> for relaycast_core::Error {
    fn from(err: TableError) -> Self {
        match err {
            TableError::Endpoint(msg) => relaycast_core::Error::Config(msg),
            TableError::Conflict {
                table,
                partition_key,
                row_key,
            } => relaycast_core::Error::StorageConflict {
                table,
                partition_key,
                row_key,
            },
            other => relaycast_core::Error::Storage(other.to_string()),
        }
    }
}
