//! Error types for the broadcast channel client

use thiserror::Error;

/// Errors raised by the broadcast channel client
#[derive(Debug, Error)]
pub enum PubsubError {
    /// Connection string was malformed or missing a required part
    #[error("Invalid service credentials: {0}")]
    Credentials(String),

    /// Access token could not be minted
    #[error("Token signing failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Request could not be sent
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Service answered with a non-success status
    #[error("Publish rejected with status {status}")]
    Rejected {
        /// HTTP status the service returned
        status: u16,
    },
}

impl From<PubsubError> for relaycast_core::Error {
    fn from(err: PubsubError) -> Self {
        match err {
            PubsubError::Credentials(msg) => relaycast_core::Error::Config(msg),
            PubsubError::Token(e) => relaycast_core::Error::Token(e.to_string()),
            other => relaycast_core::Error::Channel(other.to_string()),
        }
    }
}
