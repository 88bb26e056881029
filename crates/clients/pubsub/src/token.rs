//! Access token minting
//!
//! The channel service authenticates both publishers and subscribers with
//! short-lived HMAC-signed JWTs whose audience is the URL being accessed.
//! Tokens are minted locally from the service access key; no round trip to
//! the service is involved.

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::error::PubsubError;

/// Claims carried by a channel access token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenClaims {
    /// URL this token grants access to
    pub aud: String,

    /// Expiration timestamp (Unix epoch)
    pub exp: i64,
}

impl TokenClaims {
    /// Claims for `audience`, expiring `ttl_seconds` from now
    pub fn new(audience: impl Into<String>, ttl_seconds: i64) -> Self {
        let exp = Utc::now()
            .checked_add_signed(Duration::seconds(ttl_seconds))
            .expect("valid timestamp")
            .timestamp();

        Self {
            aud: audience.into(),
            exp,
        }
    }
}

/// Signs access tokens with the service access key
pub struct TokenSigner {
    key: EncodingKey,
}

impl TokenSigner {
    /// Create a signer from the service access key
    pub fn new(access_key: &str) -> Self {
        Self {
            key: EncodingKey::from_secret(access_key.as_bytes()),
        }
    }

    /// Mint a token for `audience`, valid for `ttl_seconds`
    pub fn mint(&self, audience: &str, ttl_seconds: i64) -> Result<String, PubsubError> {
        let claims = TokenClaims::new(audience, ttl_seconds);
        Ok(encode(&Header::default(), &claims, &self.key)?)
    }
}
