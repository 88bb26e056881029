//! Per-route authorization policy
//!
//! Which routes require a caller key is a deployment decision, not handler
//! logic: each service's config assigns a [`RoutePolicy`] per route and the
//! handlers call [`authorize`] with whatever key the request presented. The
//! check is HTTP-framework-free so it can be tested without a server.

use serde::{Deserialize, Serialize};

/// Authorization policy for one route
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoutePolicy {
    /// Open to any caller
    #[default]
    Anonymous,

    /// Caller must present the service's API key
    ApiKey,
}

/// Authorization failures
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("route requires an API key but the service has none configured")]
    KeyNotConfigured,

    #[error("missing API key")]
    MissingKey,

    #[error("invalid API key")]
    InvalidKey,
}

/// Check a presented key against a route's policy
pub fn authorize(
    policy: RoutePolicy,
    configured_key: Option<&str>,
    presented_key: Option<&str>,
) -> Result<(), AuthError> {
    match policy {
        RoutePolicy::Anonymous => Ok(()),
        RoutePolicy::ApiKey => {
            let expected = configured_key.ok_or(AuthError::KeyNotConfigured)?;
            match presented_key {
                None => Err(AuthError::MissingKey),
                Some(key) if key == expected => Ok(()),
                Some(_) => Err(AuthError::InvalidKey),
            }
        }
    }
}
