//! Broadcast channel seam
//!
//! The broadcast channel is a managed pub/sub service. This module defines
//! the client-handle trait the services depend on; the concrete REST client
//! lives in `relaycast-pubsub`, and tests substitute recording mocks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Message name every relay publishes under
///
/// Subscribers key their handlers on this name; it is part of the wire
/// contract with the dashboards and must not vary per deployment.
pub const NEW_MESSAGE: &str = "newMessage";

/// Credentials a client needs to subscribe to a channel directly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionDescriptor {
    /// Client endpoint URL for the channel
    pub url: String,

    /// Short-lived access token for that URL
    #[serde(rename = "accessToken")]
    pub access_token: String,
}

/// Client handle for the managed broadcast channel service
#[async_trait]
pub trait BroadcastChannel: Send + Sync {
    /// Publish one message to the channel
    ///
    /// `target` is the message name subscribers dispatch on; `payload` is the
    /// single argument, forwarded as-is.
    async fn publish(&self, target: &str, payload: &str) -> Result<()>;

    /// Issue connection credentials for a client to join the channel
    ///
    /// This is a local computation over the service credentials; it performs
    /// no network call and has no side effect.
    fn negotiate(&self) -> Result<ConnectionDescriptor>;
}
