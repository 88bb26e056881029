//! REST client for the managed broadcast channel service
//!
//! Publishers send named messages with argument lists to a channel; the
//! service fans them out to subscribed clients over persistent connections.
//! This crate is the client handle only: it signs requests with short-lived
//! JWTs minted from the service access key, POSTs publishes to the channel's
//! hub endpoint, and builds the connection descriptor (client URL + token)
//! that `negotiate` hands to subscribers. The service's own protocol is not
//! reimplemented here.
//!
//! # Usage
//!
//! ```ignore
//! use relaycast_core::{BroadcastChannel, NEW_MESSAGE};
//! use relaycast_pubsub::RealtimeChannelClient;
//!
//! let client = RealtimeChannelClient::from_connection_string(
//!     "Endpoint=https://broadcast.example.net;AccessKey=secret;",
//!     "environment",
//!     3600,
//! )?;
//!
//! client.publish(NEW_MESSAGE, "{\"Celsius\":21.5}").await?;
//! let descriptor = client.negotiate()?;
//! ```

pub mod client;
pub mod error;
pub mod token;

// Re-export main types
pub use client::{RealtimeChannelClient, ServiceCredentials};
pub use error::PubsubError;
pub use token::TokenSigner;
