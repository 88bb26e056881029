//! Channel service client

use async_trait::async_trait;
use serde_json::json;
use url::Url;

use relaycast_core::{BroadcastChannel, ConnectionDescriptor};

use crate::error::PubsubError;
use crate::token::TokenSigner;

/// Parsed service credentials
///
/// The service hands out a connection string of the form
/// `Endpoint=https://…;AccessKey=…;` (additional segments such as `Version`
/// are ignored).
#[derive(Debug, Clone)]
pub struct ServiceCredentials {
    /// Service endpoint base URL
    pub endpoint: Url,

    /// Shared access key used to sign tokens
    pub access_key: String,
}

impl ServiceCredentials {
    /// Parse a service connection string
    pub fn parse(connection_string: &str) -> Result<Self, PubsubError> {
        let mut endpoint = None;
        let mut access_key = None;

        for segment in connection_string.split(';') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let (name, value) = segment.split_once('=').ok_or_else(|| {
                PubsubError::Credentials(format!("segment without '=': {segment}"))
            })?;
            match name {
                "Endpoint" => endpoint = Some(value.to_string()),
                "AccessKey" => access_key = Some(value.to_string()),
                _ => {} // Version and future segments
            }
        }

        let endpoint = endpoint
            .ok_or_else(|| PubsubError::Credentials("missing Endpoint segment".to_string()))?;
        let endpoint = Url::parse(&endpoint)
            .map_err(|e| PubsubError::Credentials(format!("invalid endpoint URL: {e}")))?;
        let access_key = access_key
            .ok_or_else(|| PubsubError::Credentials("missing AccessKey segment".to_string()))?;
        if access_key.is_empty() {
            return Err(PubsubError::Credentials("empty AccessKey".to_string()));
        }

        Ok(Self {
            endpoint,
            access_key,
        })
    }
}

/// REST client for one broadcast channel
///
/// Holds a process-wide `reqwest` client; construct once at startup and share
/// via `Arc` across requests.
pub struct RealtimeChannelClient {
    http: reqwest::Client,
    endpoint: Url,
    channel: String,
    token_ttl_seconds: i64,
    signer: TokenSigner,
}

impl RealtimeChannelClient {
    /// Create a client for `channel` from parsed credentials
    pub fn new(credentials: ServiceCredentials, channel: &str, token_ttl_seconds: i64) -> Self {
        Self {
            http: reqwest::Client::new(),
            signer: TokenSigner::new(&credentials.access_key),
            endpoint: credentials.endpoint,
            channel: channel.to_string(),
            token_ttl_seconds,
        }
    }

    /// Create a client for `channel` from a raw connection string
    pub fn from_connection_string(
        connection_string: &str,
        channel: &str,
        token_ttl_seconds: i64,
    ) -> Result<Self, PubsubError> {
        let credentials = ServiceCredentials::parse(connection_string)?;
        Ok(Self::new(credentials, channel, token_ttl_seconds))
    }

    /// URL publishes are POSTed to
    fn publish_url(&self) -> String {
        format!(
            "{}/api/v1/hubs/{}",
            self.endpoint.as_str().trim_end_matches('/'),
            self.channel
        )
    }

    /// URL subscribers connect to
    fn client_url(&self) -> String {
        format!(
            "{}/client/?hub={}",
            self.endpoint.as_str().trim_end_matches('/'),
            self.channel
        )
    }

    async fn send_publish(&self, target: &str, payload: &str) -> Result<(), PubsubError> {
        let url = self.publish_url();
        let token = self.signer.mint(&url, self.token_ttl_seconds)?;

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&json!({
                "target": target,
                "arguments": [payload],
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PubsubError::Rejected {
                status: status.as_u16(),
            });
        }

        tracing::debug!(channel = %self.channel, bytes = payload.len(), "published");
        Ok(())
    }
}

#[async_trait]
impl BroadcastChannel for RealtimeChannelClient {
    async fn publish(&self, target: &str, payload: &str) -> relaycast_core::Result<()> {
        self.send_publish(target, payload).await.map_err(Into::into)
    }

    fn negotiate(&self) -> relaycast_core::Result<ConnectionDescriptor> {
        let url = self.client_url();
        let access_token = self.signer.mint(&url, self.token_ttl_seconds)?;
        Ok(ConnectionDescriptor { url, access_token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONN: &str = "Endpoint=https://broadcast.example.net;AccessKey=secret;Version=1.0;";

    #[test]
    fn parse_connection_string() {
        let creds = ServiceCredentials::parse(CONN).unwrap();
        assert_eq!(creds.endpoint.as_str(), "https://broadcast.example.net/");
        assert_eq!(creds.access_key, "secret");
    }

    #[test]
    fn parse_rejects_missing_segments() {
        assert!(ServiceCredentials::parse("AccessKey=secret").is_err());
        assert!(ServiceCredentials::parse("Endpoint=https://x.example.net").is_err());
        assert!(ServiceCredentials::parse("Endpoint=https://x.example.net;AccessKey=").is_err());
        assert!(ServiceCredentials::parse("Endpoint=not a url;AccessKey=k").is_err());
    }

    #[test]
    fn urls_scope_to_the_channel() {
        let client = RealtimeChannelClient::from_connection_string(CONN, "environment", 3600).unwrap();
        assert_eq!(
            client.publish_url(),
            "https://broadcast.example.net/api/v1/hubs/environment"
        );
        assert_eq!(
            client.client_url(),
            "https://broadcast.example.net/client/?hub=environment"
        );
    }

    #[test]
    fn negotiate_issues_descriptor_without_network() {
        let client = RealtimeChannelClient::from_connection_string(CONN, "environment", 3600).unwrap();
        let descriptor = client.negotiate().unwrap();
        assert_eq!(
            descriptor.url,
            "https://broadcast.example.net/client/?hub=environment"
        );
        assert!(!descriptor.access_token.is_empty());
    }
}
