//! Configuration for the image classifier relay
//!
//! Configuration can be loaded from a TOML file and/or environment variables.

use serde::{Deserialize, Serialize};
use std::path::Path;

use relaycast_core::auth::RoutePolicy;

/// Main configuration for the image classifier relay
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Broadcast channel configuration
    #[serde(default)]
    pub channel: ChannelConfig,

    /// Table store configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Per-route authorization
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP API port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8081
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Broadcast channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Service connection string (`Endpoint=…;AccessKey=…;`)
    #[serde(default)]
    pub connection_string: String,

    /// Channel name relays publish to and clients subscribe to
    #[serde(default = "default_channel_name")]
    pub name: String,

    /// Access token time-to-live in seconds
    #[serde(default = "default_token_ttl")]
    pub token_ttl_seconds: i64,
}

fn default_channel_name() -> String {
    "classification".to_string()
}

fn default_token_ttl() -> i64 {
    3600 // 1 hour
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            connection_string: String::new(),
            name: default_channel_name(),
            token_ttl_seconds: default_token_ttl(),
        }
    }
}

/// Table store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Table store account endpoint
    #[serde(default)]
    pub endpoint: String,

    /// Shared-access credential (query string)
    #[serde(default)]
    pub sas_token: String,

    /// Classifications table name
    #[serde(default = "default_table")]
    pub table: String,
}

fn default_table() -> String {
    "Classifications".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            sas_token: String::new(),
            table: default_table(),
        }
    }
}

/// Per-route authorization configuration
///
/// This deployment historically ran fully open; every route defaults to
/// anonymous and can be gated per deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// API key callers present in the `x-api-key` header
    #[serde(default)]
    pub api_key: Option<String>,

    /// Policy for the ingress relay
    #[serde(default)]
    pub ingress: RoutePolicy,

    /// Policy for credential issuance
    #[serde(default)]
    pub negotiate: RoutePolicy,

    /// Policy for the snapshot relay
    #[serde(default)]
    pub snapshot: RoutePolicy,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e.to_string()))?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(config)
    }

    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let mut config = Config::default();

        // Server
        if let Ok(host) = std::env::var("CLASSIFIER_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("CLASSIFIER_PORT") {
            if let Ok(p) = port.parse() {
                config.server.port = p;
            }
        }

        // Channel
        if let Ok(conn) = std::env::var("CLASSIFIER_CHANNEL_CONNECTION") {
            config.channel.connection_string = conn;
        }
        if let Ok(name) = std::env::var("CLASSIFIER_CHANNEL_NAME") {
            config.channel.name = name;
        }
        if let Ok(ttl) = std::env::var("CLASSIFIER_TOKEN_TTL") {
            if let Ok(t) = ttl.parse() {
                config.channel.token_ttl_seconds = t;
            }
        }

        // Storage
        if let Ok(endpoint) = std::env::var("CLASSIFIER_TABLE_ENDPOINT") {
            config.storage.endpoint = endpoint;
        }
        if let Ok(sas) = std::env::var("CLASSIFIER_TABLE_SAS") {
            config.storage.sas_token = sas;
        }
        if let Ok(table) = std::env::var("CLASSIFIER_TABLE") {
            config.storage.table = table;
        }

        // Auth
        if let Ok(key) = std::env::var("CLASSIFIER_API_KEY") {
            config.auth.api_key = Some(key);
        }

        config
    }

    /// Load configuration from file if it exists, otherwise from environment
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> Result<Self, ConfigError> {
        if let Some(p) = path {
            if p.as_ref().exists() {
                return Self::from_file(p);
            }
        }
        Ok(Self::from_env())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
