//! Application configuration types for rolechat.
//!
//! `AppConfig` represents the top-level `config.toml`. Every field has a
//! default suitable for local development, so an empty file (or no file) is
//! a valid configuration.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Largest number of ids a single prune statement may carry.
pub const MAX_SYNC_BATCH: usize = 500;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory holding the built frontend, served as an SPA fallback.
    #[serde(default)]
    pub web_dir: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            web_dir: None,
        }
    }
}

/// Connection settings for the hosted agent provider.
///
/// `api_key` is read from config or `LETTA_API_KEY` and handed to the client,
/// which wraps it in a secret type. It is skipped when serializing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_embedding")]
    pub embedding: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.letta.com".to_string()
}

fn default_model() -> String {
    "openai/gpt-4o-mini".to_string()
}

fn default_embedding() -> String {
    "openai/text-embedding-3-small".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    300
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            model: default_model(),
            embedding: default_embedding(),
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Full sqlx connection URL. Overrides `name` when set.
    #[serde(default)]
    pub url: Option<String>,
    /// Database file stem under the data directory.
    #[serde(default = "default_db_name")]
    pub name: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_name() -> String {
    "rolechat".to_string()
}

fn default_max_connections() -> u32 {
    8
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            name: default_db_name(),
            max_connections: default_max_connections(),
        }
    }
}

/// Which role/message store implementation backs the process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Memory,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Sqlite => write!(f, "sqlite"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StorageBackend::Sqlite),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Allow only one in-flight chat turn per role.
    #[serde(default = "default_true")]
    pub serialize_turns: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            serialize_turns: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_true")]
    pub prune: bool,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl SyncConfig {
    /// Batch size clamped to `1..=MAX_SYNC_BATCH`.
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.clamp(1, MAX_SYNC_BATCH)
    }
}

fn default_batch_size() -> usize {
    MAX_SYNC_BATCH
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            prune: true,
            batch_size: default_batch_size(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub json: bool,
    #[serde(default)]
    pub otel: bool,
}

fn default_true() -> bool {
    true
}
