//! Configuration structures.
//!
//! One `Config` is built at startup (the binary fills it from CLI flags and
//! environment variables) and passed by reference to the store and server.

use super::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Pre-shared client token. Becomes the caller identity for the session.
    #[serde(default)]
    pub client_id: String,

    /// Remote store configuration.
    #[serde(default)]
    pub store: StoreConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Stdio transport configuration.
    #[serde(default)]
    pub ipc: IpcConfig,
}

impl Config {
    /// Check that everything needed to serve is present.
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(Error::config("client id is required (MCP_CLIENT_ID)"));
        }
        self.store.validate()?;
        if self.ipc.max_frame_bytes == 0 {
            return Err(Error::config("max_frame_bytes must be positive"));
        }
        Ok(())
    }
}

/// Which store implementation backs the summary tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// PostgREST-compatible HTTP endpoint (Supabase).
    #[default]
    Postgrest,
    /// Process-local map. Nothing survives a restart.
    Memory,
}

/// Remote store configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    /// Base URL of the store, e.g. `https://xyz.supabase.co`.
    pub url: String,

    /// Access credential sent as `apikey` and bearer token.
    pub api_key: String,

    /// Table holding summary rows.
    pub table: String,

    /// Per-request timeout enforced by the HTTP client.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// RPC function used to run the provisioning DDL.
    pub provision_rpc: String,
}

impl StoreConfig {
    pub fn validate(&self) -> Result<()> {
        if self.backend == StoreBackend::Memory {
            return Ok(());
        }
        let url = self.url.trim();
        if url.is_empty() {
            return Err(Error::config("store URL is required (SUPABASE_URL)"));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::config(format!(
                "store URL must be http(s), got '{}'",
                url
            )));
        }
        if self.api_key.trim().is_empty() {
            return Err(Error::config("store key is required (SUPABASE_KEY)"));
        }
        if self.table.trim().is_empty() {
            return Err(Error::config("store table cannot be empty"));
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Postgrest,
            url: String::new(),
            api_key: String::new(),
            table: "conversation_summaries".to_string(),
            request_timeout: Duration::from_secs(10),
            provision_rpc: "exec_sql".to_string(),
        }
    }
}

// Keeps the key out of debug logs.
impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("backend", &self.backend)
            .field("url", &self.url)
            .field("table", &self.table)
            .field("request_timeout", &self.request_timeout)
            .field("provision_rpc", &self.provision_rpc)
            .finish()
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ObservabilityConfig {
    /// Enable JSON log formatting.
    pub json_logs: bool,
}

/// Stdio transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcConfig {
    /// Maximum accepted request line in bytes. Larger frames are discarded.
    pub max_frame_bytes: usize,
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            max_frame_bytes: 4 * 1024 * 1024,
        }
    }
}
