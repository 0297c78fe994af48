//! Broker configuration.
//!
//! Loaded from a JSON file at startup. A missing file is a fatal error;
//! missing fields fall back to their defaults.

use crate::{Result, SilomqError};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
}

/// TCP bind address of the broker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory; segments live under `<data_dir>/<topic>/`, the
    /// offsets sidecar at `<data_dir>/offsets.json`.
    pub data_dir: String,
    /// Name of the single topic this process serves.
    pub topic: String,
    /// Reserved for batched fsync; every append currently syncs.
    pub sync_interval_ms: u64,
    /// Rotation threshold for the active segment.
    pub max_segment_size_bytes: u64,
    /// Age past which non-active segments are deleted.
    pub retention_ms: u64,
    /// Cadence of the retention cleaner.
    pub cleaner_interval_ms: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            topic: "events".to_string(),
            sync_interval_ms: 0,
            max_segment_size_bytes: 1024 * 1024 * 1024, // 1GB
            retention_ms: 7 * 24 * 60 * 60 * 1000,      // 7 days
            cleaner_interval_ms: 10_000,
        }
    }
}

impl BrokerConfig {
    /// Read the configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            SilomqError::Config(format!("could not open config file {}: {}", path.display(), e))
        })?;
        let config: BrokerConfig = serde_json::from_str(&contents).map_err(|e| {
            SilomqError::Config(format!("could not parse config file {}: {}", path.display(), e))
        })?;
        config.validate().map_err(SilomqError::Config)?;
        Ok(config)
    }

    /// Validate configuration bounds.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.storage.data_dir.is_empty() {
            return Err("storage.data_dir must not be empty".to_string());
        }
        if self.storage.topic.is_empty() {
            return Err("storage.topic must not be empty".to_string());
        }
        if self.storage.max_segment_size_bytes == 0 {
            return Err("storage.max_segment_size_bytes must be > 0".to_string());
        }
        if self.storage.cleaner_interval_ms == 0 {
            return Err("storage.cleaner_interval_ms must be > 0".to_string());
        }
        Ok(())
    }
}
