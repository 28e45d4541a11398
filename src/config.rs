use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rpc::Network;
use crate::state::StateRecord;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub network: Network,
    pub address: String,
    pub timeout_ms: u64,
    pub ready_interval_ms: u64,
    pub state: StateConfig,
}

/// Initial field values of a served state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    pub data_dir: String,
    pub role: String,
    pub db_role: String,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            role: String::new(),
            db_role: String::new(),
        }
    }
}

impl StateConfig {
    pub fn record(&self) -> StateRecord {
        StateRecord {
            data_dir: self.data_dir.clone(),
            role: self.role.clone(),
            db_role: self.db_role.clone(),
            synced: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: Network::Tcp,
            address: "127.0.0.1:7420".to_string(),
            timeout_ms: 2000,
            ready_interval_ms: 1000,
            state: StateConfig::default(),
        }
    }
}

impl Config {
    /// Reads a JSON config file. Absent keys keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn ready_interval(&self) -> Duration {
        Duration::from_millis(self.ready_interval_ms)
    }
}
