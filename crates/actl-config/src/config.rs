//! Runtime configuration: executor/bridge endpoints, reconnect and
//! keepalive tuning, all overridable by environment variable, loaded from
//! a JSON file with an in-code default when the file is absent — the same
//! degrade-to-defaults shape the model history config file uses.

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Default path to the runtime config file.
pub const DEFAULT_CONFIG_PATH: &str = "config/controller.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// TCP port the Executor listens on.
    pub executor_port: u16,
    /// WebSocket URL of the Bridge.
    pub bridge_url: String,
    /// Path to the prompts file, passed to `actl_config::load_prompts`.
    pub prompts_path: String,
    /// Initial backoff before the first Bridge reconnect attempt, in seconds.
    pub reconnect_initial_secs: u64,
    /// Backoff ceiling for Bridge reconnect attempts, in seconds.
    pub reconnect_ceiling_secs: u64,
    /// Bridge ping interval, in seconds.
    pub ping_interval_secs: u64,
    /// How long to wait for a pong before considering the Bridge link dead.
    pub ping_timeout_secs: u64,
    /// Capacity of the bounded outbound queue to the Bridge.
    pub outbound_queue_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            executor_port: 9002,
            bridge_url: "ws://127.0.0.1:9013/ws/supervisor".to_string(),
            prompts_path: crate::prompts::DEFAULT_PROMPTS_PATH.to_string(),
            reconnect_initial_secs: 1,
            reconnect_ceiling_secs: 10,
            ping_interval_secs: 20,
            ping_timeout_secs: 20,
            outbound_queue_capacity: 1000,
        }
    }
}

impl ControllerConfig {
    /// Load from `path`, falling back to `Default` (with a logged warning)
    /// if the file is missing or fails to parse, then apply environment
    /// overrides on top.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path_ref = path.as_ref();
        let mut config = match fs::read_to_string(path_ref) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!(
                    "failed to parse config file {}: {e}, using defaults",
                    path_ref.display()
                );
                ControllerConfig::default()
            }),
            Err(_) => {
                log::warn!(
                    "config file {} not found, using defaults",
                    path_ref.display()
                );
                ControllerConfig::default()
            }
        };
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(port) = env::var("ACTL_EXECUTOR_PORT") {
            if let Ok(parsed) = port.parse() {
                self.executor_port = parsed;
            }
        }
        if let Ok(url) = env::var("ACTL_BRIDGE_URL") {
            self.bridge_url = url;
        }
        if let Ok(path) = env::var("ACTL_PROMPTS_PATH") {
            self.prompts_path = path;
        }
    }

    /// Persist the current config back to `path` as pretty JSON, creating
    /// parent directories first.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigSaveError> {
        let path_ref = path.as_ref();
        if let Some(parent) = path_ref.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigSaveError::Io {
                path: path_ref.display().to_string(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path_ref, json).map_err(|source| ConfigSaveError::Io {
            path: path_ref.display().to_string(),
            source,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigSaveError {
    #[error("failed to write config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}
