use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ChatError, Result};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama2";
pub const DEFAULT_GATEWAY_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:3000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Settings shared by the gateway and the terminal client.
///
/// Every field is optional in the file; the accessors fall back to defaults.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the Ollama server
    pub endpoint: Option<String>,
    /// Model identifier passed to Ollama
    pub model: Option<String>,
    /// Base URL of the gateway, used by the terminal client
    pub gateway_url: Option<String>,
    /// Socket address the gateway listens on
    pub bind_address: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the config file and applies environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::get_config_path()?)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Loads `path`, returning defaults when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    /// Overrides fields from `RAGCHAT_*` variables found by `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(endpoint) = lookup("RAGCHAT_ENDPOINT") {
            self.endpoint = Some(endpoint);
        }
        if let Some(model) = lookup("RAGCHAT_MODEL") {
            self.model = Some(model);
        }
        if let Some(url) = lookup("RAGCHAT_GATEWAY_URL") {
            self.gateway_url = Some(url);
        }
        if let Some(bind) = lookup("RAGCHAT_BIND") {
            self.bind_address = Some(bind);
        }
        if let Some(secs) = lookup("RAGCHAT_TIMEOUT_SECS") {
            match secs.parse() {
                Ok(secs) => self.timeout_secs = Some(secs),
                Err(_) => log::warn!("Ignoring invalid RAGCHAT_TIMEOUT_SECS={:?}", secs),
            }
        }
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn gateway_url(&self) -> &str {
        self.gateway_url.as_deref().unwrap_or(DEFAULT_GATEWAY_URL)
    }

    pub fn bind_address(&self) -> &str {
        self.bind_address.as_deref().unwrap_or(DEFAULT_BIND_ADDRESS)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ChatError::Config("could not determine config directory".to_string()))?;

        Ok(config_dir.join("ragchat").join("config.json"))
    }
}
