//! Configuration management for cyclops-shell.
//!
//! Handles loading of the backend address, session behaviour and banner text.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Main configuration struct
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the Cyclops backend (http(s) or ws(s))
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Seconds to wait for the exec connection to open (1-120)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Key pressed with Ctrl to detach from the session
    #[serde(default = "default_detach_key")]
    pub detach_key: char,

    /// Leave as soon as the backend closes the session
    #[serde(default = "default_exit_on_close")]
    pub exit_on_close: bool,

    /// Text of the banner lines written into the terminal
    #[serde(default)]
    pub banners: Banners,

    /// Log file path; defaults to the user cache directory
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

fn default_backend_url() -> String {
    "ws://localhost:8080".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_detach_key() -> char {
    ']'
}

fn default_exit_on_close() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            connect_timeout_secs: default_connect_timeout(),
            detach_key: default_detach_key(),
            exit_on_close: default_exit_on_close(),
            banners: Banners::default(),
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from the default location, or defaults if missing
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific file, or defaults if missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Config = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate();

        Ok(config)
    }

    /// Clamp values into their supported ranges
    pub fn validate(&mut self) {
        self.connect_timeout_secs = self.connect_timeout_secs.clamp(1, 120);
        if crate::input::control_byte(self.detach_key).is_none() {
            self.detach_key = default_detach_key();
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Where logs go when no `log_file` is configured
    pub fn log_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.log_file {
            return Ok(path.clone());
        }
        let cache_dir = dirs::cache_dir().context("Could not find cache directory")?;
        Ok(cache_dir.join("cyclops-shell").join("cyclops-shell.log"))
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Directory holding config and recent targets
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not find config directory")?;
        Ok(config_dir.join("cyclops-shell"))
    }
}

/// Banner lines written into the terminal on lifecycle events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banners {
    #[serde(default = "default_connected")]
    pub connected: String,
    #[serde(default = "default_disconnected")]
    pub disconnected: String,
    /// Prefix for transport errors; the error detail follows it
    #[serde(default = "default_error")]
    pub error: String,
    /// Shown when a command is typed while no connection is open
    #[serde(default = "default_not_connected")]
    pub not_connected: String,
}

fn default_connected() -> String {
    "Connected to container shell.".to_string()
}

fn default_disconnected() -> String {
    "Disconnected from container shell.".to_string()
}

fn default_error() -> String {
    "Connection error".to_string()
}

fn default_not_connected() -> String {
    "Not connected: command discarded.".to_string()
}

impl Default for Banners {
    fn default() -> Self {
        Self {
            connected: default_connected(),
            disconnected: default_disconnected(),
            error: default_error(),
            not_connected: default_not_connected(),
        }
    }
}
