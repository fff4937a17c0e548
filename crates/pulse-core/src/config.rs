use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::Result;

use crate::error::StoreError;
use crate::sanitize::{LineBreaks, TextFormatter};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
pub const SERVER_URL_ENV: &str = "PULSE_SERVER_URL";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub server_url: String,
    /// Zero disables the timeout.
    pub request_timeout_secs: u64,
    pub strip_table_markup: bool,
    pub line_breaks: LineBreaks,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            request_timeout_secs: 120,
            strip_table_markup: true,
            line_breaks: LineBreaks::Html,
        }
    }
}

/// `<config_dir>/pulse`
pub fn config_dir() -> Result<PathBuf, StoreError> {
    dirs::config_dir()
        .map(|dir| dir.join("pulse"))
        .ok_or(StoreError::NoConfigDir)
}

impl Config {
    /// Load from the default location, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::get_config_path()?)?;
        if let Ok(url) = std::env::var(SERVER_URL_ENV) {
            if !url.trim().is_empty() {
                config.server_url = url;
            }
        }
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    pub fn formatter(&self) -> TextFormatter {
        TextFormatter {
            strip_table_markup: self.strip_table_markup,
            line_breaks: self.line_breaks,
        }
    }

    fn get_config_path() -> Result<PathBuf> {
        Ok(config_dir()?.join("config.json"))
    }
}
