//! Config file for the Fire TV remote
//!
//! A flat JSON object. `device_ip` is the only key the original tool knew;
//! the others are optional and default when missing. A missing or broken
//! file is never an error: it just means no device is configured yet.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "firetv_config.json";

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Fire TV network address, e.g. "192.168.1.50"
    pub device_ip: Option<String>,
    /// Allow switching into continuous listening
    pub continuous_mode: bool,
    /// Extra spoken aliases: phrase -> canonical command
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub aliases: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device_ip: None,
            continuous_mode: true,
            aliases: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Where the config lives when no path is given: an existing file in the
    /// working directory wins, then the per-user config dir.
    pub fn default_path() -> PathBuf {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return local;
        }
        dirs::config_dir()
            .map(|p| p.join("firetv-voice").join(CONFIG_FILE_NAME))
            .unwrap_or(local)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the config; absent or unreadable files give the defaults
    pub fn load(&self) -> Config {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                tracing::info!("No config at {:?} ({}), using defaults", self.path, e);
                return Config::default();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", self.path);
                config
            }
            Err(e) => {
                tracing::warn!("Config parse error in {:?}: {}", self.path, e);
                Config::default()
            }
        }
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory {:?}", parent))?;
            }
        }
        let json = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write config file {:?}", self.path))?;
        tracing::info!("Saved config to {:?}", self.path);
        Ok(())
    }

    /// Store a new device address, keeping every other setting
    pub fn save_address(&self, address: &str) -> Result<Config> {
        let mut config = self.load();
        config.device_ip = Some(address.to_string());
        self.save(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.device_ip, None);
        assert!(config.continuous_mode);
        assert!(config.aliases.is_empty());
    }

    #[test]
    fn test_legacy_file_parses() {
        let config: Config = serde_json::from_str(r#"{"device_ip": "10.0.0.7"}"#).unwrap();
        assert_eq!(config.device_ip.as_deref(), Some("10.0.0.7"));
        assert!(config.continuous_mode);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let config: Config =
            serde_json::from_str(r#"{"device_ip": "10.0.0.7", "theme": "dark"}"#).unwrap();
        assert_eq!(config.device_ip.as_deref(), Some("10.0.0.7"));
    }

    #[test]
    fn test_full_file_parses() {
        let json = r#"{
            "device_ip": "10.0.0.7",
            "continuous_mode": false,
            "aliases": { "upwards": "up" }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(!config.continuous_mode);
        assert_eq!(config.aliases.get("upwards").map(String::as_str), Some("up"));
    }

    #[test]
    fn test_empty_aliases_are_not_written() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(!json.contains("aliases"));
        assert!(json.contains("\"device_ip\":null"));
    }
}
