use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub networks: Vec<NetworkConfig>,
}

/// Saved credentials for a home network devices should join.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NetworkConfig {
    pub ssid: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Settings {
    pub discovery_timeout_secs: u64,
    pub http_timeout_secs: u64,
    pub setup_timeout_secs: u64,
    /// Wait after joining a device AP before talking to the device.
    pub settle_delay_ms: u64,
    /// SSID prefix of device access points, matched case-insensitively.
    pub ap_prefix: String,
    /// WiFi interface passed to nmcli; nmcli picks one when unset.
    pub interface: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            discovery_timeout_secs: 5,
            http_timeout_secs: 10,
            setup_timeout_secs: 20,
            settle_delay_ms: 2000,
            ap_prefix: "wemo.".to_string(),
            interface: None,
        }
    }
}

impl Settings {
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery_timeout_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn setup_timeout(&self) -> Duration {
        Duration::from_secs(self.setup_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = config_path()?;
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn save(&self) -> Result<()> {
        let path = config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn find_network(&self, ssid: &str) -> Option<&NetworkConfig> {
        self.networks.iter().find(|n| n.ssid == ssid)
    }

    pub fn add_network(&mut self, network: NetworkConfig) {
        // Remove existing entry with same SSID
        self.networks.retain(|n| n.ssid != network.ssid);
        self.networks.push(network);
    }
}

pub fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Could not determine config directory")?;
    Ok(config_dir.join("wemo-setup").join("config.toml"))
}
