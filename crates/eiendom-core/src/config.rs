//! Application configuration management.
//!
//! Configuration is a JSON file with a default for every field. It is looked
//! up, in order, at an explicit path, `./eiendom.json`, and
//! `~/.config/eiendom/config.json`; when none exists the defaults apply.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for the config directory path
const APP_NAME: &str = "eiendom";

/// Config file name inside the config directory
const CONFIG_FILE: &str = "config.json";

/// Config file name looked up in the working directory
const LOCAL_CONFIG_FILE: &str = "eiendom.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind: IpAddr,
    pub port: u16,
    /// Directory served for any path not handled by an API route
    pub static_root: PathBuf,
    pub tracks_dir: PathBuf,
    pub owners_path: PathBuf,
    pub cache_path: PathBuf,
    /// Output of the bulk pre-fetch
    pub prefetch_output: PathBuf,
    pub api_base_url: String,
    pub user_agent: String,
    /// EPSG code sent as `utkoordsys` / `koordsys`
    pub coordinate_system: u32,
    /// Pause after every successful geometry fetch
    pub request_delay_ms: u64,
    /// Unset means no timeout on outbound requests
    pub request_timeout_secs: Option<u64>,
    /// Directory for daily-rolling log files; stderr only when unset
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8081,
            static_root: PathBuf::from("."),
            tracks_dir: PathBuf::from("tracks"),
            owners_path: PathBuf::from("matrikkel_owners.json"),
            cache_path: PathBuf::from("matrikkel_cache.json"),
            prefetch_output: PathBuf::from("owners_polygons.geo.json"),
            api_base_url: "https://api.kartverket.no/eiendom/v1".to_string(),
            user_agent: "MapperApp/1.0".to_string(),
            coordinate_system: 4258,
            request_delay_ms: 100,
            request_timeout_secs: None,
            log_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from the first file found, or defaults.
    pub fn load(config_override: Option<&Path>) -> Result<Self> {
        if let Some(path) = config_override {
            return Self::load_from(path);
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Self::load_from(&local);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let path = config_dir.join(APP_NAME).join(CONFIG_FILE);
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        Ok(Self::default())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
