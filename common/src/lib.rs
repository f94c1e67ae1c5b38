/*!
common/src/lib.rs

Shared configuration types and the canonical feed model for feedprobe.

This file provides:
- Config data structures (deserialized from TOML)
- An async loader for a TOML config file, with default + override merging
- The `feed` module: canonical feed, per-item view and API call metadata
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

pub mod feed;

pub use feed::{ApiCallMetadata, CanonicalFeed, CanonicalItem, Theme};

/// HTTP server configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address rocket binds to (e.g. "127.0.0.1")
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Upstream conversion services
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// Primary RSS-to-JSON converter, queried with `?rss_url=<feed>`
    pub rss2json_url: String,
    /// CORS relay, queried with `?url=<target>`, answers `{"contents": "..."}`
    pub relay_url: String,
    /// Fallback converter, reached through the relay
    pub rsstojson_url: String,
    pub user_agent: String,
    /// Client-wide timeout; unset leaves reqwest's default in place
    pub timeout_seconds: Option<u64>,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            rss2json_url: "https://api.rss2json.com/v1/api.json".to_string(),
            relay_url: "https://api.allorigins.win/get".to_string(),
            rsstojson_url: "https://api.rsstojson.com/v1/parser".to_string(),
            user_agent: "feedprobe/0.1.0".to_string(),
            timeout_seconds: None,
        }
    }
}

/// Parsed service base URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub rss2json: Url,
    pub relay: Url,
    pub rsstojson: Url,
}

impl ServicesConfig {
    pub fn endpoints(&self) -> Result<Endpoints> {
        Ok(Endpoints {
            rss2json: Url::parse(&self.rss2json_url)
                .with_context(|| format!("invalid services.rss2json_url: {}", self.rss2json_url))?,
            relay: Url::parse(&self.relay_url)
                .with_context(|| format!("invalid services.relay_url: {}", self.relay_url))?,
            rsstojson: Url::parse(&self.rsstojson_url)
                .with_context(|| format!("invalid services.rsstojson_url: {}", self.rsstojson_url))?,
        })
    }
}

/// Demo (mock) mode. Replaces live calls with the canned feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub mock_mode: bool,
    /// Simulated latency range for mock responses, in milliseconds
    pub mock_delay_min_ms: u64,
    pub mock_delay_max_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            mock_mode: false,
            mock_delay_min_ms: 500,
            mock_delay_max_ms: 1500,
        }
    }
}

/// Rendering configuration handed to the page renderer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub theme: Theme,
    pub max_items: usize,
    pub description_chars: usize,
    pub xml_indent: usize,
    /// Inputs larger than this are shown unformatted
    pub xml_max_bytes: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            max_items: 10,
            description_chars: 300,
            xml_indent: 2,
            xml_max_bytes: 2 * 1024 * 1024,
        }
    }
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub services: ServicesConfig,
    pub demo: DemoConfig,
    pub display: DisplayConfig,
}

impl Config {
    /// Load configuration from a TOML file asynchronously.
    ///
    /// Example:
    ///   let cfg = Config::from_file("config.toml").await?;
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let cfg: Config = toml::from_str(&data).context("Failed to parse TOML configuration")?;
        Ok(cfg)
    }

    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence).
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        for (path, label) in [(default_path, "default"), (override_path, "override")] {
            let Some(path) = path else { continue };
            if !path.exists() {
                continue;
            }
            let data = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {} config: {}", label, path.display()))?;
            let val: toml::Value = toml::from_str(&data)
                .with_context(|| format!("Failed to parse {} configuration", label))?;
            merge_toml(&mut config_value, val);
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        Ok(cfg)
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}
