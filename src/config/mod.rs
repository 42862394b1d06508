use crate::global;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera feeds, each watched and recorded independently.
    pub feeds: Vec<FeedConfig>,
    pub recording: RecordingConfig,
    pub playback: PlaybackConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Unique name, stored with every recording from this feed.
    pub name: String,
    /// WebSocket endpoint of the detection backend.
    pub url: String,
    /// Fixed delay before reconnecting after the socket closes.
    pub reconnect_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Number of frames kept as context before an alert starts.
    pub pre_alert_frames: usize,
    /// Completed recordings kept on disk; oldest are evicted first.
    pub max_recordings: usize,
    /// A status containing any of these (case-sensitive) is an alert.
    pub alert_markers: Vec<String>,
    /// Key the recordings collection is stored under.
    pub storage_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub frame_rate: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feeds: vec![
                FeedConfig::default(),
                FeedConfig::new("room", "ws://127.0.0.1:8766"),
            ],
            recording: RecordingConfig::default(),
            playback: PlaybackConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self::new("baby", "ws://127.0.0.1:8765")
    }
}

impl FeedConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            reconnect_delay_ms: 2000,
        }
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            pre_alert_frames: 5,
            max_recordings: 20,
            alert_markers: vec!["ALERT".to_string(), "ERROR".to_string()],
            storage_key: "@mama_bear_recordings".to_string(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self { frame_rate: 30 }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 3738,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;

        info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Feed names must be present and unique, and at least one feed configured.
    pub fn validate(&self) -> Result<()> {
        if self.feeds.is_empty() {
            bail!("No feeds configured; add a [[feeds]] entry");
        }
        let mut seen = HashSet::new();
        for feed in &self.feeds {
            if feed.name.trim().is_empty() {
                bail!("Feed {} has an empty name", feed.url);
            }
            if !seen.insert(feed.name.as_str()) {
                bail!("Feed name '{}' is used more than once", feed.name);
            }
        }
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}
