use crate::global;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub recording: RecordingConfig,
    pub poller: PollerConfig,
    pub summarizer: SummarizerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    /// Default language passed to upload/transcribe/summarize when the CLI
    /// does not override it.
    pub language: String,
    pub diarization: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Keep a local WAV copy of every finished recording.
    pub save_copies: bool,
    pub sample_rate: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    pub base_interval_seconds: u64,
    pub max_interval_seconds: u64,
    /// Minimum spacing between poll-triggered fetches. Manual refreshes
    /// bypass this.
    pub min_spacing_seconds: u64,
}

/// Alternate summarization endpoint, independent from the primary backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "https://speech-minute.onrender.com".to_string(),
            language: "en".to_string(),
            diarization: false,
        }
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            save_copies: false,
            sample_rate: 16000,
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            base_interval_seconds: 10,
            max_interval_seconds: 60,
            min_spacing_seconds: 5,
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

    fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_backend_config() {
        let config = Config::default();
        assert_eq!(config.backend.language, "en");
        assert!(!config.backend.diarization);
    }

    #[test]
    fn test_default_poller_config() {
        let config = PollerConfig::default();
        assert_eq!(config.base_interval_seconds, 10);
        assert_eq!(config.max_interval_seconds, 60);
        assert_eq!(config.min_spacing_seconds, 5);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: Config = toml::from_str("[backend]\nlanguage = \"zh\"\n").unwrap();
        assert_eq!(parsed.backend.language, "zh");
        assert_eq!(parsed.poller.base_interval_seconds, 10);
    }
}
