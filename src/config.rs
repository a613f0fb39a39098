//! Configuration management for mentor-voice.
//!
//! Loads config from a YAML file in one of the standard locations. Every
//! section falls back to its defaults when missing.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::api::QuotePosition;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL the `clone_voice` and `text_to_speech` endpoints hang off.
    pub base_url: String,
    pub timeout_secs: u64,
    pub connect_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9999/.netlify/functions".into(),
            timeout_secs: 120,
            connect_timeout_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Index into the host's input device list. `None` uses the default device.
    pub device_index: Option<usize>,
    /// Hard cap on a single sample, in seconds.
    pub max_duration: f64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device_index: None,
            max_duration: 300.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub include_quote: bool,
    pub quote_position: QuotePosition,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            include_quote: true,
            quote_position: QuotePosition::Start,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Speech engine executable. The text follows `args` after a `--`.
    pub command: String,
    pub args: Vec<String>,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            command: "espeak-ng".into(),
            args: vec![],
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Key-value store file. Empty means `~/.mentor-voice/storage.json`.
    pub path: String,
}

impl StorageConfig {
    pub fn resolved_path(&self) -> PathBuf {
        if self.path.is_empty() {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".mentor-voice")
                .join("storage.json")
        } else {
            PathBuf::from(&self.path)
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub audio: AudioConfig,
    pub speech: SpeechConfig,
    pub preview: PreviewConfig,
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from YAML file.
    ///
    /// Searches standard locations if no path is provided:
    /// 1. ./config.yaml
    /// 2. ~/.config/mentor-voice/config.yaml
    /// 3. /etc/mentor-voice/config.yaml
    pub fn load(path: Option<&Path>) -> Self {
        let resolved = path.map(PathBuf::from).or_else(|| {
            let candidates = [
                std::env::current_dir().ok().map(|d| d.join("config.yaml")),
                dirs::home_dir().map(|h| h.join(".config/mentor-voice/config.yaml")),
                Some(PathBuf::from("/etc/mentor-voice/config.yaml")),
            ];
            candidates.into_iter().flatten().find(|p| p.exists())
        });

        let Some(config_path) = resolved else {
            info!("No config file found, using defaults");
            return Self::default();
        };

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse {}: {e}, using defaults",
                        config_path.display()
                    );
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {e}, using defaults", config_path.display());
                Self::default()
            }
        }
    }

    pub fn parse(contents: &str) -> Result<Self, serde_yml::Error> {
        serde_yml::from_str(contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_section_defaults() {
        let config = Config::parse(
            "api:\n  base_url: http://voice.local/fn\nspeech:\n  quote_position: end\n",
        )
        .unwrap();

        assert_eq!(config.api.base_url, "http://voice.local/fn");
        assert_eq!(config.api.timeout_secs, 120);
        assert!(config.speech.include_quote);
        assert_eq!(config.speech.quote_position, QuotePosition::End);
        assert_eq!(config.preview.command, "espeak-ng");
        assert!(config.audio.device_index.is_none());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Config::load(Some(Path::new("/nonexistent/mentor-voice.yaml")));
        assert_eq!(config.api.base_url, ApiConfig::default().base_url);
    }

    #[test]
    fn explicit_storage_path_wins() {
        let storage = StorageConfig {
            path: "/tmp/mv.json".into(),
        };
        assert_eq!(storage.resolved_path(), PathBuf::from("/tmp/mv.json"));
        assert!(StorageConfig::default()
            .resolved_path()
            .ends_with(".mentor-voice/storage.json"));
    }
}
