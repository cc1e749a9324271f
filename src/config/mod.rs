use crate::media::AudioSettings;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: String,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            level: "warn".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ToolsConfig {
    pub ytdlp: PathBuf,
    pub ffmpeg: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ytdlp: PathBuf::from("yt-dlp"),
            ffmpeg: PathBuf::from("ffmpeg"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub tools: ToolsConfig,
    pub audio: AudioSettings,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

/// Looks for a config file without requiring one.
pub fn find_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("CONFIG_FILE") {
        return Some(PathBuf::from(path));
    }

    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        let config_path = Path::new(&xdg_config_home)
            .join("mediagrab")
            .join("config.toml");
        if config_path.exists() {
            return Some(config_path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        let config_path = home.join(".config").join("mediagrab").join("config.toml");
        if config_path.exists() {
            return Some(config_path);
        }
    }

    None
}
