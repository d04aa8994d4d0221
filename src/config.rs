//! Configuration management

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_LANGUAGE: &str = "fr-FR";
pub const DEFAULT_CORS_RELAY: &str = "https://corsproxy.io/?";
pub const DEFAULT_PREVIEW_PLAYER: &str = "ffplay";
pub const DEFAULT_USER_AGENT: &str = concat!("Epikodi/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub tmdb_api_key: String,
    #[serde(default = "default_language")]
    pub language: String,
    /// Prefix the music catalog URLs are wrapped in; empty calls the catalog directly
    #[serde(default = "default_cors_relay")]
    pub cors_relay: String,
    #[serde(default = "default_preview_player")]
    pub preview_player: String,
    #[serde(default = "default_volume")]
    pub preview_volume: u8,
    #[serde(default = "default_true")]
    pub dark_mode: bool,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_language() -> String { DEFAULT_LANGUAGE.to_string() }
fn default_cors_relay() -> String { DEFAULT_CORS_RELAY.to_string() }
fn default_preview_player() -> String { DEFAULT_PREVIEW_PLAYER.to_string() }
fn default_user_agent() -> String { DEFAULT_USER_AGENT.to_string() }
fn default_volume() -> u8 { 100 }
fn default_true() -> bool { true }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tmdb_api_key: String::new(),
            language: default_language(),
            cors_relay: default_cors_relay(),
            preview_player: default_preview_player(),
            preview_volume: default_volume(),
            dark_mode: true,
            user_agent: default_user_agent(),
        }
    }
}

/// Application directory under the platform config dir
pub fn app_dir() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("epikodi");
    path
}

impl AppConfig {
    fn config_path() -> PathBuf {
        app_dir().join("config.json")
    }

    pub fn load() -> Self {
        let mut config = Self::load_from(&Self::config_path());
        config.apply_env();
        config
    }

    /// Missing or unreadable files fall back to defaults
    pub fn load_from(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring unreadable config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// `TMDB_API_KEY` fills in a key the settings file does not carry
    fn apply_env(&mut self) {
        if self.tmdb_api_key.is_empty() {
            if let Ok(key) = std::env::var("TMDB_API_KEY") {
                self.tmdb_api_key = key.trim().to_string();
            }
        }
    }

    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("config.json"));
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.language, "fr-FR");
        assert_eq!(config.cors_relay, "https://corsproxy.io/?");
    }

    #[test]
    fn test_partial_file_keeps_defaults_for_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"tmdb_api_key":"abc","preview_player":"mpv"}"#).unwrap();
        let config = AppConfig::load_from(&path);
        assert_eq!(config.tmdb_api_key, "abc");
        assert_eq!(config.preview_player, "mpv");
        assert_eq!(config.preview_volume, 100);
        assert!(config.dark_mode);
    }

    #[test]
    fn test_corrupt_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(AppConfig::load_from(&path), AppConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.json");
        let config = AppConfig {
            language: "en-US".to_string(),
            cors_relay: String::new(),
            preview_volume: 40,
            ..AppConfig::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(AppConfig::load_from(&path), config);
    }
}
