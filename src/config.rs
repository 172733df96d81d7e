//! Configuration management for game-spec
//!
//! Config file location:
//! - Linux: ~/.config/game-spec/config.toml
//! - macOS: ~/Library/Application Support/game-spec/config.toml
//! - Windows: %APPDATA%/game-spec/config.toml
//!
//! You can override the config location by setting `GAME_SPEC_CONFIG_PATH`.
//! The OpenRouter API key is only ever read from `OPENROUTER_API_KEY`.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "GAME_SPEC_CONFIG_PATH";
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";
pub const MODEL_ENV: &str = "OPENROUTER_MODEL";
pub const BASE_URL_ENV: &str = "OPENROUTER_BASE_URL";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Compatibility analyzer settings
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// Where game requirements come from
    #[serde(default)]
    pub requirements: RequirementsConfig,
}

impl Config {
    /// Load configuration from file, or defaults when there is none
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", config_path.display()))
    }

    /// Save configuration to file
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(config_path, toml)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Ok(PathBuf::from(trimmed));
            }
        }

        let proj_dirs = ProjectDirs::from("com", "gamespec", "game-spec")
            .context("Could not determine project directories")?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Apply `OPENROUTER_MODEL` / `OPENROUTER_BASE_URL` on top of the file.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(model) = non_empty_env(MODEL_ENV) {
            self.analyzer.model = Some(model);
        }
        if let Some(base_url) = non_empty_env(BASE_URL_ENV) {
            self.analyzer.base_url = base_url;
        }
        self
    }
}

/// Analyzer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Chat-completions base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier (e.g., "openai/gpt-4o-mini")
    #[serde(default)]
    pub model: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Number of retry attempts for transient network errors
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: None,
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            temperature: default_temperature(),
        }
    }
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    2
}

fn default_temperature() -> f64 {
    0.2
}

/// Requirements source configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementsConfig {
    /// TOML catalog of game requirements
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
}

/// API key from the environment; never persisted.
pub fn api_key() -> Option<String> {
    non_empty_env(API_KEY_ENV)
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.analyzer.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(config.analyzer.timeout_seconds, 60);
        assert_eq!(config.analyzer.max_retries, 2);
        assert_eq!(config.analyzer.temperature, 0.2);
        assert!(config.analyzer.model.is_none());
        assert!(config.requirements.catalog_path.is_none());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[analyzer]\nmodel = \"openai/gpt-4o-mini\"\n\n[requirements]\ncatalog_path = \"/srv/games.toml\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.analyzer.model.as_deref(), Some("openai/gpt-4o-mini"));
        assert_eq!(config.analyzer.timeout_seconds, 60);
        assert_eq!(
            config.requirements.catalog_path,
            Some(PathBuf::from("/srv/games.toml"))
        );
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.analyzer.max_retries = 5;

        config.save_to(&path).unwrap();
        let saved = fs::read_to_string(&path).unwrap();
        assert!(saved.contains("[analyzer]"));
        assert!(!saved.contains("api_key"));
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[analyzer\nbase_url = 3").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
