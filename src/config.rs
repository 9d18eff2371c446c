// Configuration management module
// Handles loading, saving, and validating the plugin settings

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::ScrobblePolicy;
use crate::threshold;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Which decision policy drives scrobbling
    #[serde(default)]
    pub policy: ScrobblePolicy,

    /// User threshold override in milliseconds, empty means "use the default"
    #[serde(default)]
    pub user_threshold: String,

    /// Fragment of the host module name that holds the submission method
    #[serde(default = "default_host_module")]
    pub host_module: String,

    /// Text cleanup configuration
    #[serde(default)]
    pub cleanup: CleanupConfig,
}

fn default_host_module() -> String {
    "MusicBee".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CleanupConfig {
    /// Enable text cleanup
    pub enabled: bool,

    /// Regex patterns to remove from track/album/artist names
    /// Applied in order, each pattern is removed from the text
    pub patterns: Vec<String>,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            patterns: vec![
                r"\s*\[Explicit\]".to_string(),
                r"\s*\[Clean\]".to_string(),
                r"\s*\(Explicit\)".to_string(),
                r"\s*\(Clean\)".to_string(),
            ],
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            policy: ScrobblePolicy::default(),
            user_threshold: String::new(),
            host_module: default_host_module(),
            cleanup: CleanupConfig::default(),
        }
    }
}

impl Config {
    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?;

        Ok(config_dir.join("short_track_scrobbler.conf"))
    }

    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from file, or create default if it doesn't exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            log::info!("Config file not found, creating default at {:?}", config_path);
            let default_config = Self::default();
            default_config.save_to(config_path)?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(config_path)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content)
            .context("Failed to parse config file")?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to file
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        fs::write(config_path, content)
            .context("Failed to write config file")?;

        log::info!("Config saved to {:?}", config_path);

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.host_module.trim().is_empty() {
            anyhow::bail!("host_module must not be empty");
        }

        // A bad override is not fatal, the resolver falls back to the default
        if let Err(e) = threshold::parse_override(&self.user_threshold) {
            log::warn!("{}; the default threshold will be used", e);
        }

        if self.cleanup.enabled && self.cleanup.patterns.is_empty() {
            log::warn!("Text cleanup is enabled but no patterns are configured");
        }

        Ok(())
    }

    /// Store a new threshold override after checking it parses
    pub fn set_user_threshold(&mut self, value: &str) -> Result<()> {
        let parsed = threshold::parse_override(value)?;
        if parsed.is_none() {
            anyhow::bail!("threshold override must not be empty, use reset-threshold instead");
        }
        self.user_threshold = value.trim().to_string();
        Ok(())
    }

    /// Drop the threshold override
    pub fn reset_user_threshold(&mut self) {
        self.user_threshold.clear();
    }
}
