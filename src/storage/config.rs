//! JSON Configuration Management
//!
//! Handles reading and writing `~/.mindmate/config.json`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::models::settings::{AppConfig, SettingsUpdate};
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{config_path, ensure_dir};

/// Configuration service for managing app settings
#[derive(Debug)]
pub struct ConfigService {
    config_path: PathBuf,
    config: AppConfig,
}

impl ConfigService {
    /// Load the default config file, creating it with defaults if missing
    pub fn new() -> AppResult<Self> {
        Self::with_path(config_path()?)
    }

    /// Load (or create) the config file at `config_path`
    pub fn with_path(config_path: impl Into<PathBuf>) -> AppResult<Self> {
        let config_path = config_path.into();
        if let Some(parent) = config_path.parent() {
            ensure_dir(parent)?;
        }

        let config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            let default_config = AppConfig::default();
            Self::save_to_file(&config_path, &default_config)?;
            tracing::info!(path = %config_path.display(), "created default config");
            default_config
        };

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a file
    fn load_from_file(path: &Path) -> AppResult<AppConfig> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        config.validate().map_err(AppError::validation)?;
        Ok(config)
    }

    /// Save configuration to a file with pretty formatting
    fn save_to_file(path: &Path, config: &AppConfig) -> AppResult<()> {
        config.validate().map_err(AppError::validation)?;
        let content = serde_json::to_string_pretty(config)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Get the current configuration
    pub fn get_config(&self) -> &AppConfig {
        &self.config
    }

    /// Update the configuration with a partial update
    ///
    /// The in-memory config is left untouched if the result does not validate.
    pub fn update_config(&mut self, update: SettingsUpdate) -> AppResult<AppConfig> {
        let mut next = self.config.clone();
        next.apply_update(update);
        Self::save_to_file(&self.config_path, &next)?;
        self.config = next;
        Ok(self.config.clone())
    }

    /// Save the current configuration to disk
    pub fn save(&self) -> AppResult<()> {
        Self::save_to_file(&self.config_path, &self.config)
    }

    /// Reload configuration from disk
    pub fn reload(&mut self) -> AppResult<()> {
        self.config = Self::load_from_file(&self.config_path)?;
        Ok(())
    }

    /// Reset configuration to defaults
    pub fn reset(&mut self) -> AppResult<()> {
        self.config = AppConfig::default();
        self.save()
    }
}
