//! Configuration management for soundctl
//!
//! This module provides:
//! - Configuration structs for the selected driver and system file locations
//! - TOML persistence through `ConfigManager`
//! - The `SelectionStore` seam the driver manager persists its selection through

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, error, info, instrument};

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur during configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Audio module settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Selected driver name (None = no driver selected)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
}

/// Locations of the system files the drivers edit or probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub boot_config_path: PathBuf,
    pub asound_conf_path: PathBuf,
    pub device_model_path: PathBuf,
    pub asound_cards_path: PathBuf,

    /// Length of the test recording in seconds
    pub record_duration_secs: u64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            boot_config_path: PathBuf::from("/boot/config.txt"),
            asound_conf_path: PathBuf::from("/etc/asound.conf"),
            device_model_path: PathBuf::from("/proc/device-tree/model"),
            asound_cards_path: PathBuf::from("/proc/asound/cards"),
            record_duration_secs: 5,
        }
    }
}

/// Complete soundctl configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoundctlConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub system: SystemConfig,
}

impl SoundctlConfig {
    /// Load configuration from TOML file
    #[instrument(skip(path))]
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading configuration");

        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Save configuration to TOML file
    #[instrument(skip(self, path))]
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        info!(path = %path.display(), "Saving configuration");

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_str = toml::to_string_pretty(self)?;
        fs::write(path, toml_str)?;

        debug!("Configuration saved successfully");
        Ok(())
    }
}

/// Persistence of the selected driver name
pub trait SelectionStore: Send + Sync {
    fn selected_driver(&self) -> Option<String>;

    fn set_selected_driver(&self, name: &str) -> Result<()>;
}

/// Selection kept in memory only
#[derive(Debug, Default)]
pub struct MemorySelectionStore {
    driver: Mutex<Option<String>>,
}

impl MemorySelectionStore {
    pub fn new(driver: Option<String>) -> Self {
        Self {
            driver: Mutex::new(driver),
        }
    }
}

impl SelectionStore for MemorySelectionStore {
    fn selected_driver(&self) -> Option<String> {
        match self.driver.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set_selected_driver(&self, name: &str) -> Result<()> {
        let mut guard = self
            .driver
            .lock()
            .map_err(|e| ConfigError::Invalid(format!("Lock error: {}", e)))?;
        *guard = Some(name.to_string());
        Ok(())
    }
}

/// Configuration manager for the main soundctl config
///
/// Manages `<config_dir>/config.toml` and keeps the last loaded
/// configuration in memory so selection updates can be written back.
pub struct ConfigManager {
    config_dir: PathBuf,
    config_path: PathBuf,
    current: Mutex<SoundctlConfig>,
}

impl ConfigManager {
    /// Create a new ConfigManager
    ///
    /// # Arguments
    /// * `config_dir` - Configuration directory path (e.g., `~/.config/soundctl`)
    pub fn new(config_dir: PathBuf) -> Self {
        let config_path = config_dir.join("config.toml");

        Self {
            config_dir,
            config_path,
            current: Mutex::new(SoundctlConfig::default()),
        }
    }

    /// Get the default config directory path
    ///
    /// Returns `~/.config/soundctl` on Linux
    pub fn default_config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("soundctl"))
            .ok_or_else(|| ConfigError::Invalid("Could not determine config directory".to_string()))
    }

    /// Get the config file path
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load configuration from file
    ///
    /// If the config file doesn't exist, returns the defaults and writes them.
    /// If the config file is corrupt, logs an error and returns the defaults.
    #[instrument(skip(self))]
    pub fn load(&self) -> SoundctlConfig {
        let config = if !self.config_path.exists() {
            info!(
                path = %self.config_path.display(),
                "Config file not found, creating default"
            );

            let config = SoundctlConfig::default();
            if let Err(e) = config.save_to_file(&self.config_path) {
                error!(
                    path = %self.config_path.display(),
                    error = %e,
                    "Failed to save default config"
                );
            }
            config
        } else {
            match SoundctlConfig::load_from_file(&self.config_path) {
                Ok(config) => config,
                Err(e) => {
                    error!(
                        path = %self.config_path.display(),
                        error = %e,
                        "Failed to load config, using default"
                    );

                    let backup_path = self.config_path.with_extension("toml.corrupt");
                    if let Err(copy_err) = fs::copy(&self.config_path, &backup_path) {
                        error!(
                            path = %backup_path.display(),
                            error = %copy_err,
                            "Failed to backup corrupt config"
                        );
                    }

                    SoundctlConfig::default()
                }
            }
        };

        self.replace_current(config.clone());
        config
    }

    /// Save configuration to file
    #[instrument(skip(self, config))]
    pub fn save(&self, config: &SoundctlConfig) -> Result<()> {
        fs::create_dir_all(&self.config_dir)?;
        config.save_to_file(&self.config_path)?;
        self.replace_current(config.clone());
        Ok(())
    }

    /// Check if config file exists
    pub fn exists(&self) -> bool {
        self.config_path.exists()
    }

    fn current(&self) -> SoundctlConfig {
        match self.current.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn replace_current(&self, config: SoundctlConfig) {
        match self.current.lock() {
            Ok(mut guard) => *guard = config,
            Err(poisoned) => *poisoned.into_inner() = config,
        }
    }
}

impl SelectionStore for ConfigManager {
    fn selected_driver(&self) -> Option<String> {
        self.current().audio.driver
    }

    fn set_selected_driver(&self, name: &str) -> Result<()> {
        let mut config = self.current();
        config.audio.driver = Some(name.to_string());
        self.save(&config)
    }
}
