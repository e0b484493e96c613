//! Driver manager
//!
//! Orchestrates the sound drivers: runs the startup sequence, switches the
//! active device without leaving the board silent, and forwards volume
//! requests to whichever driver is selected. It never touches hardware
//! itself; every mutation goes through a `SoundDriver` looked up by name.

use crate::domain::audio::{DeviceDescriptor, Result, SoundError, Volumes};
use crate::domain::config::SelectionStore;
use crate::domain::driver::SoundDriver;
use crate::domain::registry::DriverRegistry;
use crate::domain::system::{AlsaCommands, BoardProbe};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

/// Resource claimed while sound is played
pub const PLAYBACK_RESOURCE: &str = "audio.playback";
/// Resource claimed while sound is recorded
pub const CAPTURE_RESOURCE: &str = "audio.capture";

const DEFAULT_RECORD_DURATION: Duration = Duration::from_secs(5);

/// One registered driver as reported to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub name: String,
    pub label: String,
    pub enabled: bool,
    pub installed: bool,
    pub device: DeviceDescriptor,
}

/// Registered drivers partitioned by hardware capability
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceLists {
    pub playback: Vec<DeviceEntry>,
    pub capture: Vec<DeviceEntry>,
}

/// Snapshot returned by `get_module_config`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub devices: DeviceLists,
    pub volumes: Volumes,
}

/// Orchestrator of the sound drivers
pub struct DriverManager {
    registry: Arc<dyn DriverRegistry>,
    board: Arc<dyn BoardProbe>,
    alsa: Arc<dyn AlsaCommands>,
    selection: Arc<dyn SelectionStore>,
    record_duration: Duration,
    claimed_resources: Mutex<BTreeSet<String>>,
}

impl DriverManager {
    pub fn new(
        registry: Arc<dyn DriverRegistry>,
        board: Arc<dyn BoardProbe>,
        alsa: Arc<dyn AlsaCommands>,
        selection: Arc<dyn SelectionStore>,
    ) -> Self {
        Self {
            registry,
            board,
            alsa,
            selection,
            record_duration: DEFAULT_RECORD_DURATION,
            claimed_resources: Mutex::new(BTreeSet::new()),
        }
    }

    pub fn with_record_duration(mut self, duration: Duration) -> Self {
        self.record_duration = duration;
        self
    }

    /// Run the startup sequence
    ///
    /// `onboard` builds the onboard driver. It is only called when the board
    /// supports onboard audio, and that driver becomes the fallback selection
    /// when the persisted one cannot be used.
    #[instrument(skip(self, onboard))]
    pub fn start<F>(&self, onboard: F) -> Result<()>
    where
        F: FnOnce() -> Arc<dyn SoundDriver>,
    {
        let board = self.board.board_info();
        if !board.audio {
            info!(model = %board.model, "Board has no onboard audio, no driver registered");
            return Ok(());
        }

        let default_driver = onboard();
        let default_name = default_driver.name().to_string();
        self.registry.register(default_driver);

        for driver in self.registry.drivers() {
            if !driver.is_installed() {
                info!(driver = driver.name(), "Installing driver");
                driver.install()?;
            }
        }

        let selected = self
            .selection
            .selected_driver()
            .and_then(|name| self.registry.get_driver(&name))
            .filter(|driver| driver.is_installed());
        if let Some(driver) = selected {
            debug!(driver = driver.name(), "Selected driver is available");
            return Ok(());
        }

        warn!(driver = %default_name, "No usable driver selected, falling back to default driver");
        let Some(default_driver) = self.registry.get_driver(&default_name) else {
            error!(driver = %default_name, "Default driver is not registered");
            return Ok(());
        };
        self.selection.set_selected_driver(&default_name)?;

        if !self.board.audio_hardware_present() {
            info!(driver = %default_name, "Onboard audio is disabled on this board, driver not enabled");
        } else if !default_driver.enable() {
            error!(driver = %default_name, "Unable to enable default driver");
        }

        Ok(())
    }

    /// Currently selected driver, if it is selected and registered
    fn selected_driver(&self) -> Option<Arc<dyn SoundDriver>> {
        let name = self.selection.selected_driver()?;
        let driver = self.registry.get_driver(&name);
        if driver.is_none() {
            debug!(driver = %name, "Selected driver not found");
        }
        driver
    }

    /// Snapshot of every registered device and the current volumes
    pub fn get_module_config(&self) -> ModuleConfig {
        let mut devices = DeviceLists::default();

        for driver in self.registry.drivers() {
            let entry = DeviceEntry {
                name: driver.name().to_string(),
                label: driver.label().to_string(),
                enabled: driver.is_enabled(),
                installed: driver.is_installed(),
                device: driver.device_info(),
            };

            if entry.device.playback {
                devices.playback.push(entry.clone());
            }
            if entry.device.capture {
                devices.capture.push(entry);
            }
        }

        ModuleConfig {
            devices,
            volumes: self.get_volumes(),
        }
    }

    /// Switch the active audio device
    ///
    /// The previous driver is disabled first. If the new one can't be
    /// enabled, the previous one is enabled again before failing.
    #[instrument(skip(self))]
    pub fn select_device(&self, driver_name: Option<&str>) -> Result<()> {
        let driver_name =
            driver_name.ok_or_else(|| SoundError::MissingParameter("driver_name".to_string()))?;
        if driver_name.is_empty() {
            return Err(SoundError::invalid_value("driver_name", driver_name));
        }

        let old_driver = self.selected_driver().filter(|driver| driver.is_installed());
        if let Some(old) = &old_driver {
            debug!(driver = old.name(), "Disabling current driver");
            if !old.disable() {
                warn!(driver = old.name(), "Unable to disable current driver, continuing");
            }
        }

        let new_driver = self.registry.get_driver(driver_name).ok_or_else(|| {
            SoundError::InvalidParameter("Specified driver does not exist".to_string())
        })?;
        if !new_driver.is_installed() {
            return Err(SoundError::InvalidParameter(
                "Can't selected device because its driver seems not to be installed".to_string(),
            ));
        }

        if !new_driver.enable() {
            error!(driver = driver_name, "Unable to enable selected driver");
            if let Some(old) = &old_driver {
                info!(driver = old.name(), "Enabling previous driver again");
                if !old.enable() {
                    error!(driver = old.name(), "Unable to enable previous driver");
                }
            }
            return Err(SoundError::CommandFailed(
                "Unable to enable selected device".to_string(),
            ));
        }

        self.selection.set_selected_driver(driver_name)?;
        info!(driver = driver_name, "Audio device selected");
        Ok(())
    }

    /// Volumes of the selected driver, or nothing when no driver is active
    pub fn get_volumes(&self) -> Volumes {
        match self.selected_driver() {
            Some(driver) => driver.get_volumes(),
            None => Volumes::unavailable(),
        }
    }

    /// Set volumes on the selected driver
    #[instrument(skip(self))]
    pub fn set_volumes(&self, playback: Option<i64>, capture: Option<i64>) -> Result<Volumes> {
        let playback =
            playback.ok_or_else(|| SoundError::MissingParameter("volume".to_string()))?;
        let playback = Volumes::checked_level("playback", playback)?;
        let capture = capture
            .map(|value| Volumes::checked_level("capture", value))
            .transpose()?;

        match self.selected_driver() {
            Some(driver) => Ok(driver.set_volumes(Some(playback), capture)),
            None => {
                debug!("No driver selected, volumes not applied");
                Ok(Volumes::unavailable())
            }
        }
    }

    /// Play a test tone on the default ALSA device
    ///
    /// The tone is played on a blocking task that is not awaited by the
    /// request path; its outcome is logged. Must be called from within a
    /// Tokio runtime.
    pub fn test_playing(&self) -> JoinHandle<bool> {
        let alsa = Arc::clone(&self.alsa);
        tokio::task::spawn_blocking(move || {
            let played = alsa.play_sound();
            if played {
                info!("Test sound played");
            } else {
                error!("Unable to play test sound");
            }
            played
        })
    }

    /// Record a short sample on the default ALSA device and play it back
    ///
    /// Resolves once the sample has been played back. The capture runs on a
    /// blocking task so the runtime keeps serving other requests meanwhile.
    #[instrument(skip(self))]
    pub async fn test_recording(&self) -> Result<()> {
        let alsa = Arc::clone(&self.alsa);
        let duration = self.record_duration;
        let recorded = tokio::task::spawn_blocking(move || alsa.record_sound(duration))
            .await
            .map_err(|e| SoundError::CommandFailed(format!("Recording task failed: {}", e)))?;

        if !recorded {
            error!("Unable to record test sound");
            return Err(SoundError::CommandFailed("Unable to record sound".to_string()));
        }
        info!("Test recording done");
        Ok(())
    }

    /// Host notification: another party acquired a resource
    pub fn on_resource_acquired(&self, resource: &str) {
        info!(resource, "Resource acquired");
        self.with_resources(|claimed| {
            claimed.insert(resource.to_string());
        });
    }

    /// Host notification: a resource was released
    pub fn on_resource_released(&self, resource: &str) {
        info!(resource, "Resource released");
        self.with_resources(|claimed| {
            claimed.remove(resource);
        });
    }

    /// Audio resources currently claimed according to host notifications
    pub fn claimed_resources(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.with_resources(|claimed| names = claimed.iter().cloned().collect());
        names
    }

    fn with_resources<F: FnOnce(&mut BTreeSet<String>)>(&self, f: F) {
        match self.claimed_resources.lock() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}
