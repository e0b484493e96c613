//! Onboard sound chip driver
//!
//! Drives the board's built-in bcm2835 codec. "Installed" is the audio
//! overlay flag in the boot config; "enabled" is the ALSA default-device
//! config pointing at the card plus the codec route control being set.

use soundctl_core::domain::audio::{DeviceDescriptor, Direction, Result, SoundError, Volumes};
use soundctl_core::domain::driver::SoundDriver;
use soundctl_core::domain::system::{AlsaCommands, AsoundConfig, BoardProbe, BootConfig};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const DRIVER_NAME: &str = "bcm2835";
const LABEL: &str = "Raspberry pi soundcard";

/// ALSA card names of the onboard chip start with this
const CARD_PREFIX: &str = "bcm2835";
const ROUTE_CONTROL: &str = "PCM Playback Route";
const DEFAULT_ROUTE_NUMID: u32 = 3;

/// Route values of the codec output control
const ROUTE_OFF: i64 = 0;
const ROUTE_ANALOG: i64 = 1;

pub struct OnboardDriver {
    board: Arc<dyn BoardProbe>,
    boot_config: Arc<dyn BootConfig>,
    asound: Arc<dyn AsoundConfig>,
    alsa: Arc<dyn AlsaCommands>,
}

impl OnboardDriver {
    pub fn new(
        board: Arc<dyn BoardProbe>,
        boot_config: Arc<dyn BootConfig>,
        asound: Arc<dyn AsoundConfig>,
        alsa: Arc<dyn AlsaCommands>,
    ) -> Self {
        Self {
            board,
            boot_config,
            asound,
            alsa,
        }
    }

    fn has_onboard_audio(&self) -> bool {
        self.board.board_info().audio
    }

    fn ensure_onboard_audio(&self) -> Result<()> {
        if !self.has_onboard_audio() {
            return Err(SoundError::Fatal(
                "Raspberry pi has no onboard audio device".to_string(),
            ));
        }
        Ok(())
    }

    /// ALSA card and device of the onboard chip, if the kernel exposes it
    pub fn card_and_device(&self) -> Option<(u32, u32)> {
        self.alsa
            .playback_devices()
            .into_iter()
            .find(|device| device.card_name.starts_with(CARD_PREFIX))
            .map(|device| (device.card_id, device.device_id))
    }

    /// Numeric id of the codec route control
    pub fn control_numid(&self, card_id: u32) -> u32 {
        let controls = self.alsa.controls(card_id);
        controls
            .iter()
            .find(|control| control.name == ROUTE_CONTROL)
            .or_else(|| controls.iter().find(|control| control.name.contains("Playback Route")))
            .map(|control| control.numid)
            .unwrap_or(DEFAULT_ROUTE_NUMID)
    }
}

impl SoundDriver for OnboardDriver {
    fn name(&self) -> &str {
        DRIVER_NAME
    }

    fn label(&self) -> &str {
        LABEL
    }

    fn is_installed(&self) -> bool {
        self.boot_config.is_audio_enabled()
    }

    fn install(&self) -> Result<()> {
        self.ensure_onboard_audio()?;

        if !self.asound.delete() {
            warn!("Unable to delete ALSA default device config");
        }
        if !self.boot_config.enable_audio() {
            return Err(SoundError::Fatal("Error enabling raspberry pi audio".to_string()));
        }

        info!(driver = DRIVER_NAME, "Onboard audio installed");
        Ok(())
    }

    fn uninstall(&self) -> Result<()> {
        self.ensure_onboard_audio()?;

        if !self.boot_config.disable_audio() {
            return Err(SoundError::Fatal("Error disabling raspberry pi audio".to_string()));
        }

        info!(driver = DRIVER_NAME, "Onboard audio uninstalled");
        Ok(())
    }

    fn enable(&self) -> bool {
        if !self.has_onboard_audio() {
            error!("Raspberry pi has no onboard audio device");
            return false;
        }

        let card = self.card_and_device();
        let deleted = self.asound.delete();
        if !deleted {
            warn!("Unable to delete stale ALSA default device config");
        }

        let Some((card_id, device_id)) = card else {
            warn!(driver = DRIVER_NAME, "Onboard sound card not found");
            return false;
        };
        let numid = self.control_numid(card_id);
        debug!(card_id, device_id, numid, "Enabling onboard sound card");

        if !self.asound.save_default_file(card_id, device_id) {
            error!(card_id, device_id, "Unable to save ALSA default device config");
            return false;
        }
        if !self.alsa.amixer_control(Some(card_id), numid, ROUTE_ANALOG) {
            error!(numid, "Unable to route onboard audio output");
            return false;
        }
        if !self.alsa.save() {
            warn!("Unable to store mixer state");
        }

        deleted
    }

    fn disable(&self) -> bool {
        if !self.has_onboard_audio() {
            error!("Raspberry pi has no onboard audio device");
            return false;
        }

        let card_id = self.card_and_device().map(|(card_id, _)| card_id);
        let numid = card_id
            .map(|card_id| self.control_numid(card_id))
            .unwrap_or(DEFAULT_ROUTE_NUMID);

        if !self.alsa.amixer_control(card_id, numid, ROUTE_OFF) {
            error!(numid, "Unable to mute onboard audio output");
            return false;
        }

        self.asound.delete()
    }

    fn is_enabled(&self) -> bool {
        self.is_card_enabled() && self.asound.exists()
    }

    fn is_card_enabled(&self) -> bool {
        let Some((card_id, _)) = self.card_and_device() else {
            return false;
        };
        let numid = self.control_numid(card_id);
        self.alsa.control_value(Some(card_id), numid) == Some(ROUTE_ANALOG)
    }

    fn device_info(&self) -> DeviceDescriptor {
        let device = self
            .alsa
            .playback_devices()
            .into_iter()
            .find(|device| device.card_name.starts_with(CARD_PREFIX));

        DeviceDescriptor {
            deviceid: device.as_ref().map(|d| d.device_id),
            cardid: device.as_ref().map(|d| d.card_id),
            cardname: device.map(|d| d.card_name),
            playback: true,
            capture: false,
        }
    }

    fn get_volumes(&self) -> Volumes {
        Volumes::new(self.alsa.get_volume(Direction::Playback), None)
    }

    fn set_volumes(&self, playback: Option<u8>, _capture: Option<u8>) -> Volumes {
        let playback = match playback {
            Some(level) => self.alsa.set_volume(Direction::Playback, level),
            None => self.alsa.get_volume(Direction::Playback),
        };
        Volumes::new(playback, None)
    }
}
