//! Interfaces to the host system
//!
//! Board detection, boot config editing, ALSA default-device config editing
//! and the raw ALSA command wrapper. Linux implementations live in the
//! `infra` crate; tests provide fakes.

use crate::domain::audio::{AlsaDevice, Direction, MixerControl};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What the board reports about itself
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardInfo {
    pub model: String,
    /// Board has an onboard audio chip
    pub audio: bool,
}

pub trait BoardProbe: Send + Sync {
    fn board_info(&self) -> BoardInfo;

    /// The kernel currently exposes the onboard audio card.
    ///
    /// A board can support onboard audio yet have it disabled upstream, in
    /// which case this is `false` while `board_info().audio` is `true`.
    fn audio_hardware_present(&self) -> bool;
}

/// Editor for the board boot config (device-tree overlay flags)
pub trait BootConfig: Send + Sync {
    fn enable_audio(&self) -> bool;
    fn disable_audio(&self) -> bool;
    fn is_audio_enabled(&self) -> bool;
}

/// Editor for the ALSA default-device config file
pub trait AsoundConfig: Send + Sync {
    fn exists(&self) -> bool;
    fn delete(&self) -> bool;
    fn save_default_file(&self, card_id: u32, device_id: u32) -> bool;
}

/// Raw ALSA command wrapper
pub trait AlsaCommands: Send + Sync {
    /// Set a mixer control by numeric id
    ///
    /// `card_id` addresses the card's own ctl; `None` uses the default ctl.
    fn amixer_control(&self, card_id: Option<u32>, numid: u32, value: i64) -> bool;

    /// Read back a mixer control value
    fn control_value(&self, card_id: Option<u32>, numid: u32) -> Option<i64>;

    /// Persist the live mixer state
    fn save(&self) -> bool;

    fn get_volume(&self, direction: Direction) -> Option<u8>;

    fn set_volume(&self, direction: Direction, value: u8) -> Option<u8>;

    fn playback_devices(&self) -> Vec<AlsaDevice>;

    fn controls(&self, card_id: u32) -> Vec<MixerControl>;

    /// Play a short test tone on the default device
    fn play_sound(&self) -> bool;

    /// Record from the default device then play the recording back
    fn record_sound(&self, duration: Duration) -> bool;
}
