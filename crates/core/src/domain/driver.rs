//! Sound driver capability interface
//!
//! One implementation exists per supported hardware backend. The driver
//! manager only ever talks to hardware through this trait.

use crate::domain::audio::{DeviceDescriptor, Result, Volumes};

/// A pluggable audio backend
///
/// "Installed" means the hardware is exposed to the OS (for example a
/// device-tree overlay is present). "Enabled" means the device is also the
/// active ALSA default and unmuted.
pub trait SoundDriver: Send + Sync {
    /// Unique driver name used for registry lookups and persistence
    fn name(&self) -> &str;

    /// Human-readable label shown to users
    fn label(&self) -> &str;

    fn is_installed(&self) -> bool;

    /// Expose the hardware to the OS. Idempotent.
    fn install(&self) -> Result<()>;

    /// Hide the hardware from the OS. Idempotent.
    fn uninstall(&self) -> Result<()>;

    /// Make the device the active default. Returns `false` on any failure.
    fn enable(&self) -> bool;

    /// Release the device. Returns `false` on any failure.
    fn disable(&self) -> bool;

    fn is_enabled(&self) -> bool;

    /// Low-level hardware probe, independent from the ALSA config file
    fn is_card_enabled(&self) -> bool;

    fn device_info(&self) -> DeviceDescriptor;

    fn get_volumes(&self) -> Volumes;

    /// Apply volumes and return the levels actually set
    fn set_volumes(&self, playback: Option<u8>, capture: Option<u8>) -> Volumes;
}
