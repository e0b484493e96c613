//! Audio domain types and errors
//!
//! This module defines the platform-agnostic values exchanged between the
//! driver manager, the sound drivers and the host: volumes, device
//! descriptors and the error taxonomy. Hardware access lives in the
//! `infra` crate.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur in the sound subsystem
#[derive(Debug, Error)]
pub enum SoundError {
    /// A required caller parameter was not supplied
    #[error("Parameter \"{0}\" is missing")]
    MissingParameter(String),

    /// A caller parameter was supplied but is unusable
    #[error("{0}")]
    InvalidParameter(String),

    /// The requested operation could not be carried out
    #[error("{0}")]
    CommandFailed(String),

    /// The board cannot host the driver at all
    #[error("{0}")]
    Fatal(String),

    /// Persisted configuration could not be read or written
    #[error("Configuration error: {0}")]
    Config(#[from] crate::domain::config::ConfigError),
}

impl SoundError {
    /// `Parameter "<name>" is invalid (specified="<value>")`
    pub fn invalid_value(name: &str, specified: &str) -> Self {
        SoundError::InvalidParameter(format!(
            "Parameter \"{}\" is invalid (specified=\"{}\")",
            name, specified
        ))
    }

    /// `Parameter "<name>" must be of type "<type>"`
    pub fn invalid_type(name: &str, type_name: &str) -> Self {
        SoundError::InvalidParameter(format!(
            "Parameter \"{}\" must be of type \"{}\"",
            name, type_name
        ))
    }

    /// `Parameter "<name>" must be 0<=<name><=100`
    pub fn out_of_range(name: &str) -> Self {
        SoundError::InvalidParameter(format!(
            "Parameter \"{name}\" must be {min}<={name}<={max}",
            name = name,
            min = Volumes::MIN,
            max = Volumes::MAX
        ))
    }
}

pub type Result<T> = std::result::Result<T, SoundError>;

/// Audio stream direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Playback,
    Capture,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Playback => write!(f, "playback"),
            Direction::Capture => write!(f, "capture"),
        }
    }
}

/// Playback and capture volume levels in percent
///
/// `None` means the direction is not applicable for the driver (or no driver
/// is active at all).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volumes {
    pub playback: Option<u8>,
    pub capture: Option<u8>,
}

impl Volumes {
    pub const MIN: i64 = 0;
    pub const MAX: i64 = 100;

    pub fn new(playback: Option<u8>, capture: Option<u8>) -> Self {
        Self { playback, capture }
    }

    /// Volumes reported when no driver can answer
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Check a caller supplied level and narrow it to a percentage
    pub fn checked_level(name: &str, value: i64) -> Result<u8> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(SoundError::out_of_range(name));
        }
        u8::try_from(value).map_err(|_| SoundError::out_of_range(name))
    }
}

/// Hardware description of the device handled by a driver
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub deviceid: Option<u32>,
    pub cardid: Option<u32>,
    pub cardname: Option<String>,
    pub playback: bool,
    pub capture: bool,
}

/// A PCM device as listed by ALSA
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlsaDevice {
    pub card_id: u32,
    pub card_name: String,
    pub device_id: u32,
    pub device_name: String,
}

/// A mixer control exposed by a sound card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixerControl {
    pub numid: u32,
    pub name: String,
}
