//! Raspberry Pi board detection

use soundctl_core::domain::system::{BoardInfo, BoardProbe};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Board probe reading the device-tree model and the ALSA card list
pub struct RaspberryPiBoard {
    model_path: PathBuf,
    cards_path: PathBuf,
}

impl RaspberryPiBoard {
    pub fn new(model_path: impl Into<PathBuf>, cards_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            cards_path: cards_path.into(),
        }
    }

    fn model(&self) -> String {
        match fs::read_to_string(&self.model_path) {
            Ok(model) => model.trim_end_matches('\0').trim().to_string(),
            Err(e) => {
                warn!(path = %self.model_path.display(), error = %e, "Unable to read board model");
                String::new()
            }
        }
    }
}

/// Whether a board model carries the bcm2835 analog audio output
///
/// Zero boards, compute modules and the Pi 5 have no onboard audio jack.
pub fn has_onboard_audio(model: &str) -> bool {
    model.starts_with("Raspberry Pi")
        && !model.contains("Zero")
        && !model.contains("Compute Module")
        && !model.starts_with("Raspberry Pi 5")
}

impl BoardProbe for RaspberryPiBoard {
    fn board_info(&self) -> BoardInfo {
        let model = self.model();
        let audio = has_onboard_audio(&model);
        debug!(%model, audio, "Board detected");
        BoardInfo { model, audio }
    }

    fn audio_hardware_present(&self) -> bool {
        match fs::read_to_string(&self.cards_path) {
            Ok(cards) => cards.lines().any(|line| line.contains("bcm2835")),
            Err(e) => {
                debug!(path = %self.cards_path.display(), error = %e, "No ALSA card list");
                false
            }
        }
    }
}
