//! ALSA default-device config (`/etc/asound.conf`) editor

use soundctl_core::domain::system::AsoundConfig;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::{debug, error};

pub struct EtcAsoundConf {
    path: PathBuf,
}

impl EtcAsoundConf {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Config routing the ALSA default pcm and ctl to a hardware card
pub fn default_file_content(card_id: u32, device_id: u32) -> String {
    format!(
        "pcm.!default {{\n    type hw\n    card {card}\n    device {device}\n}}\n\n\
         ctl.!default {{\n    type hw\n    card {card}\n}}\n",
        card = card_id,
        device = device_id
    )
}

impl AsoundConfig for EtcAsoundConf {
    fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Deleting a missing file counts as success
    fn delete(&self) -> bool {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "ALSA config deleted");
                true
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => true,
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Unable to delete ALSA config");
                false
            }
        }
    }

    fn save_default_file(&self, card_id: u32, device_id: u32) -> bool {
        match fs::write(&self.path, default_file_content(card_id, device_id)) {
            Ok(()) => {
                debug!(path = %self.path.display(), card_id, device_id, "ALSA config saved");
                true
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Unable to save ALSA config");
                false
            }
        }
    }
}
