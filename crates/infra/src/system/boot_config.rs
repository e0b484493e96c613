//! Boot config (`/boot/config.txt`) editor
//!
//! Only the `dtparam=audio=on|off` overlay flag is managed here. Other lines
//! are preserved as they are.

use soundctl_core::domain::system::BootConfig;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::{debug, error};

const AUDIO_PARAM: &str = "dtparam=audio=";

pub struct ConfigTxt {
    path: PathBuf,
}

impl ConfigTxt {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read(&self) -> io::Result<String> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e),
        }
    }

    fn set_audio(&self, on: bool) -> bool {
        let result = self
            .read()
            .and_then(|content| fs::write(&self.path, with_audio_param(&content, on)));

        match result {
            Ok(()) => {
                debug!(path = %self.path.display(), on, "Audio overlay flag written");
                true
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Unable to update boot config");
                false
            }
        }
    }
}

impl BootConfig for ConfigTxt {
    fn enable_audio(&self) -> bool {
        self.set_audio(true)
    }

    fn disable_audio(&self) -> bool {
        self.set_audio(false)
    }

    fn is_audio_enabled(&self) -> bool {
        match self.read() {
            Ok(content) => audio_param(&content) == Some(true),
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Unable to read boot config");
                false
            }
        }
    }
}

/// Value of the last active `dtparam=audio` line
pub fn audio_param(content: &str) -> Option<bool> {
    content
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix(AUDIO_PARAM))
        .last()
        .map(|value| value.trim() == "on")
}

/// Rewrite the content so exactly one active `dtparam=audio` line remains
///
/// The first existing line (commented or not) is replaced in place; any
/// other occurrence is dropped. The line is appended when absent.
pub fn with_audio_param(content: &str, on: bool) -> String {
    let wanted = format!("{}{}", AUDIO_PARAM, if on { "on" } else { "off" });
    let mut replaced = false;
    let mut lines = Vec::new();

    for line in content.lines() {
        let bare = line.trim().trim_start_matches('#').trim();
        if bare.starts_with(AUDIO_PARAM) {
            if !replaced {
                lines.push(wanted.clone());
                replaced = true;
            }
            continue;
        }
        lines.push(line.to_string());
    }

    if !replaced {
        lines.push(wanted);
    }

    let mut output = lines.join("\n");
    output.push('\n');
    output
}
