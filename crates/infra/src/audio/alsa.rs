//! ALSA command-line backend
//!
//! Wraps `amixer`, `alsactl`, `aplay`, `arecord` and `speaker-test`. Output
//! parsing is kept in free functions so it can be tested without a sound
//! card.

use soundctl_core::domain::audio::{AlsaDevice, Direction, MixerControl};
use soundctl_core::domain::system::AlsaCommands;
use std::ffi::OsStr;
use std::fmt::Debug;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Failure of an external ALSA tool
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unable to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Status {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

fn run<S: AsRef<OsStr> + Debug>(program: &str, args: &[S]) -> Result<String, ToolError> {
    debug!(program, ?args, "Running ALSA tool");

    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| ToolError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(ToolError::Status {
            program: program.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn run_ok<S: AsRef<OsStr> + Debug>(program: &str, args: &[S]) -> bool {
    match run(program, args) {
        Ok(_) => true,
        Err(e) => {
            warn!(error = %e, "ALSA tool failed");
            false
        }
    }
}

/// ALSA backend driving the standard command-line tools
#[derive(Debug, Clone)]
pub struct Alsa {
    playback_control: String,
    capture_control: String,
    record_file: PathBuf,
}

impl Default for Alsa {
    fn default() -> Self {
        Self::new("PCM", "Capture")
    }
}

impl Alsa {
    pub fn new(playback_control: &str, capture_control: &str) -> Self {
        Self {
            playback_control: playback_control.to_string(),
            capture_control: capture_control.to_string(),
            record_file: std::env::temp_dir().join("soundctl-record.wav"),
        }
    }

    fn simple_control(&self, direction: Direction) -> &str {
        match direction {
            Direction::Playback => &self.playback_control,
            Direction::Capture => &self.capture_control,
        }
    }
}

impl AlsaCommands for Alsa {
    fn amixer_control(&self, card_id: Option<u32>, numid: u32, value: i64) -> bool {
        let mut args = vec!["-q".to_string()];
        args.extend(control_args(card_id, "cset", numid));
        args.push(value.to_string());
        run_ok("amixer", &args)
    }

    fn control_value(&self, card_id: Option<u32>, numid: u32) -> Option<i64> {
        match run("amixer", &control_args(card_id, "cget", numid)) {
            Ok(stdout) => parse_control_value(&stdout),
            Err(e) => {
                warn!(error = %e, "Unable to read mixer control");
                None
            }
        }
    }

    fn save(&self) -> bool {
        run_ok("alsactl", &["store"])
    }

    fn get_volume(&self, direction: Direction) -> Option<u8> {
        match run("amixer", &["sget", self.simple_control(direction)]) {
            Ok(stdout) => parse_volume(&stdout),
            Err(e) => {
                warn!(%direction, error = %e, "Unable to read volume");
                None
            }
        }
    }

    fn set_volume(&self, direction: Direction, value: u8) -> Option<u8> {
        let level = format!("{}%", value.min(100));
        match run("amixer", &["sset", self.simple_control(direction), &level]) {
            Ok(stdout) => parse_volume(&stdout),
            Err(e) => {
                warn!(%direction, error = %e, "Unable to set volume");
                None
            }
        }
    }

    fn playback_devices(&self) -> Vec<AlsaDevice> {
        match run("aplay", &["-l"]) {
            Ok(stdout) => parse_devices(&stdout),
            Err(e) => {
                warn!(error = %e, "Unable to list playback devices");
                Vec::new()
            }
        }
    }

    fn controls(&self, card_id: u32) -> Vec<MixerControl> {
        let card = card_id.to_string();
        match run("amixer", &["-c", &card, "controls"]) {
            Ok(stdout) => parse_controls(&stdout),
            Err(e) => {
                warn!(card_id, error = %e, "Unable to list mixer controls");
                Vec::new()
            }
        }
    }

    fn play_sound(&self) -> bool {
        run_ok("speaker-test", &["-t", "sine", "-f", "440", "-l", "1", "-s", "1"])
    }

    fn record_sound(&self, duration: Duration) -> bool {
        let secs = duration.as_secs().max(1).to_string();
        let Some(file) = self.record_file.to_str() else {
            warn!(path = %self.record_file.display(), "Record file path is not valid UTF-8");
            return false;
        };

        let played = run_ok("arecord", &["-q", "-f", "cd", "-d", &secs, file])
            && run_ok("aplay", &["-q", file]);

        if let Err(e) = std::fs::remove_file(&self.record_file) {
            debug!(error = %e, "Record file not removed");
        }
        played
    }
}

/// `amixer` arguments for a control command on a card, or on the default ctl
pub fn control_args(card_id: Option<u32>, action: &str, numid: u32) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(card_id) = card_id {
        args.push("-c".to_string());
        args.push(card_id.to_string());
    }
    args.push(action.to_string());
    args.push(format!("numid={}", numid));
    args
}

/// Parse `amixer cget` output (`  : values=1`)
pub fn parse_control_value(output: &str) -> Option<i64> {
    output
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix(": values="))
        .last()
        .and_then(|values| values.split(',').next())
        .and_then(|value| value.trim().parse().ok())
}

/// Parse the first `[NN%]` level of `amixer sget`/`sset` output
pub fn parse_volume(output: &str) -> Option<u8> {
    output.lines().find_map(|line| {
        line.split('[')
            .skip(1)
            .find_map(|part| part.split_once("%]").and_then(|(level, _)| level.parse().ok()))
    })
}

/// Parse `aplay -l` output
///
/// `card 0: Headphones [bcm2835 Headphones], device 0: bcm2835 Headphones [bcm2835 Headphones]`
pub fn parse_devices(output: &str) -> Vec<AlsaDevice> {
    output
        .lines()
        .filter_map(|line| {
            let rest = line.strip_prefix("card ")?;
            let (card_id, rest) = rest.split_once(':')?;
            let card_name = bracketed(rest)?;
            let (_, device_part) = rest.split_once(", device ")?;
            let (device_id, device_rest) = device_part.split_once(':')?;
            let device_name = bracketed(device_rest).unwrap_or_else(|| device_rest.trim());

            Some(AlsaDevice {
                card_id: card_id.trim().parse().ok()?,
                card_name: card_name.to_string(),
                device_id: device_id.trim().parse().ok()?,
                device_name: device_name.to_string(),
            })
        })
        .collect()
}

fn bracketed(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text[start..].find(']')?;
    Some(&text[start + 1..start + end])
}

/// Parse `amixer controls` output (`numid=3,iface=MIXER,name='PCM Playback Route'`)
pub fn parse_controls(output: &str) -> Vec<MixerControl> {
    output
        .lines()
        .filter_map(|line| {
            let mut numid = None;
            let mut name = None;
            for field in line.trim().split(',') {
                if let Some(value) = field.strip_prefix("numid=") {
                    numid = value.parse().ok();
                } else if let Some(value) = field.strip_prefix("name=") {
                    name = Some(value.trim_matches('\'').to_string());
                }
            }
            Some(MixerControl {
                numid: numid?,
                name: name?,
            })
        })
        .collect()
}
