//! Command handlers exposed to the host
//!
//! The host sends a command name with a JSON params object. Parameters are
//! typed here, then the command runs against the driver manager and the
//! outcome is wrapped in the host's `{error, message, data}` envelope.

use crate::domain::audio::{Result, SoundError, Volumes};
use crate::domain::manager::{DriverManager, ModuleConfig};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Command types understood by the audio module
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    GetModuleConfig,
    SelectDevice {
        driver_name: Option<String>,
    },
    GetVolumes,
    SetVolumes {
        playback: Option<i64>,
        capture: Option<i64>,
    },
    TestPlaying,
    TestRecording,
}

impl Command {
    /// Build a command from its name and JSON parameters
    pub fn from_request(name: &str, params: &Value) -> Result<Self> {
        let command = match name {
            "get_module_config" => Command::GetModuleConfig,
            "select_device" => Command::SelectDevice {
                driver_name: optional_str(params, "driver_name")?,
            },
            "get_volumes" => Command::GetVolumes,
            "set_volumes" => Command::SetVolumes {
                playback: optional_int(params, "playback")?,
                capture: optional_int(params, "capture")?,
            },
            "test_playing" => Command::TestPlaying,
            "test_recording" => Command::TestRecording,
            other => {
                return Err(SoundError::CommandFailed(format!(
                    "Command \"{}\" doesn't exist",
                    other
                )))
            }
        };

        debug!(?command, "Command parsed");
        Ok(command)
    }
}

fn optional_int(params: &Value, name: &str) -> Result<Option<i64>> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| SoundError::invalid_type(name, "int")),
    }
}

fn optional_str(params: &Value, name: &str) -> Result<Option<String>> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(_) => Err(SoundError::invalid_type(name, "str")),
    }
}

/// Result of command execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CommandResult {
    Done,
    ModuleConfig(ModuleConfig),
    Volumes(Volumes),
}

/// Reply envelope sent back to the host
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandResponse {
    pub error: bool,
    pub message: String,
    pub data: Value,
}

impl CommandResponse {
    pub fn from_result<T: Serialize>(result: Result<T>) -> Self {
        match result.map(serde_json::to_value) {
            Ok(Ok(data)) => Self {
                error: false,
                message: String::new(),
                data,
            },
            Ok(Err(e)) => {
                warn!(error = %e, "Unable to serialize command result");
                Self::failure(format!("Unable to serialize command result: {}", e))
            }
            Err(e) => Self::failure(e.to_string()),
        }
    }

    fn failure(message: String) -> Self {
        Self {
            error: true,
            message,
            data: Value::Null,
        }
    }
}

/// Trait for command execution
#[async_trait::async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, command: Command) -> Result<CommandResult>;

    /// Parse and run a raw host request
    async fn handle(&self, name: &str, params: &Value) -> CommandResponse {
        let result = match Command::from_request(name, params) {
            Ok(command) => self.execute(command).await,
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            warn!(command = name, error = %e, "Command failed");
        }
        CommandResponse::from_result(result)
    }
}

#[async_trait::async_trait]
impl CommandExecutor for DriverManager {
    async fn execute(&self, command: Command) -> Result<CommandResult> {
        match command {
            Command::GetModuleConfig => Ok(CommandResult::ModuleConfig(self.get_module_config())),
            Command::SelectDevice { driver_name } => {
                self.select_device(driver_name.as_deref())?;
                Ok(CommandResult::Done)
            }
            Command::GetVolumes => Ok(CommandResult::Volumes(self.get_volumes())),
            Command::SetVolumes { playback, capture } => {
                Ok(CommandResult::Volumes(self.set_volumes(playback, capture)?))
            }
            Command::TestPlaying => {
                // fire and forget, the task logs its own outcome
                let _ = self.test_playing();
                Ok(CommandResult::Done)
            }
            Command::TestRecording => {
                self.test_recording().await?;
                Ok(CommandResult::Done)
            }
        }
    }
}
