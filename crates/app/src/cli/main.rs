//! soundctl CLI Application

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use soundctl_core::domain::{
    CommandExecutor, ConfigManager, DriverManager, InMemoryRegistry, SoundDriver,
};
use soundctl_infra::audio::{Alsa, OnboardDriver};
use soundctl_infra::system::{ConfigTxt, EtcAsoundConf, RaspberryPiBoard};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "soundctl")]
#[command(about = "Onboard audio device selection and volume control", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration directory (default: ~/.config/soundctl)
    #[arg(long)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show registered devices and current volumes
    Status,

    /// Make a driver the active audio device
    Select {
        /// Driver name (e.g. bcm2835)
        driver: String,
    },

    /// Show volumes, or set them when a level is given
    Volumes {
        #[arg(long)]
        playback: Option<i64>,

        #[arg(long)]
        capture: Option<i64>,
    },

    /// Play a test tone on the default device
    TestPlaying,

    /// Record a few seconds and play them back
    TestRecording,

    /// Run a raw module command with JSON parameters
    Call {
        command: String,

        /// JSON object, e.g. '{"driver_name": "bcm2835"}'
        params: Option<String>,
    },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => ConfigManager::default_config_dir()?,
    };
    let config_manager = Arc::new(ConfigManager::new(config_dir));
    let config = config_manager.load();
    tracing::debug!(path = %config_manager.config_path().display(), "Configuration ready");

    let board = Arc::new(RaspberryPiBoard::new(
        &config.system.device_model_path,
        &config.system.asound_cards_path,
    ));
    let alsa = Arc::new(Alsa::default());
    let boot_config = Arc::new(ConfigTxt::new(&config.system.boot_config_path));
    let asound = Arc::new(EtcAsoundConf::new(&config.system.asound_conf_path));

    let manager = DriverManager::new(
        Arc::new(InMemoryRegistry::new()),
        board.clone(),
        alsa.clone(),
        config_manager.clone(),
    )
    .with_record_duration(Duration::from_secs(config.system.record_duration_secs));

    manager
        .start(move || -> Arc<dyn SoundDriver> {
            Arc::new(OnboardDriver::new(board, boot_config, asound, alsa))
        })
        .context("Audio startup failed")?;

    match cli.command {
        Commands::Status => print_json(&manager.get_module_config())?,
        Commands::Select { driver } => {
            manager.select_device(Some(&driver))?;
            tracing::info!(%driver, "Device selected");
        }
        Commands::Volumes { playback, capture } => {
            let volumes = if playback.is_none() && capture.is_none() {
                manager.get_volumes()
            } else {
                manager.set_volumes(playback, capture)?
            };
            print_json(&volumes)?;
        }
        Commands::TestPlaying => {
            if !manager.test_playing().await? {
                anyhow::bail!("Unable to play test sound");
            }
        }
        Commands::TestRecording => manager.test_recording().await?,
        Commands::Call { command, params } => {
            let params: serde_json::Value = match params {
                Some(raw) => serde_json::from_str(&raw).context("Invalid JSON parameters")?,
                None => serde_json::Value::Null,
            };
            let response = manager.handle(&command, &params).await;
            print_json(&response)?;
            if response.error {
                anyhow::bail!(response.message);
            }
        }
    }

    Ok(())
}
