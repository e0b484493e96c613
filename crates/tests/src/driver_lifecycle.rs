//! End-to-end driver lifecycle tests
//!
//! These tests exercise the startup sequence, device switching with rollback
//! and volume forwarding through the onboard driver, checking the files it
//! leaves behind.

use soundctl_core::domain::audio::{
    AlsaDevice, DeviceDescriptor, Direction, MixerControl, Result, SoundError, Volumes,
};
use soundctl_core::domain::system::{AlsaCommands, BoardInfo, BoardProbe};
use soundctl_core::domain::{
    CommandExecutor, ConfigManager, DriverManager, DriverRegistry, InMemoryRegistry,
    SelectionStore, SoundDriver,
};
use soundctl_infra::audio::{OnboardDriver, DRIVER_NAME};
use soundctl_infra::system::{ConfigTxt, EtcAsoundConf};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

const ROUTE_NUMID: u32 = 3;

struct Board {
    audio: bool,
    present: bool,
}

impl BoardProbe for Board {
    fn board_info(&self) -> BoardInfo {
        BoardInfo {
            model: "Raspberry Pi 3 Model B Rev 1.2".to_string(),
            audio: self.audio,
        }
    }

    fn audio_hardware_present(&self) -> bool {
        self.present
    }
}

/// ALSA stand-in keeping the route control and volume in memory
struct ScriptedAlsa {
    route: Mutex<Option<i64>>,
    volume: Mutex<u8>,
    played: AtomicBool,
}

impl ScriptedAlsa {
    fn new() -> Self {
        Self {
            route: Mutex::new(None),
            volume: Mutex::new(80),
            played: AtomicBool::new(false),
        }
    }

    fn route(&self) -> Option<i64> {
        *self.route.lock().unwrap()
    }
}

impl AlsaCommands for ScriptedAlsa {
    fn amixer_control(&self, card_id: Option<u32>, numid: u32, value: i64) -> bool {
        assert_eq!(card_id, Some(0));
        assert_eq!(numid, ROUTE_NUMID);
        *self.route.lock().unwrap() = Some(value);
        true
    }

    fn control_value(&self, _card_id: Option<u32>, _numid: u32) -> Option<i64> {
        self.route()
    }

    fn save(&self) -> bool {
        true
    }

    fn get_volume(&self, direction: Direction) -> Option<u8> {
        assert_eq!(direction, Direction::Playback);
        Some(*self.volume.lock().unwrap())
    }

    fn set_volume(&self, _direction: Direction, value: u8) -> Option<u8> {
        *self.volume.lock().unwrap() = value;
        Some(value)
    }

    fn playback_devices(&self) -> Vec<AlsaDevice> {
        vec![AlsaDevice {
            card_id: 0,
            card_name: "bcm2835 Headphones".to_string(),
            device_id: 0,
            device_name: "bcm2835 Headphones".to_string(),
        }]
    }

    fn controls(&self, _card_id: u32) -> Vec<MixerControl> {
        vec![MixerControl {
            numid: ROUTE_NUMID,
            name: "PCM Playback Route".to_string(),
        }]
    }

    fn play_sound(&self) -> bool {
        self.played.store(true, Ordering::SeqCst);
        true
    }

    fn record_sound(&self, _duration: Duration) -> bool {
        true
    }
}

/// A second backend, e.g. a USB dongle
struct UsbDriver {
    enable_ok: bool,
    enabled: AtomicBool,
}

impl UsbDriver {
    fn new(enable_ok: bool) -> Self {
        Self {
            enable_ok,
            enabled: AtomicBool::new(false),
        }
    }
}

impl SoundDriver for UsbDriver {
    fn name(&self) -> &str {
        "usb"
    }
    fn label(&self) -> &str {
        "USB soundcard"
    }
    fn is_installed(&self) -> bool {
        true
    }
    fn install(&self) -> Result<()> {
        Ok(())
    }
    fn uninstall(&self) -> Result<()> {
        Ok(())
    }
    fn enable(&self) -> bool {
        self.enabled.store(self.enable_ok, Ordering::SeqCst);
        self.enable_ok
    }
    fn disable(&self) -> bool {
        self.enabled.store(false, Ordering::SeqCst);
        true
    }
    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
    fn is_card_enabled(&self) -> bool {
        self.is_enabled()
    }
    fn device_info(&self) -> DeviceDescriptor {
        DeviceDescriptor {
            deviceid: Some(0),
            cardid: Some(1),
            cardname: Some("USB Audio Device".to_string()),
            playback: true,
            capture: true,
        }
    }
    fn get_volumes(&self) -> Volumes {
        Volumes::new(Some(10), Some(20))
    }
    fn set_volumes(&self, playback: Option<u8>, capture: Option<u8>) -> Volumes {
        Volumes::new(playback, capture)
    }
}

struct System {
    _temp_dir: TempDir,
    boot_config_path: PathBuf,
    asound_path: PathBuf,
    config: Arc<ConfigManager>,
    registry: Arc<InMemoryRegistry>,
    alsa: Arc<ScriptedAlsa>,
    manager: DriverManager,
}

impl System {
    fn new(board: Board) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let boot_config_path = temp_dir.path().join("config.txt");
        let asound_path = temp_dir.path().join("asound.conf");
        fs::write(&boot_config_path, "gpu_mem=64\n#dtparam=audio=on\n").unwrap();

        let config = Arc::new(ConfigManager::new(temp_dir.path().join("soundctl")));
        config.load();

        let board = Arc::new(board);
        let registry = Arc::new(InMemoryRegistry::new());
        let alsa = Arc::new(ScriptedAlsa::new());
        let manager = DriverManager::new(registry.clone(), board, alsa.clone(), config.clone());

        Self {
            _temp_dir: temp_dir,
            boot_config_path,
            asound_path,
            config,
            registry,
            alsa,
            manager,
        }
    }

    fn onboard(&self, present: bool) -> Arc<dyn SoundDriver> {
        Arc::new(OnboardDriver::new(
            Arc::new(Board {
                audio: true,
                present,
            }),
            Arc::new(ConfigTxt::new(&self.boot_config_path)),
            Arc::new(EtcAsoundConf::new(&self.asound_path)),
            self.alsa.clone(),
        ))
    }

    fn start(&self) {
        let onboard = self.onboard(true);
        self.manager.start(move || onboard).unwrap();
    }

    fn persisted_driver(&self) -> Option<String> {
        let reloaded = ConfigManager::new(self.config.config_path().parent().unwrap().to_path_buf());
        reloaded.load().audio.driver
    }
}

fn board() -> Board {
    Board {
        audio: true,
        present: true,
    }
}

// ============================================================================
// STARTUP
// ============================================================================

#[test]
fn test_first_boot_installs_and_enables_onboard_audio() {
    let system = System::new(board());

    system.start();

    let boot_config = fs::read_to_string(&system.boot_config_path).unwrap();
    assert_eq!(boot_config, "gpu_mem=64\ndtparam=audio=on\n");
    assert!(system.asound_path.exists());
    assert_eq!(system.alsa.route(), Some(1));
    assert_eq!(system.persisted_driver().as_deref(), Some(DRIVER_NAME));

    let conf = system.manager.get_module_config();
    assert_eq!(conf.devices.playback.len(), 1);
    assert!(conf.devices.capture.is_empty());
    let onboard = &conf.devices.playback[0];
    assert_eq!(onboard.label, "Raspberry pi soundcard");
    assert!(onboard.installed);
    assert!(onboard.enabled);
    assert_eq!(onboard.device.cardname.as_deref(), Some("bcm2835 Headphones"));
    assert_eq!(conf.volumes, Volumes::new(Some(80), None));
}

#[test]
fn test_startup_without_onboard_audio_does_nothing() {
    let system = System::new(Board {
        audio: false,
        present: false,
    });

    system.start();

    assert!(system.registry.drivers().is_empty());
    assert_eq!(system.config.selected_driver(), None);
    assert!(!system.asound_path.exists());
    assert_eq!(system.manager.set_volumes(Some(12), Some(34)).unwrap(), Volumes::unavailable());
}

#[test]
fn test_startup_with_audio_disabled_upstream_selects_without_enabling() {
    let system = System::new(Board {
        audio: true,
        present: false,
    });

    let onboard = system.onboard(false);
    system.manager.start(move || onboard).unwrap();

    assert_eq!(system.config.selected_driver().as_deref(), Some(DRIVER_NAME));
    assert!(!system.asound_path.exists());
    assert_eq!(system.alsa.route(), None);
}

// ============================================================================
// SWITCHING
// ============================================================================

#[test]
fn test_switch_to_other_driver_and_back() {
    let system = System::new(board());
    let usb = Arc::new(UsbDriver::new(true));
    system.registry.register(usb.clone());
    system.start();

    system.manager.select_device(Some("usb")).unwrap();

    assert!(usb.is_enabled());
    assert_eq!(system.alsa.route(), Some(0));
    assert!(!system.asound_path.exists());
    assert_eq!(system.persisted_driver().as_deref(), Some("usb"));

    let conf = system.manager.get_module_config();
    let enabled: Vec<_> = conf
        .devices
        .playback
        .iter()
        .filter(|d| d.enabled)
        .map(|d| d.name.as_str())
        .collect();
    assert_eq!(enabled, vec!["usb"]);
    assert_eq!(conf.devices.capture.len(), 1);

    system.manager.select_device(Some(DRIVER_NAME)).unwrap();

    assert!(!usb.is_enabled());
    assert!(system.asound_path.exists());
    assert_eq!(system.persisted_driver().as_deref(), Some(DRIVER_NAME));
}

#[test]
fn test_failed_switch_restores_onboard_audio() {
    let system = System::new(board());
    system.registry.register(Arc::new(UsbDriver::new(false)));
    system.start();

    let err = system.manager.select_device(Some("usb")).unwrap_err();

    assert!(matches!(err, SoundError::CommandFailed(_)));
    assert!(system.asound_path.exists());
    assert_eq!(system.alsa.route(), Some(1));
    assert_eq!(system.persisted_driver().as_deref(), Some(DRIVER_NAME));
}

// ============================================================================
// VOLUMES AND HOST COMMANDS
// ============================================================================

#[test]
fn test_onboard_volumes_have_no_capture() {
    let system = System::new(board());
    system.start();

    let volumes = system.manager.set_volumes(Some(12), Some(34)).unwrap();

    assert_eq!(volumes, Volumes::new(Some(12), None));
    assert_eq!(system.manager.get_volumes(), Volumes::new(Some(12), None));
}

#[tokio::test]
async fn test_host_commands() {
    let system = System::new(board());
    system.start();

    let response = system
        .manager
        .handle("set_volumes", &serde_json::json!({ "playback": 55, "capture": null }))
        .await;
    assert!(!response.error);
    assert_eq!(response.data, serde_json::json!({ "playback": 55, "capture": null }));

    let response = system
        .manager
        .handle("set_volumes", &serde_json::json!({ "playback": 12, "capture": "12" }))
        .await;
    assert!(response.error);
    assert_eq!(response.message, "Parameter \"capture\" must be of type \"int\"");

    let response = system
        .manager
        .handle("select_device", &serde_json::json!({ "driver_name": "" }))
        .await;
    assert!(response.error);

    assert!(system.manager.test_playing().await.unwrap());
    assert!(system.alsa.played.load(Ordering::SeqCst));
}
