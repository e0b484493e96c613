//! Domain entities and business rules

pub mod audio;
pub mod command;
pub mod config;
pub mod driver;
pub mod manager;
pub mod registry;
pub mod system;


pub use audio::{
    AlsaDevice, DeviceDescriptor, Direction, MixerControl, Result, SoundError, Volumes,
};
pub use command::{Command, CommandExecutor, CommandResponse, CommandResult};
pub use config::{ConfigManager, MemorySelectionStore, SelectionStore, SoundctlConfig};
pub use driver::SoundDriver;
pub use manager::{DeviceEntry, DeviceLists, DriverManager, ModuleConfig};
pub use registry::{DriverRegistry, InMemoryRegistry};
pub use system::{AlsaCommands, AsoundConfig, BoardInfo, BoardProbe, BootConfig};
