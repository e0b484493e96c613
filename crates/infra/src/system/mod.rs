//! Host system collaborators: board probe and config file editors

pub mod asound_conf;
pub mod board;
pub mod boot_config;

pub use asound_conf::EtcAsoundConf;
pub use board::RaspberryPiBoard;
pub use boot_config::ConfigTxt;
