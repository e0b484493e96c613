//! Sound driver implementations for Linux boards
//!
//! - `alsa`: the ALSA command-line backend (amixer, alsactl, aplay, arecord)
//! - `onboard`: the driver for the board's built-in bcm2835 chip

pub mod alsa;
pub mod onboard;

pub use alsa::*;
pub use onboard::*;
