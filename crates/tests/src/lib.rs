//! Integration tests for soundctl
//!
//! The driver manager is wired with the real onboard driver and file editors
//! over a temporary directory; only ALSA and the board probe are scripted.

#[cfg(test)]
mod driver_lifecycle;
