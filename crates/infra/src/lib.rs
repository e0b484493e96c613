//! soundctl infrastructure: Linux implementations of the sound drivers and
//! system collaborators

pub mod audio;
pub mod system;
