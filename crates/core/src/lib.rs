//! soundctl core: sound driver abstraction and driver manager

pub mod domain;
