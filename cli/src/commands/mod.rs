//! Command implementations

pub mod autostart;
pub mod install;
