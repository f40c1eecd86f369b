//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, filesystem
//! access, prompts, git, apt, the Python venv and systemd.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod askpass;
pub mod command_runner;
pub mod config;
pub mod fs;
pub mod git;
pub mod host;
pub mod packages;
pub mod prompt;
pub mod python;
pub mod signal;
pub mod systemd;
