//! Infrastructure layer — concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, release
//! index queries, installer downloads, registry writes, and log rotation.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod command_runner;
pub mod download;
pub mod logsink;
pub mod prompt;
pub mod release_index;
pub mod settings;
