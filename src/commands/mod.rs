//! Command implementations

pub mod info;
pub mod install;
pub mod keys;
pub mod policy;
pub mod uninstall;
pub mod version;
