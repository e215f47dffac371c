//! Application services — orchestration logic behind the command handlers.

pub mod install_flow;
pub mod integrity;
pub mod keystore;
pub mod policy_apply;
pub mod release;
pub mod uninstall;
