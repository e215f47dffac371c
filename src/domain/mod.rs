//! Domain layer — pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::process`, or `std::net`. The few
//! filesystem touches (settings-file load/save, config load) are plain
//! read/write of documents the domain owns.

pub mod config;
pub mod error;
pub mod keys;
pub mod policy;
pub mod release;
pub mod session;

#[allow(unused_imports)]
pub use config::ProvisionConfig;
#[allow(unused_imports)]
pub use error::{PolicyError, ProvisionError, exit_code_for};
#[allow(unused_imports)]
pub use keys::{KeyHalf, SUPERVISOR_KEY_NAME};
#[allow(unused_imports)]
pub use policy::{PolicyEntry, PolicyScope, SettingValue, SettingWrite, validate_catalog};
#[allow(unused_imports)]
pub use release::ReleaseArtifact;
#[allow(unused_imports)]
pub use session::{Decision, Gate, InstallStage, Role, SessionSummary};
