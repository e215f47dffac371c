//! Tracing initialization.
//!
//! Diagnostics go to a rotating file under the tool's own directory so a
//! session can be reconstructed after the fact; they never mix with the
//! command output on stdout. Setting `ROLLOUT_LOG` additionally mirrors
//! them to stderr with that filter.

use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::{EnvFilter, fmt};

use crate::infra::logsink::RotatingWriter;

/// Per-file cap before rotation.
const LOG_MAX_BYTES: u64 = 2 * 1024 * 1024;
/// Rotated files kept beside the live one.
const LOG_RETAIN: usize = 3;

/// Install the global subscriber. Safe to call once per process; a missing
/// or unwritable log directory degrades to stderr-only (or no-op) rather
/// than failing the command.
pub fn init() {
    let filter = EnvFilter::try_from_env("ROLLOUT_LOG")
        .unwrap_or_else(|_| EnvFilter::new("rollout_cli=info"));

    let file_layer = crate::domain::config::rollout_dir()
        .ok()
        .and_then(|dir| {
            RotatingWriter::create(dir.join("logs").join("rollout.log"), LOG_MAX_BYTES, LOG_RETAIN)
                .ok()
        })
        .map(|writer| {
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(Mutex::new(writer))
        });

    let stderr_layer = std::env::var_os("ROLLOUT_LOG")
        .is_some()
        .then(|| fmt::layer().with_writer(std::io::stderr));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init();
}
