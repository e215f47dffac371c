//! Streaming installer download implementing the `ArtifactFetcher` port.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::application::ports::ArtifactFetcher;
use crate::domain::config::ProvisionConfig;
use crate::domain::error::ProvisionError;
use crate::domain::release::ReleaseArtifact;

/// Largest installer this tool will download. Anything bigger is a broken
/// release descriptor or a tampered index.
const MAX_DOWNLOAD_BYTES: u64 = 512 * 1024 * 1024;

/// Downloads over HTTPS, staging through a `.part` file so the destination
/// path never holds a partial installer.
pub struct UreqFetcher {
    agent: ureq::Agent,
    show_progress: bool,
    timeout_secs: u64,
}

impl UreqFetcher {
    #[must_use]
    pub fn new(cfg: &ProvisionConfig, show_progress: bool) -> Self {
        let timeout = cfg.download_timeout();
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            show_progress,
            timeout_secs: timeout.as_secs(),
        }
    }
}

/// Distinguish a transport timeout from other network failures so the two
/// get their own taxonomy codes.
pub(crate) fn classify_transport_error(err: &ureq::Error, url: &str, seconds: u64) -> ProvisionError {
    let timed_out = std::error::Error::source(err)
        .and_then(|s| s.downcast_ref::<std::io::Error>())
        .is_some_and(|io| {
            matches!(
                io.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            )
        });
    if timed_out {
        ProvisionError::NetworkTimeout {
            action: format!("fetching {url}"),
            seconds,
        }
    } else {
        ProvisionError::NetworkFailure(format!("GET {url}: {err}"))
    }
}

impl ArtifactFetcher for UreqFetcher {
    fn fetch(&self, artifact: &ReleaseArtifact, dest: &Path) -> Result<u64> {
        let response = self
            .agent
            .get(&artifact.download_url)
            .set("User-Agent", concat!("rollout-cli/", env!("CARGO_PKG_VERSION")))
            .call()
            .map_err(|e| {
                classify_transport_error(&e, &artifact.download_url, self.timeout_secs)
            })?;

        let bar = if self.show_progress {
            Some(download_bar(artifact.size, &format!("warden {}", artifact.version)))
        } else {
            None
        };

        let mut reader = response.into_reader().take(MAX_DOWNLOAD_BYTES);
        let counted = {
            let bar = bar.clone();
            move |written: u64| {
                if let Some(bar) = &bar {
                    bar.set_position(written);
                }
            }
        };
        let result = stage_to(dest, &mut reader, counted);

        match (&result, bar) {
            (Ok(bytes), Some(bar)) => bar.finish_with_message(format!("✓ {bytes} bytes downloaded")),
            (Err(_), Some(bar)) => bar.finish_with_message("✗ download failed".to_string()),
            _ => {}
        }

        let bytes = result?;
        info!(url = %artifact.download_url, bytes, "artifact downloaded");
        Ok(bytes)
    }
}

/// Stream `reader` to `dest` through a sibling `.part` file, renaming into
/// place only after the stream ends cleanly. On any error the partial file
/// is removed and `dest` is left untouched.
pub(crate) fn stage_to(
    dest: &Path,
    reader: &mut impl Read,
    mut on_progress: impl FnMut(u64),
) -> Result<u64> {
    let part = part_path(dest);
    let result = copy_to_part(&part, reader, &mut on_progress);
    match result {
        Ok(bytes) => {
            std::fs::rename(&part, dest)
                .with_context(|| format!("moving {} into place", part.display()))?;
            Ok(bytes)
        }
        Err(err) => {
            let _ = std::fs::remove_file(&part);
            Err(err)
        }
    }
}

fn copy_to_part(
    part: &Path,
    reader: &mut impl Read,
    on_progress: &mut impl FnMut(u64),
) -> Result<u64> {
    let mut file = std::fs::File::create(part)
        .with_context(|| format!("creating {}", part.display()))?;
    let mut buf = [0u8; 64 * 1024];
    let mut written: u64 = 0;
    loop {
        let n = reader
            .read(&mut buf)
            .map_err(|e| ProvisionError::NetworkFailure(format!("reading download stream: {e}")))?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])
            .with_context(|| format!("writing {}", part.display()))?;
        written += n as u64;
        on_progress(written);
    }
    file.flush().with_context(|| format!("flushing {}", part.display()))?;
    Ok(written)
}

#[allow(clippy::expect_used)] // template is a compile-time constant
fn download_bar(len: u64, msg: &str) -> indicatif::ProgressBar {
    let pb = indicatif::ProgressBar::new(len);
    pb.set_style(
        indicatif::ProgressStyle::default_bar()
            .template("  {msg}\n    {bar:40.cyan/dim} {percent}%  {bytes}/{total_bytes}")
            .expect("valid template")
            .progress_chars("━━─"),
    );
    pb.set_message(msg.to_string());
    pb
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map_or_else(
        || std::ffi::OsString::from("download"),
        std::ffi::OsStr::to_os_string,
    );
    name.push(".part");
    dest.with_file_name(name)
}
