//! Infrastructure implementation of the `CommandRunner` port.

use std::process::{Output, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};

use crate::application::ports::CommandRunner;

/// Default timeout for product CLI invocations (key generation, version).
pub const DEFAULT_CMD_TIMEOUT: Duration = Duration::from_secs(30);

/// Production `CommandRunner` backed by tokio child processes.
///
/// Dropping the `.output().await` future on a timeout leaves the OS process
/// running on Windows, so every run races `child.wait()` against a sleep in
/// `tokio::select!` and kills the child explicitly when the sleep wins.
pub struct TokioCommandRunner {
    timeout: Duration,
}

impl Default for TokioCommandRunner {
    fn default() -> Self {
        Self::new(DEFAULT_CMD_TIMEOUT)
    }
}

impl TokioCommandRunner {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn spawn_piped(program: &str, args: &[&str]) -> Result<Child> {
        Command::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))
    }
}

async fn drain_stdout(pipe: Option<ChildStdout>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf).await;
    }
    buf
}

async fn drain_stderr(pipe: Option<ChildStderr>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf).await;
    }
    buf
}

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.run_with_timeout(program, args, self.timeout).await
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output> {
        let mut child = Self::spawn_piped(program, args)?;
        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();

        tokio::select! {
            result = async {
                let (status, stdout, stderr) = tokio::join!(
                    child.wait(),
                    drain_stdout(stdout_pipe),
                    drain_stderr(stderr_pipe),
                );
                Ok(Output {
                    status: status.with_context(|| format!("waiting for {program}"))?,
                    stdout,
                    stderr,
                })
            } => result,
            () = tokio::time::sleep(timeout) => {
                let _ = child.kill().await;
                anyhow::bail!("{program} timed out after {}s", timeout.as_secs())
            }
        }
    }

    async fn run_status(&self, program: &str, args: &[&str]) -> Result<std::process::ExitStatus> {
        let mut child = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;

        child
            .wait()
            .await
            .with_context(|| format!("waiting for {program}"))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_captures_stdout() {
        let runner = TokioCommandRunner::default();
        #[cfg(unix)]
        let output = runner.run("echo", &["hello"]).await.expect("echo runs");
        #[cfg(windows)]
        let output = runner
            .run("cmd", &["/C", "echo hello"])
            .await
            .expect("echo runs");
        assert!(output.status.success());
        assert!(String::from_utf8_lossy(&output.stdout).contains("hello"));
    }

    #[tokio::test]
    async fn test_missing_program_is_an_error() {
        let runner = TokioCommandRunner::default();
        let err = runner
            .run("definitely-not-a-real-binary-xyz", &[])
            .await
            .expect_err("spawn fails");
        assert!(err.to_string().contains("failed to spawn"), "got: {err}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_the_child() {
        let runner = TokioCommandRunner::default();
        let err = runner
            .run_with_timeout("sleep", &["30"], Duration::from_millis(100))
            .await
            .expect_err("times out");
        assert!(err.to_string().contains("timed out"), "got: {err}");
    }
}
