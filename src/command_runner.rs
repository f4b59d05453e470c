use std::process::{Output, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;

/// Default timeout for a single `aws` CLI invocation. Individual SSM
/// invocations are short API round-trips; the remote command's own lifetime
/// is governed by the dispatcher's poll budget, not this value.
pub const DEFAULT_CLI_TIMEOUT: Duration = Duration::from_secs(60);

/// Run a program, capture its output, and kill it if `timeout` elapses.
///
/// `tokio::time::timeout` around `.output().await` does not kill the child
/// on all platforms when the timeout fires — the future is dropped but the
/// OS process keeps running. `tokio::select!` with an explicit
/// `child.kill()` guarantees termination.
///
/// # Errors
///
/// Returns an error if the process cannot be spawned or exceeds `timeout`.
pub async fn run_with_timeout(program: &str, args: &[&str], timeout: Duration) -> Result<Output> {
    let mut child = tokio::process::Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("failed to spawn {program}"))?;

    let mut stdout_handle = child.stdout.take();
    let mut stderr_handle = child.stderr.take();

    // Read stdout/stderr concurrently with wait() to avoid pipe deadlock:
    // a child writing more than the OS pipe buffer blocks on write, and
    // wait()-first would then never resolve.
    tokio::select! {
        result = async {
            let (status, stdout, stderr) = tokio::join!(
                child.wait(),
                async {
                    let mut buf = Vec::new();
                    if let Some(ref mut h) = stdout_handle {
                        let _ = h.read_to_end(&mut buf).await;
                    }
                    buf
                },
                async {
                    let mut buf = Vec::new();
                    if let Some(ref mut h) = stderr_handle {
                        let _ = h.read_to_end(&mut buf).await;
                    }
                    buf
                },
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

/// Run a program with inherited stdio (interactive pass-through).
///
/// No timeout — used for hand-offs like `aws ssm start-session` where the
/// user drives the process.
///
/// # Errors
///
/// Returns an error if the process cannot be spawned.
pub async fn run_interactive(program: &str, args: &[&str]) -> Result<std::process::ExitStatus> {
    let mut child = tokio::process::Command::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("failed to spawn {program}"))?;

    child
        .wait()
        .await
        .with_context(|| format!("waiting for {program}"))
}
