//! Remote command dispatcher — submit once, poll to a terminal status.
//!
//! One call covers one (instance, command) pair. Concurrency across
//! instances is layered on top by [`crate::engine`]; the dispatcher itself
//! holds no state between calls.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::channel::{CommandChannel, Poll};

/// Terminal outcome of one remote command on one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CommandStatus {
    /// Remote command ran and exited zero.
    Success,
    /// Remote command ran and reported failure.
    Failed,
    /// Remote-reported timeout, or the poll budget ran out first. The two
    /// are deliberately indistinguishable to callers.
    TimedOut,
    /// Remote invocation was cancelled.
    Cancelled,
    /// Submission itself was rejected — the command never reached the
    /// instance. `CommandResult::error` carries the send error.
    FailedToSend,
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Success => "Success",
            Self::Failed => "Failed",
            Self::TimedOut => "TimedOut",
            Self::Cancelled => "Cancelled",
            Self::FailedToSend => "FailedToSend",
        };
        f.write_str(s)
    }
}

/// Outcome of one (instance, command) dispatch. Written once by the
/// dispatcher, read-only afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct CommandResult {
    /// Instance the command was dispatched to. Broadcast callers correlate
    /// by this field — result order is completion order, not input order.
    pub instance: String,
    pub status: CommandStatus,
    pub stdout: String,
    pub stderr: String,
    /// Send-time error text when `status` is `FailedToSend`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandResult {
    fn finished(instance: &str, status: CommandStatus, stdout: String, stderr: String) -> Self {
        Self { instance: instance.to_string(), status, stdout, stderr, error: None }
    }

    fn failed_to_send(instance: &str, error: &anyhow::Error) -> Self {
        Self {
            instance: instance.to_string(),
            status: CommandStatus::FailedToSend,
            stdout: String::new(),
            stderr: String::new(),
            error: Some(format!("{error:#}")),
        }
    }

    fn timed_out(instance: &str) -> Self {
        Self {
            instance: instance.to_string(),
            status: CommandStatus::TimedOut,
            stdout: String::new(),
            stderr: String::new(),
            error: None,
        }
    }
}

/// Poll budget for one dispatch, kept as named values so the wall-clock
/// relationship stays visible: total wait ≈ `max_attempts() × poll_interval`.
#[derive(Debug, Clone, Copy)]
pub struct DispatchConfig {
    /// Remote execution timeout, also the dispatcher's poll budget.
    pub timeout: Duration,
    /// Sleep before each poll.
    pub poll_interval: Duration,
    /// Extra sleep when the invocation is not yet visible (submission/status
    /// propagation race).
    pub not_ready_backoff: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            poll_interval: Duration::from_secs(2),
            not_ready_backoff: Duration::from_secs(1),
        }
    }
}

impl DispatchConfig {
    /// Number of polls before giving up: `timeout / poll_interval`, at least 1.
    #[must_use]
    pub fn max_attempts(&self) -> u64 {
        let interval = self.poll_interval.as_millis().max(1);
        u64::try_from((self.timeout.as_millis() / interval).max(1)).unwrap_or(u64::MAX)
    }
}

/// Send `command` to `instance` and poll until a terminal status or the
/// budget runs out.
///
/// State machine: submit → `FailedToSend` on rejection, otherwise poll at
/// `poll_interval` until the channel reports a terminal status. A
/// not-yet-visible invocation gets an extra backoff and is retried; any
/// other poll error is swallowed and retried. An exhausted budget yields
/// `TimedOut` with empty output.
pub async fn dispatch(
    channel: &impl CommandChannel,
    instance: &str,
    command: &str,
    cfg: &DispatchConfig,
) -> CommandResult {
    let command_id = match channel.submit(instance, command, cfg.timeout).await {
        Ok(id) => id,
        Err(e) => return CommandResult::failed_to_send(instance, &e),
    };

    for _ in 0..cfg.max_attempts() {
        tokio::time::sleep(cfg.poll_interval).await;
        match channel.poll(&command_id, instance).await {
            Ok(Poll::Finished { status, stdout, stderr }) => {
                return CommandResult::finished(instance, status, stdout, stderr);
            }
            Ok(Poll::NotYetVisible) => {
                tokio::time::sleep(cfg.not_ready_backoff).await;
            }
            // In progress, or a transient poll error — keep polling.
            Ok(Poll::InProgress) | Err(_) => {}
        }
    }
    CommandResult::timed_out(instance)
}
