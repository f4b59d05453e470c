//! Parallel execution engine — broadcast one command to many instances.

use futures_util::stream::{self, StreamExt as _};

use crate::channel::CommandChannel;
use crate::dispatch::{self, CommandResult, CommandStatus, DispatchConfig};
use crate::logging::LogSink;

/// Default number of dispatches in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Dispatch `command` to every instance with at most `concurrency` in flight.
///
/// Exactly one [`CommandResult`] comes back per input instance — send
/// failures and timeouts included — in completion order, not input order.
/// Each result is logged the moment it arrives, so a long broadcast shows
/// partial progress. One instance failing never aborts or delays a sibling
/// beyond slot contention; the engine always waits for all of them.
///
/// `concurrency` of 1 is strict sequential dispatch; 0 is clamped to 1.
pub async fn run_parallel(
    channel: &impl CommandChannel,
    instances: &[String],
    command: &str,
    cfg: &DispatchConfig,
    concurrency: usize,
    log: &LogSink,
) -> Vec<CommandResult> {
    let mut pending = stream::iter(
        instances
            .iter()
            .map(|instance| dispatch::dispatch(channel, instance, command, cfg)),
    )
    .buffer_unordered(concurrency.max(1));

    let mut results = Vec::with_capacity(instances.len());
    while let Some(res) = pending.next().await {
        log_result(log, &res);
        results.push(res);
    }
    log.line(&format!(
        "Broadcast complete: {} result(s) for {} instance(s)",
        results.len(),
        instances.len()
    ));
    results
}

fn log_result(log: &LogSink, res: &CommandResult) {
    match res.status {
        CommandStatus::Success => {
            log.line(&format!("[{}] SUCCESS", res.instance));
            if !res.stdout.is_empty() {
                log.line(&format!("[{}] STDOUT:\n{}", res.instance, res.stdout));
            }
        }
        CommandStatus::FailedToSend => {
            log.line(&format!(
                "[{}] STATUS=FailedToSend; ERROR: {}",
                res.instance,
                res.error.as_deref().unwrap_or("unknown send error")
            ));
        }
        _ => {
            log.line(&format!(
                "[{}] STATUS={}; STDERR:\n{}",
                res.instance, res.status, res.stderr
            ));
        }
    }
}
