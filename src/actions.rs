//! Named fleet operations — thin composition over the engine and patch
//! generator. Every user-supplied operand is embedded via
//! [`shell_quote`](crate::patch::shell_quote) before it reaches a remote
//! shell.

use crate::channel::CommandChannel;
use crate::dispatch::{self, CommandResult, DispatchConfig};
use crate::engine::run_parallel;
use crate::logging::LogSink;
use crate::patch::{shell_quote, PatchSpec};

/// Depth cap for remote `find` — keeps a broad glob from walking the whole
/// filesystem.
const MAX_FIND_DEPTH: u32 = 6;

/// Broadcast `git pull` in `repo` to every instance.
pub async fn git_pull(
    channel: &impl CommandChannel,
    instances: &[String],
    repo: &str,
    cfg: &DispatchConfig,
    concurrency: usize,
    log: &LogSink,
) -> Vec<CommandResult> {
    run_parallel(channel, instances, &pull_command(repo), cfg, concurrency, log).await
}

/// Broadcast `git fetch && git checkout <branch>` in `repo` to every instance.
pub async fn git_checkout(
    channel: &impl CommandChannel,
    instances: &[String],
    repo: &str,
    branch: &str,
    cfg: &DispatchConfig,
    concurrency: usize,
    log: &LogSink,
) -> Vec<CommandResult> {
    run_parallel(channel, instances, &checkout_command(repo, branch), cfg, concurrency, log).await
}

/// Broadcast an arbitrary shell command. The command is the operator's own
/// text and is passed through verbatim.
pub async fn custom(
    channel: &impl CommandChannel,
    instances: &[String],
    command: &str,
    cfg: &DispatchConfig,
    concurrency: usize,
    log: &LogSink,
) -> Vec<CommandResult> {
    run_parallel(channel, instances, command, cfg, concurrency, log).await
}

/// Broadcast a depth-capped file search under `repo` for `glob`.
pub async fn find_files(
    channel: &impl CommandChannel,
    instances: &[String],
    repo: &str,
    glob: &str,
    cfg: &DispatchConfig,
    concurrency: usize,
    log: &LogSink,
) -> Vec<CommandResult> {
    run_parallel(channel, instances, &find_command(repo, glob), cfg, concurrency, log).await
}

/// Apply an insert-after-first-match patch on a single instance.
pub async fn patch_after_match(
    channel: &impl CommandChannel,
    instance: &str,
    spec: &PatchSpec,
    cfg: &DispatchConfig,
) -> CommandResult {
    dispatch::dispatch(channel, instance, &spec.render(), cfg).await
}

fn pull_command(repo: &str) -> String {
    format!("cd {} && git pull", shell_quote(repo))
}

fn checkout_command(repo: &str, branch: &str) -> String {
    format!(
        "cd {} && git fetch && git checkout {}",
        shell_quote(repo),
        shell_quote(branch)
    )
}

fn find_command(repo: &str, glob: &str) -> String {
    format!(
        "find {} -maxdepth {MAX_FIND_DEPTH} -type f -name {} -print",
        shell_quote(repo),
        shell_quote(glob)
    )
}
