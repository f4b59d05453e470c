//! Dispatcher state machine: submit, poll, classify, time out.

use std::time::{Duration, Instant};

use machina_cli::dispatch::{dispatch, CommandStatus};

use crate::helpers::{fast_config, Behavior, ScriptedChannel};

#[tokio::test]
async fn test_send_failure_short_circuits_without_polling() {
    let channel = ScriptedChannel::new(&[(
        "i-1",
        Behavior::RejectSend { error: "AccessDeniedException" },
    )]);
    let res = dispatch(&channel, "i-1", "uptime", &fast_config(5)).await;
    assert_eq!(res.status, CommandStatus::FailedToSend);
    assert!(res.error.as_deref().unwrap_or("").contains("AccessDeniedException"));
    assert_eq!(channel.poll_count("i-1"), 0, "no polls after a rejected send");
}

#[tokio::test]
async fn test_success_returns_captured_output() {
    let channel = ScriptedChannel::new(&[(
        "i-1",
        Behavior::Finish {
            status: CommandStatus::Success,
            stdout: "Already up to date.\n",
            stderr: "",
            after_polls: 1,
        },
    )]);
    let res = dispatch(&channel, "i-1", "git pull", &fast_config(10)).await;
    assert_eq!(res.status, CommandStatus::Success);
    assert_eq!(res.stdout, "Already up to date.\n");
    assert!(res.error.is_none());
}

#[tokio::test]
async fn test_remote_failure_carries_stderr() {
    let channel = ScriptedChannel::new(&[(
        "i-1",
        Behavior::Finish {
            status: CommandStatus::Failed,
            stdout: "",
            stderr: "fatal: not a git repository",
            after_polls: 0,
        },
    )]);
    let res = dispatch(&channel, "i-1", "git pull", &fast_config(10)).await;
    assert_eq!(res.status, CommandStatus::Failed);
    assert!(res.stderr.contains("not a git repository"));
}

#[tokio::test]
async fn test_remote_cancelled_passes_through() {
    let channel = ScriptedChannel::new(&[(
        "i-1",
        Behavior::Finish {
            status: CommandStatus::Cancelled,
            stdout: "",
            stderr: "",
            after_polls: 0,
        },
    )]);
    let res = dispatch(&channel, "i-1", "sleep 99", &fast_config(10)).await;
    assert_eq!(res.status, CommandStatus::Cancelled);
}

#[tokio::test]
async fn test_exhausted_budget_times_out_with_empty_output() {
    let channel = ScriptedChannel::new(&[("i-1", Behavior::NeverTerminal)]);
    let res = dispatch(&channel, "i-1", "sleep 99", &fast_config(3)).await;
    assert_eq!(res.status, CommandStatus::TimedOut);
    assert!(res.stdout.is_empty());
    assert!(res.stderr.is_empty());
    assert_eq!(channel.poll_count("i-1"), 3, "one poll per configured attempt");
}

#[tokio::test]
async fn test_timeout_bound_is_respected_within_slack() {
    let channel = ScriptedChannel::new(&[("i-1", Behavior::NeverTerminal)]);
    let cfg = fast_config(5); // ≈ 50 ms budget
    let start = Instant::now();
    let res = dispatch(&channel, "i-1", "sleep 99", &cfg).await;
    assert_eq!(res.status, CommandStatus::TimedOut);
    // Generous upper bound: budget plus scheduling slack, not minutes.
    assert!(
        start.elapsed() < Duration::from_millis(500),
        "dispatch blocked past its budget: {:?}",
        start.elapsed()
    );
}

#[tokio::test]
async fn test_not_yet_visible_is_retried_not_failed() {
    let channel = ScriptedChannel::new(&[("i-1", Behavior::NotYetVisible { times: 2 })]);
    let res = dispatch(&channel, "i-1", "uptime", &fast_config(10)).await;
    assert_eq!(res.status, CommandStatus::Success);
    assert!(channel.poll_count("i-1") >= 3);
}

#[tokio::test]
async fn test_transient_poll_errors_are_swallowed() {
    let channel = ScriptedChannel::new(&[("i-1", Behavior::PollErrors { errors: 2 })]);
    let res = dispatch(&channel, "i-1", "uptime", &fast_config(10)).await;
    assert_eq!(res.status, CommandStatus::Success);
}

#[tokio::test]
async fn test_only_transient_errors_for_whole_budget_times_out() {
    let channel = ScriptedChannel::new(&[("i-1", Behavior::PollErrors { errors: 1000 })]);
    let res = dispatch(&channel, "i-1", "uptime", &fast_config(3)).await;
    assert_eq!(res.status, CommandStatus::TimedOut);
}
