//! Shared test helpers: scripted command-channel double and log sinks.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;

use machina_cli::channel::{CommandChannel, Poll};
use machina_cli::dispatch::CommandStatus;
use machina_cli::logging::LogSink;

/// Per-instance behavior of the scripted channel.
#[derive(Clone)]
pub enum Behavior {
    /// Report `InProgress` for `after_polls` polls, then finish.
    Finish {
        status: CommandStatus,
        stdout: &'static str,
        stderr: &'static str,
        after_polls: u32,
    },
    /// Reject the submission outright.
    RejectSend { error: &'static str },
    /// Never reach a terminal status.
    NeverTerminal,
    /// Report `NotYetVisible` for `times` polls, then succeed.
    NotYetVisible { times: u32 },
    /// Error out of the first `errors` polls, then succeed.
    PollErrors { errors: u32 },
}

/// Channel double driven by a per-instance behavior table, with in-flight
/// accounting so tests can assert the concurrency bound.
pub struct ScriptedChannel {
    behaviors: HashMap<String, Behavior>,
    polls: Mutex<HashMap<String, u32>>,
    submits: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedChannel {
    pub fn new(table: &[(&str, Behavior)]) -> Self {
        Self {
            behaviors: table
                .iter()
                .map(|(id, b)| ((*id).to_string(), b.clone()))
                .collect(),
            polls: Mutex::new(HashMap::new()),
            submits: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Every listed instance succeeds instantly with the given stdout.
    pub fn all_succeed(instances: &[&str], stdout: &'static str) -> Self {
        let table: Vec<(&str, Behavior)> = instances
            .iter()
            .map(|id| {
                (*id, Behavior::Finish {
                    status: CommandStatus::Success,
                    stdout,
                    stderr: "",
                    after_polls: 0,
                })
            })
            .collect();
        Self::new(&table)
    }

    pub fn submit_count(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn poll_count(&self, instance: &str) -> u32 {
        *self
            .polls
            .lock()
            .expect("polls lock")
            .get(instance)
            .unwrap_or(&0)
    }

    /// Highest number of submitted-but-unfinished dispatches observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn behavior(&self, instance: &str) -> Behavior {
        self.behaviors
            .get(instance)
            .cloned()
            .unwrap_or(Behavior::NeverTerminal)
    }

    fn note_done(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl CommandChannel for ScriptedChannel {
    async fn submit(&self, instance: &str, _command: &str, _timeout: Duration) -> Result<String> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        if let Behavior::RejectSend { error } = self.behavior(instance) {
            anyhow::bail!("{error}");
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Ok(format!("cmd-{instance}"))
    }

    async fn poll(&self, command_id: &str, instance: &str) -> Result<Poll> {
        assert_eq!(command_id, &format!("cmd-{instance}"), "command id mixup");
        let count = {
            let mut polls = self.polls.lock().expect("polls lock");
            let entry = polls.entry(instance.to_string()).or_insert(0);
            *entry += 1;
            *entry
        };
        match self.behavior(instance) {
            Behavior::Finish { status, stdout, stderr, after_polls } => {
                if count > after_polls {
                    self.note_done();
                    Ok(Poll::Finished {
                        status,
                        stdout: stdout.to_string(),
                        stderr: stderr.to_string(),
                    })
                } else {
                    Ok(Poll::InProgress)
                }
            }
            Behavior::RejectSend { .. } => unreachable!("rejected sends are never polled"),
            Behavior::NeverTerminal => Ok(Poll::InProgress),
            Behavior::NotYetVisible { times } => {
                if count > times {
                    self.note_done();
                    Ok(Poll::Finished {
                        status: CommandStatus::Success,
                        stdout: String::new(),
                        stderr: String::new(),
                    })
                } else {
                    Ok(Poll::NotYetVisible)
                }
            }
            Behavior::PollErrors { errors } => {
                if count > errors {
                    self.note_done();
                    Ok(Poll::Finished {
                        status: CommandStatus::Success,
                        stdout: String::new(),
                        stderr: String::new(),
                    })
                } else {
                    anyhow::bail!("transient poll error")
                }
            }
        }
    }
}

/// Log sink writing into a temp dir, console echo off.
pub fn quiet_log(dir: &tempfile::TempDir) -> LogSink {
    LogSink::with_path(dir.path().join("session.log"), true)
}

/// Fast poll budget for tests: ~`attempts` polls at 10 ms apiece.
pub fn fast_config(attempts: u64) -> machina_cli::dispatch::DispatchConfig {
    machina_cli::dispatch::DispatchConfig {
        timeout: Duration::from_millis(10 * attempts),
        poll_interval: Duration::from_millis(10),
        not_ready_backoff: Duration::from_millis(5),
    }
}
