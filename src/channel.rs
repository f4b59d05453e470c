//! Command-channel and inventory ports, plus the production SSM-backed
//! implementation — enables test doubles for everything that talks to AWS.
//!
//! The core never opens a direct network connection to an instance. All
//! remote execution flows through [`CommandChannel`]; all instance discovery
//! flows through [`InventoryLookup`]. The production implementations shell
//! out to the `aws` CLI and parse its `--output json` responses.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::command_runner::{run_with_timeout, DEFAULT_CLI_TIMEOUT};
use crate::dispatch::CommandStatus;
use crate::session::Session;

/// SSM document that runs a shell script on the target instance.
const RUN_SHELL_SCRIPT: &str = "AWS-RunShellScript";

/// One observation of a remote invocation's state.
#[derive(Debug, Clone)]
pub enum Poll {
    /// The invocation reached a terminal status.
    Finished {
        status: CommandStatus,
        stdout: String,
        stderr: String,
    },
    /// The invocation has not propagated to the status API yet — a race
    /// between submission and visibility, not an error.
    NotYetVisible,
    /// The invocation exists but has not finished.
    InProgress,
}

/// Managed execution channel: submit a command, poll its status.
#[allow(async_fn_in_trait)]
pub trait CommandChannel {
    /// Submit `command` for execution on `instance`.
    ///
    /// Returns the channel's command id used for subsequent polls.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel rejects the submission (permissions,
    /// invalid instance, channel disabled on the target).
    async fn submit(&self, instance: &str, command: &str, timeout: Duration) -> Result<String>;

    /// Observe the current state of a submitted invocation.
    ///
    /// # Errors
    ///
    /// Returns an error on transient lookup failures. Callers treat such
    /// errors as retryable, never as a terminal result.
    async fn poll(&self, command_id: &str, instance: &str) -> Result<Poll>;
}

/// A channel-enabled instance as shown in interactive pickers.
#[derive(Debug, Clone)]
pub struct ManagedInstance {
    pub id: String,
    /// `Name` tag value, when the instance has one.
    pub name: Option<String>,
}

impl ManagedInstance {
    /// Display label, e.g. `web-1 (i-0abc)`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} ({})", self.name.as_deref().unwrap_or("NoName"), self.id)
    }
}

/// Live-inventory lookup. Failures degrade to warnings or empty lists at
/// the call sites — never a hard failure for the whole operation.
#[allow(async_fn_in_trait)]
pub trait InventoryLookup {
    /// Running instances whose `Name` tag equals `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself fails (network, permissions).
    async fn instances_by_name(&self, name: &str) -> Result<Vec<String>>;

    /// All channel-enabled instances in the session's region, with display
    /// names where available.
    ///
    /// # Errors
    ///
    /// Returns an error if the instance inventory cannot be listed.
    async fn managed_instances(&self) -> Result<Vec<ManagedInstance>>;
}

// ── Production implementation ────────────────────────────────────────────────

/// Production channel + inventory — drives the `aws` binary.
pub struct SsmChannel {
    session: Session,
}

impl SsmChannel {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    async fn run_aws(&self, args: &[&str]) -> Result<std::process::Output> {
        let mut full = self.session.cli_args();
        full.extend(args.iter().map(ToString::to_string));
        let refs: Vec<&str> = full.iter().map(String::as_str).collect();
        run_with_timeout("aws", &refs, DEFAULT_CLI_TIMEOUT).await
    }
}

impl CommandChannel for SsmChannel {
    async fn submit(&self, instance: &str, command: &str, timeout: Duration) -> Result<String> {
        let parameters = serde_json::json!({ "commands": [command] }).to_string();
        let timeout_secs = timeout.as_secs().max(1).to_string();
        let out = self
            .run_aws(&[
                "ssm",
                "send-command",
                "--instance-ids",
                instance,
                "--document-name",
                RUN_SHELL_SCRIPT,
                "--parameters",
                &parameters,
                "--timeout-seconds",
                &timeout_secs,
                "--output",
                "json",
            ])
            .await
            .context("running aws ssm send-command")?;
        if !out.status.success() {
            anyhow::bail!("send-command rejected: {}", stderr_line(&out.stderr));
        }
        parse_send_response(&out.stdout)
    }

    async fn poll(&self, command_id: &str, instance: &str) -> Result<Poll> {
        let out = self
            .run_aws(&[
                "ssm",
                "get-command-invocation",
                "--command-id",
                command_id,
                "--instance-id",
                instance,
                "--output",
                "json",
            ])
            .await
            .context("running aws ssm get-command-invocation")?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            if stderr.contains("InvocationDoesNotExist") {
                return Ok(Poll::NotYetVisible);
            }
            anyhow::bail!("get-command-invocation failed: {}", stderr.trim());
        }
        parse_invocation(&out.stdout)
    }
}

impl InventoryLookup for SsmChannel {
    async fn instances_by_name(&self, name: &str) -> Result<Vec<String>> {
        let name_filter = format!("Name=tag:Name,Values={name}");
        let out = self
            .run_aws(&[
                "ec2",
                "describe-instances",
                "--filters",
                &name_filter,
                "Name=instance-state-name,Values=running",
                "--query",
                "Reservations[].Instances[].InstanceId",
                "--output",
                "json",
            ])
            .await
            .context("running aws ec2 describe-instances")?;
        if !out.status.success() {
            anyhow::bail!("describe-instances failed: {}", stderr_line(&out.stderr));
        }
        serde_json::from_slice(&out.stdout).context("parsing describe-instances response")
    }

    async fn managed_instances(&self) -> Result<Vec<ManagedInstance>> {
        let out = self
            .run_aws(&[
                "ssm",
                "describe-instance-information",
                "--query",
                "InstanceInformationList[].InstanceId",
                "--output",
                "json",
            ])
            .await
            .context("running aws ssm describe-instance-information")?;
        if !out.status.success() {
            anyhow::bail!(
                "describe-instance-information failed: {}",
                stderr_line(&out.stderr)
            );
        }
        let ids: Vec<String> =
            serde_json::from_slice(&out.stdout).context("parsing instance information")?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        // Name enrichment is best-effort; ids without a resolvable Name tag
        // still show up in the picker.
        let names = self.lookup_names(&ids).await.unwrap_or_default();
        Ok(ids
            .into_iter()
            .map(|id| {
                let name = names
                    .iter()
                    .find(|row| row.id == id)
                    .and_then(|row| row.name.clone());
                ManagedInstance { id, name }
            })
            .collect())
    }
}

impl SsmChannel {
    async fn lookup_names(&self, ids: &[String]) -> Result<Vec<NameRow>> {
        let mut args: Vec<&str> = vec!["ec2", "describe-instances", "--instance-ids"];
        args.extend(ids.iter().map(String::as_str));
        args.extend([
            "--query",
            "Reservations[].Instances[].{id:InstanceId,name:Tags[?Key=='Name']|[0].Value}",
            "--output",
            "json",
        ]);
        let out = self.run_aws(&args).await?;
        if !out.status.success() {
            anyhow::bail!("describe-instances failed: {}", stderr_line(&out.stderr));
        }
        serde_json::from_slice(&out.stdout).context("parsing instance names")
    }
}

#[derive(Deserialize)]
struct NameRow {
    id: String,
    name: Option<String>,
}

// ── Response parsing ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SendCommandResponse {
    command: CommandMeta,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CommandMeta {
    command_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Invocation {
    status: String,
    #[serde(default)]
    standard_output_content: String,
    #[serde(default)]
    standard_error_content: String,
}

fn parse_send_response(stdout: &[u8]) -> Result<String> {
    let resp: SendCommandResponse =
        serde_json::from_slice(stdout).context("parsing send-command response")?;
    Ok(resp.command.command_id)
}

fn parse_invocation(stdout: &[u8]) -> Result<Poll> {
    let inv: Invocation =
        serde_json::from_slice(stdout).context("parsing get-command-invocation response")?;
    Ok(match classify_status(&inv.status) {
        Some(status) => Poll::Finished {
            status,
            stdout: inv.standard_output_content,
            stderr: inv.standard_error_content,
        },
        None => Poll::InProgress,
    })
}

/// Map a remote status string to a terminal [`CommandStatus`], or `None` for
/// anything non-terminal (`Pending`, `InProgress`, `Delayed`, `Cancelling`).
fn classify_status(status: &str) -> Option<CommandStatus> {
    match status {
        "Success" => Some(CommandStatus::Success),
        "Failed" => Some(CommandStatus::Failed),
        "TimedOut" => Some(CommandStatus::TimedOut),
        "Cancelled" => Some(CommandStatus::Cancelled),
        _ => None,
    }
}

fn stderr_line(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr).trim().to_string()
}
