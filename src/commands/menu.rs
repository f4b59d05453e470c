//! `machina menu` — interactive action loop over a picked instance set.

use anyhow::{Context, Result};
use dialoguer::{Confirm, Input, MultiSelect, Select};

use crate::actions;
use crate::channel::{InventoryLookup as _, ManagedInstance, SsmChannel};
use crate::commands::{connect, render_results, resolve_targets};
use crate::dispatch::{CommandStatus, DispatchConfig};
use crate::engine::DEFAULT_CONCURRENCY;
use crate::error::FleetError;
use crate::logging::LogSink;
use crate::output::OutputContext;
use crate::patch::PatchSpec;
use crate::session::Session;

const ACTIONS: &[&str] = &[
    "Connect (single)",
    "Git pull",
    "Git checkout",
    "Custom command",
    "Find files",
    "Patch after match",
    "Exit",
];

/// Run the interactive menu loop.
///
/// # Errors
///
/// Returns an error if instance selection fails or a prompt cannot be read.
pub async fn run(
    ctx: &OutputContext,
    session: &Session,
    instances_flag: Option<&str>,
    log: &LogSink,
) -> Result<()> {
    let channel = SsmChannel::new(session.clone());
    let instances = match instances_flag {
        Some(raw) => resolve_targets(ctx, &channel, raw, log).await?,
        None => {
            let picked = pick_instances(&channel).await?;
            log.line(&format!("Target instances: {}", picked.join(", ")));
            picked
        }
    };

    loop {
        let choice = Select::new()
            .with_prompt("Choose action")
            .items(ACTIONS)
            .default(0)
            .interact()
            .context("action selection")?;

        match choice {
            0 => {
                let instance = &instances[0];
                ctx.info(&format!("Starting session to {instance}..."));
                log.line(&format!("start-session -> {instance}"));
                connect::start_session(session, instance).await?;
            }
            1 => git_pull(ctx, &channel, &instances, log).await?,
            2 => git_checkout(ctx, &channel, &instances, log).await?,
            3 => custom_command(ctx, &channel, &instances, log).await?,
            4 => find_files(ctx, &channel, &instances, log).await?,
            5 => patch_after_match(ctx, &channel, &instances, log).await?,
            _ => break,
        }
    }

    ctx.info(&format!("Session log: {}", log.path().display()));
    log.line("Session ended by user.");
    Ok(())
}

/// Pick targets from the channel-enabled inventory.
async fn pick_instances(channel: &SsmChannel) -> Result<Vec<String>> {
    let managed = channel
        .managed_instances()
        .await
        .context("listing channel-enabled instances")?;
    if managed.is_empty() {
        return Err(FleetError::NoInstances.into());
    }
    let labels: Vec<String> = managed.iter().map(ManagedInstance::label).collect();
    let picked = MultiSelect::new()
        .with_prompt("Select instances (space to select, enter to confirm)")
        .items(&labels)
        .interact()
        .context("instance selection")?;
    if picked.is_empty() {
        return Err(FleetError::NoInstances.into());
    }
    Ok(picked.into_iter().map(|idx| managed[idx].id.clone()).collect())
}

fn prompt_concurrency() -> Result<usize> {
    let parallel = Confirm::new()
        .with_prompt("Run in parallel?")
        .default(true)
        .interact()
        .context("parallel confirmation")?;
    if !parallel {
        return Ok(1);
    }
    let raw: String = Input::new()
        .with_prompt("Concurrency")
        .default(DEFAULT_CONCURRENCY.to_string())
        .interact_text()
        .context("concurrency prompt")?;
    Ok(raw.trim().parse().unwrap_or(DEFAULT_CONCURRENCY))
}

fn prompt(label: &str, default: &str) -> Result<String> {
    Input::new()
        .with_prompt(label)
        .default(default.to_string())
        .interact_text()
        .context("prompt")
}

async fn git_pull(
    ctx: &OutputContext,
    channel: &SsmChannel,
    instances: &[String],
    log: &LogSink,
) -> Result<()> {
    let repo = prompt("Repo path on instance", "/opt/app")?;
    let concurrency = prompt_concurrency()?;
    let cfg = DispatchConfig::default();
    let results = actions::git_pull(channel, instances, &repo, &cfg, concurrency, log).await;
    render_results(ctx, false, &results)
}

async fn git_checkout(
    ctx: &OutputContext,
    channel: &SsmChannel,
    instances: &[String],
    log: &LogSink,
) -> Result<()> {
    let repo = prompt("Repo path on instance", "/opt/app")?;
    let branch = prompt("Branch name to checkout", "main")?;
    let concurrency = prompt_concurrency()?;
    let cfg = DispatchConfig::default();
    let results =
        actions::git_checkout(channel, instances, &repo, &branch, &cfg, concurrency, log).await;
    render_results(ctx, false, &results)
}

async fn custom_command(
    ctx: &OutputContext,
    channel: &SsmChannel,
    instances: &[String],
    log: &LogSink,
) -> Result<()> {
    let command: String = Input::new()
        .with_prompt("Shell command")
        .interact_text()
        .context("command prompt")?;
    let concurrency = prompt_concurrency()?;
    let cfg = DispatchConfig::default();
    let results = actions::custom(channel, instances, &command, &cfg, concurrency, log).await;
    render_results(ctx, false, &results)
}

async fn find_files(
    ctx: &OutputContext,
    channel: &SsmChannel,
    instances: &[String],
    log: &LogSink,
) -> Result<()> {
    let repo = prompt("Repo path", "/opt/app")?;
    let glob = prompt("Filename pattern (glob)", "*.py")?;
    let concurrency = prompt_concurrency()?;
    let cfg = DispatchConfig::default();
    let results = actions::find_files(channel, instances, &repo, &glob, &cfg, concurrency, log).await;
    for res in &results {
        ctx.header(&format!("{} ({})", res.instance, res.status));
        for path in res.stdout.lines().filter(|l| !l.trim().is_empty()) {
            ctx.kv("  file", path);
        }
    }
    Ok(())
}

/// Interactive patch flow: find candidate files, prompt for the exact path
/// per instance, then apply the insert-after-first-match edit.
async fn patch_after_match(
    ctx: &OutputContext,
    channel: &SsmChannel,
    instances: &[String],
    log: &LogSink,
) -> Result<()> {
    let repo = prompt("Repo path", "/opt/app")?;
    let glob = prompt("Filename pattern (glob)", "*.py")?;
    let cfg = DispatchConfig::default();
    let found =
        actions::find_files(channel, instances, &repo, &glob, &cfg, DEFAULT_CONCURRENCY, log).await;

    for res in &found {
        let files: Vec<&str> = res.stdout.lines().filter(|l| !l.trim().is_empty()).collect();
        if res.status != CommandStatus::Success || files.is_empty() {
            ctx.warn(&format!("{}: no matching files found", res.instance));
            continue;
        }
        ctx.header(&format!("Files found on {}:", res.instance));
        for (idx, path) in files.iter().enumerate() {
            ctx.kv(&format!("  {}", idx + 1), path);
        }
        let chosen: String = Input::new()
            .with_prompt("Exact path to edit (empty to skip)")
            .allow_empty(true)
            .interact_text()
            .context("path prompt")?;
        if chosen.trim().is_empty() {
            continue;
        }
        let pattern = prompt("Match regex", r"^def run\(\)")?;
        let line: String = Input::new()
            .with_prompt("New line to insert AFTER match (exact text)")
            .interact_text()
            .context("line prompt")?;

        let spec = PatchSpec::new(chosen.trim(), &pattern, &line);
        let outcome = actions::patch_after_match(channel, &res.instance, &spec, &cfg).await;
        log.line(&format!(
            "append on {} file={} status={}",
            res.instance, spec.file, outcome.status
        ));
        match outcome.status {
            CommandStatus::Success => ctx.success(&format!("{} patched", res.instance)),
            status => ctx.error(&format!("{}: {status}", res.instance)),
        }
    }
    Ok(())
}
