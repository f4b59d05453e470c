//! Command implementations

pub mod checkout;
pub mod connect;
pub mod find;
pub mod menu;
pub mod patch;
pub mod pull;
pub mod run;
pub mod version;

use std::time::Duration;

use anyhow::Result;
use clap::Args;

use crate::channel::InventoryLookup;
use crate::dispatch::{CommandResult, CommandStatus, DispatchConfig};
use crate::engine::DEFAULT_CONCURRENCY;
use crate::error::FleetError;
use crate::logging::LogSink;
use crate::output::{progress, OutputContext};
use crate::resolver;

/// Target selection and dispatch budget shared by all broadcast commands.
#[derive(Args)]
pub struct TargetArgs {
    /// Comma-separated instance ids or Name tags
    #[arg(long, value_name = "LIST")]
    pub instances: String,

    /// Max dispatches in flight at once
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Per-instance timeout in seconds
    #[arg(long, default_value_t = 300)]
    pub timeout: u64,
}

impl TargetArgs {
    /// Dispatch budget from the flags, default poll pacing.
    #[must_use]
    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            timeout: Duration::from_secs(self.timeout.max(1)),
            ..DispatchConfig::default()
        }
    }
}

/// Resolve `--instances` tokens, failing the whole operation if nothing
/// resolves, so misconfiguration is caught before any dispatch.
///
/// # Errors
///
/// Returns [`FleetError::NoInstances`] when the token list resolves to an
/// empty set.
pub async fn resolve_targets(
    ctx: &OutputContext,
    inventory: &impl InventoryLookup,
    raw: &str,
    log: &LogSink,
) -> Result<Vec<String>> {
    let tokens = resolver::split_tokens(raw);
    let pb = ctx.show_progress().then(|| progress::spinner("Resolving instances..."));
    let instances = resolver::resolve(inventory, &tokens, log).await;
    if let Some(pb) = pb {
        progress::finish_clear(&pb);
    }
    if instances.is_empty() {
        return Err(FleetError::NoInstances.into());
    }
    log.line(&format!("Target instances: {}", instances.join(", ")));
    Ok(instances)
}

/// Print broadcast results: JSON when requested, otherwise a per-instance
/// summary plus totals. Per-result detail (stdout/stderr) was already
/// streamed to the log sink as each result arrived.
///
/// # Errors
///
/// Returns an error only if JSON serialization fails.
pub fn render_results(ctx: &OutputContext, json: bool, results: &[CommandResult]) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(results)?);
        return Ok(());
    }
    let mut ok = 0usize;
    for res in results {
        match res.status {
            CommandStatus::Success => {
                ok += 1;
                ctx.success(&res.instance);
            }
            CommandStatus::FailedToSend => {
                ctx.error(&format!(
                    "{}: FailedToSend: {}",
                    res.instance,
                    res.error.as_deref().unwrap_or("unknown send error")
                ));
            }
            status => {
                ctx.error(&format!("{}: {status}", res.instance));
            }
        }
    }
    ctx.kv(
        "dispatched",
        &format!("{} instance(s), {} succeeded", results.len(), ok),
    );
    Ok(())
}
