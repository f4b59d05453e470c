//! `machina find` — locate files across the fleet.

use anyhow::Result;
use clap::Args;

use crate::actions;
use crate::channel::SsmChannel;
use crate::commands::{render_results, resolve_targets, TargetArgs};
use crate::dispatch::CommandStatus;
use crate::logging::LogSink;
use crate::output::OutputContext;
use crate::session::Session;

/// Arguments for the find command.
#[derive(Args)]
pub struct FindArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Directory to search on the instances
    #[arg(long, default_value = "/opt/app")]
    pub repo: String,

    /// Filename glob, e.g. '*.py'
    #[arg(long, default_value = "*")]
    pub name: String,
}

/// Run `machina find`.
///
/// # Errors
///
/// Returns an error if no instances resolve or output rendering fails.
pub async fn run(
    ctx: &OutputContext,
    json: bool,
    session: &Session,
    args: &FindArgs,
    log: &LogSink,
) -> Result<()> {
    let channel = SsmChannel::new(session.clone());
    let instances = resolve_targets(ctx, &channel, &args.target.instances, log).await?;
    let cfg = args.target.dispatch_config();
    let results = actions::find_files(
        &channel,
        &instances,
        &args.repo,
        &args.name,
        &cfg,
        args.target.concurrency,
        log,
    )
    .await;

    if json {
        return render_results(ctx, json, &results);
    }
    for res in &results {
        ctx.header(&format!("{} ({})", res.instance, res.status));
        if res.status == CommandStatus::Success {
            for path in res.stdout.lines().filter(|l| !l.trim().is_empty()) {
                ctx.kv("  file", path);
            }
        }
    }
    Ok(())
}
