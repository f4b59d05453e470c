//! `machina pull` — git pull across the fleet.

use anyhow::Result;
use clap::Args;

use crate::actions;
use crate::channel::SsmChannel;
use crate::commands::{render_results, resolve_targets, TargetArgs};
use crate::logging::LogSink;
use crate::output::OutputContext;
use crate::session::Session;

/// Arguments for the pull command.
#[derive(Args)]
pub struct PullArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Repo path on the instances
    #[arg(long, default_value = "/opt/app")]
    pub repo: String,
}

/// Run `machina pull`.
///
/// # Errors
///
/// Returns an error if no instances resolve or output rendering fails.
pub async fn run(
    ctx: &OutputContext,
    json: bool,
    session: &Session,
    args: &PullArgs,
    log: &LogSink,
) -> Result<()> {
    let channel = SsmChannel::new(session.clone());
    let instances = resolve_targets(ctx, &channel, &args.target.instances, log).await?;
    let cfg = args.target.dispatch_config();
    let results = actions::git_pull(
        &channel,
        &instances,
        &args.repo,
        &cfg,
        args.target.concurrency,
        log,
    )
    .await;
    render_results(ctx, json, &results)
}
