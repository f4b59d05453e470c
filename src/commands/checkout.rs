//! `machina checkout` — switch branches across the fleet.

use anyhow::Result;
use clap::Args;

use crate::actions;
use crate::channel::SsmChannel;
use crate::commands::{render_results, resolve_targets, TargetArgs};
use crate::logging::LogSink;
use crate::output::OutputContext;
use crate::session::Session;

/// Arguments for the checkout command.
#[derive(Args)]
pub struct CheckoutArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Repo path on the instances
    #[arg(long, default_value = "/opt/app")]
    pub repo: String,

    /// Branch to check out
    #[arg(long, default_value = "main")]
    pub branch: String,
}

/// Run `machina checkout`.
///
/// # Errors
///
/// Returns an error if no instances resolve or output rendering fails.
pub async fn run(
    ctx: &OutputContext,
    json: bool,
    session: &Session,
    args: &CheckoutArgs,
    log: &LogSink,
) -> Result<()> {
    let channel = SsmChannel::new(session.clone());
    let instances = resolve_targets(ctx, &channel, &args.target.instances, log).await?;
    let cfg = args.target.dispatch_config();
    let results = actions::git_checkout(
        &channel,
        &instances,
        &args.repo,
        &args.branch,
        &cfg,
        args.target.concurrency,
        log,
    )
    .await;
    render_results(ctx, json, &results)
}
