//! `machina run` — arbitrary shell command across the fleet.

use anyhow::Result;
use clap::Args;

use crate::actions;
use crate::channel::SsmChannel;
use crate::commands::{render_results, resolve_targets, TargetArgs};
use crate::error::FleetError;
use crate::logging::LogSink;
use crate::output::OutputContext;
use crate::session::Session;

/// Arguments for the run command.
#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Shell command to run on each instance
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    pub command: Vec<String>,
}

/// Run `machina run`.
///
/// # Errors
///
/// Returns an error if the command is empty, no instances resolve, or
/// output rendering fails.
pub async fn run(
    ctx: &OutputContext,
    json: bool,
    session: &Session,
    args: &RunArgs,
    log: &LogSink,
) -> Result<()> {
    let command = args.command.join(" ");
    if command.trim().is_empty() {
        return Err(FleetError::MissingParameter("command").into());
    }

    let channel = SsmChannel::new(session.clone());
    let instances = resolve_targets(ctx, &channel, &args.target.instances, log).await?;
    let cfg = args.target.dispatch_config();
    let results = actions::custom(
        &channel,
        &instances,
        &command,
        &cfg,
        args.target.concurrency,
        log,
    )
    .await;
    render_results(ctx, json, &results)
}
