//! `machina patch` — insert a line after the first regex match in a remote
//! file, one instance at a time.

use anyhow::Result;
use clap::Args;

use crate::actions;
use crate::channel::SsmChannel;
use crate::commands::{render_results, resolve_targets, TargetArgs};
use crate::logging::LogSink;
use crate::output::OutputContext;
use crate::patch::PatchSpec;
use crate::session::Session;

/// Arguments for the patch command.
#[derive(Args)]
pub struct PatchArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Full path of the file to patch on each instance
    #[arg(long, value_name = "PATH")]
    pub file: String,

    /// awk regex selecting the anchor line, e.g. '^def run\(\)'
    #[arg(long = "match", value_name = "REGEX")]
    pub pattern: String,

    /// Exact text of the line to insert after the match
    #[arg(long, value_name = "TEXT")]
    pub newline: String,
}

/// Run `machina patch`.
///
/// Patches are applied per instance sequentially — a failed patch on one
/// instance is reported and the rest still get their turn.
///
/// # Errors
///
/// Returns an error if no instances resolve or output rendering fails.
pub async fn run(
    ctx: &OutputContext,
    json: bool,
    session: &Session,
    args: &PatchArgs,
    log: &LogSink,
) -> Result<()> {
    let channel = SsmChannel::new(session.clone());
    let instances = resolve_targets(ctx, &channel, &args.target.instances, log).await?;
    let cfg = args.target.dispatch_config();
    let spec = PatchSpec::new(&args.file, &args.pattern, &args.newline);

    let mut results = Vec::with_capacity(instances.len());
    for instance in &instances {
        let res = actions::patch_after_match(&channel, instance, &spec, &cfg).await;
        log.line(&format!(
            "append on {instance} file={} status={}",
            spec.file, res.status
        ));
        results.push(res);
    }
    render_results(ctx, json, &results)
}
