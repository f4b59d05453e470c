//! `machina connect` — interactive session to a single instance.
//!
//! The core hands the terminal over to `aws ssm start-session` entirely;
//! no terminal I/O is proxied here.

use anyhow::Result;
use clap::Args;

use crate::channel::SsmChannel;
use crate::command_runner;
use crate::commands::resolve_targets;
use crate::logging::LogSink;
use crate::output::OutputContext;
use crate::session::Session;

/// Arguments for the connect command.
#[derive(Args)]
pub struct ConnectArgs {
    /// Instance id or Name tag to connect to
    pub target: String,
}

/// Run `machina connect <target>`.
///
/// When the target token resolves to several instances, the first one wins.
///
/// # Errors
///
/// Returns an error if nothing resolves, the `aws` CLI cannot be spawned,
/// or the session exits with failure.
pub async fn run(
    ctx: &OutputContext,
    session: &Session,
    args: &ConnectArgs,
    log: &LogSink,
) -> Result<()> {
    let channel = SsmChannel::new(session.clone());
    let instances = resolve_targets(ctx, &channel, &args.target, log).await?;
    let instance = &instances[0];

    ctx.info(&format!("Starting session to {instance}..."));
    log.line(&format!("start-session -> {instance}"));
    start_session(session, instance).await
}

/// Hand the terminal to `aws ssm start-session --target <instance>`.
///
/// # Errors
///
/// Returns an error if the `aws` CLI cannot be spawned or the session exits
/// with failure.
pub async fn start_session(session: &Session, instance: &str) -> Result<()> {
    let mut cli_args = session.cli_args();
    cli_args.extend([
        "ssm".to_string(),
        "start-session".to_string(),
        "--target".to_string(),
        instance.to_string(),
    ]);
    let refs: Vec<&str> = cli_args.iter().map(String::as_str).collect();
    let status = command_runner::run_interactive("aws", &refs).await?;
    anyhow::ensure!(status.success(), "session to {instance} exited with failure");
    Ok(())
}
