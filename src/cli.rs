//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;
use crate::logging::LogSink;
use crate::output::OutputContext;
use crate::session::Session;

/// Fleet maintenance over the AWS SSM command channel
#[derive(Parser)]
#[command(
    name = "machina",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// AWS profile name
    #[arg(long, global = true, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    /// AWS region
    #[arg(long, global = true, env = "AWS_REGION")]
    pub region: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Git pull across the fleet
    Pull(commands::pull::PullArgs),

    /// Switch branches across the fleet
    Checkout(commands::checkout::CheckoutArgs),

    /// Run an arbitrary shell command across the fleet
    Run(commands::run::RunArgs),

    /// Locate files across the fleet
    Find(commands::find::FindArgs),

    /// Insert a line after the first regex match in a remote file
    Patch(commands::patch::PatchArgs),

    /// Open an interactive session to a single instance
    Connect(commands::connect::ConnectArgs),

    /// Interactive action menu
    Menu {
        /// Comma-separated instance ids or Name tags (picker when omitted)
        #[arg(long, value_name = "LIST")]
        instances: Option<String>,
    },

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli { json, quiet, no_color, profile, region, command } = self;

        if let Command::Version = command {
            commands::version::run(json);
            return Ok(());
        }

        let ctx = OutputContext::new(no_color, quiet);
        let session = Session::new(profile, region);
        let log = LogSink::new(quiet)?;
        if let Some(p) = &session.profile {
            log.line(&format!("Using AWS profile: {p}"));
        }
        if let Some(r) = &session.region {
            log.line(&format!("Using region: {r}"));
        }

        match command {
            Command::Pull(args) => commands::pull::run(&ctx, json, &session, &args, &log).await,
            Command::Checkout(args) => {
                commands::checkout::run(&ctx, json, &session, &args, &log).await
            }
            Command::Run(args) => commands::run::run(&ctx, json, &session, &args, &log).await,
            Command::Find(args) => commands::find::run(&ctx, json, &session, &args, &log).await,
            Command::Patch(args) => commands::patch::run(&ctx, json, &session, &args, &log).await,
            Command::Connect(args) => commands::connect::run(&ctx, &session, &args, &log).await,
            Command::Menu { instances } => {
                commands::menu::run(&ctx, &session, instances.as_deref(), &log).await
            }
            Command::Version => Ok(()),
        }
    }
}
