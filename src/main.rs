//! Machina CLI - fleet maintenance over the AWS SSM command channel

use clap::Parser;

use machina_cli::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = cli.run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
