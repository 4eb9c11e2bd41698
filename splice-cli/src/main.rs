//! Splice CLI - Command-line interface
//!
//! Provides command-line access to the Splice media server.

mod commands;

use clap::Parser;

#[derive(Parser)]
#[command(name = "splice")]
#[command(about = "A chunked recording upload and streaming server")]
struct Cli {
    #[command(subcommand)]
    command: commands::Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    commands::handle_command(cli.command).await
}
