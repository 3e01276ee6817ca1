mod cmd;

use clap::Parser;

use cmd::{Commands, Run};

/// Exercise exponential backoff strategies from the command line
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    Cli::parse().command.run().await
}
