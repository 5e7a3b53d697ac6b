use clap::Parser;
use leaf_ensemble::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => cli::serve::run().await,
        Command::Fetch => cli::fetch::run().await,
        Command::Predict(args) => cli::predict::run(args).await,
    }
}
