use anyhow::Context;
use clap::Parser;

use denguewatch::{cli, commands, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = cli::Args::parse();

    match args.cmd {
        cli::Command::Serve(cmd) => server::run(cmd).await.context("serve failed"),
        cli::Command::Hospitals(cmd) => commands::hospitals(cmd).await,
        cli::Command::Heatmap(cmd) => commands::heatmap(cmd).await,
        cli::Command::Locations(cmd) => commands::locations(cmd).await,
        cli::Command::Predict(cmd) => commands::predict(cmd).await,
        cli::Command::Subscribe(cmd) => commands::subscribe(cmd).await,
        cli::Command::Unsubscribe(cmd) => commands::unsubscribe(cmd).await,
    }
}
