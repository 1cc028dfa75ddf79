use anyhow::Result;
use clap::Parser;
use enricher::Config;
use enricher::app;
use enricher::cli::Cli;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean JSON.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load_or_init()?,
    };
    config.apply_env_overrides();

    app::dispatch(cli, config).await
}
