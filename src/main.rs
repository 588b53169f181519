mod abi;
mod cli;
mod commands;
mod config;
mod display;
mod error;
mod extract;
mod locator;
mod message;
mod outbound;
mod registry;
mod retryable;
mod rpc;
#[cfg(test)]
mod test_util;
mod tracker;
mod types;

use anyhow::Result;
use clap::Parser;

use tracing_subscriber::{fmt, EnvFilter};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr) // reports go to stdout
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    tracing::debug!("logger initialized");

    let cli = cli::Cli::parse();
    let config = config::Config::load(cli.config_path.as_deref())?;
    cli.run(config).await
}
