use anyhow::{Context, Result};
use clap::Parser;

use alpha_quotes::cli::{self, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli::init_logging(cli.log_level.as_deref());

    if cli.api_key.is_empty() {
        log::warn!("No API key supplied; the service will reject these queries");
    }

    let client = cli.build_client().context("Failed to build client")?;
    let failures = cli::run(&cli, &client).await;

    if failures > 0 {
        log::info!("{} queries failed", failures);
        std::process::exit(1);
    }

    Ok(())
}
