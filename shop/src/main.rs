use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::io;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use shop_manager::backend::config::{AppConfig, CliArgs};
use shop_manager::backend::initialize_backend;
use shop_manager::backend::io::Shell;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never interleave with the menu
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let config = AppConfig::from_args(CliArgs::parse())?;

    let app_state = match initialize_backend(&config).await {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize backend: {:#}", e);
            return Err(e);
        }
    };
    println!("{}", "Database and tables are ready.".green());

    info!("🚀 Starting interactive shell");
    let mut shell = Shell::new(app_state, io::stdin().lock(), io::stdout());
    shell.run().await?;

    Ok(())
}
