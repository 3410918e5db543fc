//! # Facility CLI Binary
//!
//! Command-line interface for running facility projections.

use anyhow::Result;
use clap::Parser;
use facility_engine::cli::{load_config, Cli, CliHandler};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG overrides the default level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if cli.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).with_writer(std::io::stderr).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    }

    let config = load_config(cli.config.as_deref())?;

    // Handle command
    let handler = CliHandler::new(config, cli.json);
    handler.handle_command(cli.command)?;

    Ok(())
}
