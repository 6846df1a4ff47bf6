// Inkkeys host driver

use anyhow::Context;
use clap::Parser;
use inkkeys_driver::Config;
use tracing::debug;

// CLI definitions
mod cli;
use cli::{Cli, Commands};

// Command handlers
mod commands;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let directive = if cli.verbose {
        "inkkeys=debug"
    } else {
        "inkkeys=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(directive.parse()?),
        )
        .init();

    let path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(&path).context("Failed to load configuration")?;
    debug!("Configuration from {}", path.display());

    if cli.port.is_some() {
        config.port = cli.port.clone();
    }
    if let Some(port) = cli.http_port {
        config.http_port = port;
    }
    if cli.no_http {
        config.http_enabled = false;
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => commands::utility::run(&config),
        Commands::List => commands::query::list(&config),
        Commands::Info => commands::query::info(&config),
        Commands::Assign { key, events } => commands::keymap::assign(&config, key, &events),
    }
}
