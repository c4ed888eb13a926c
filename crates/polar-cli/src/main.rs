mod cli;
mod commands;
mod status;
mod table;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use polar_core::{PolarConfig, Settings};
use polar_nodes::{ClientOptions, CoreLightningClient, LndClient};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::cli::{Cli, Commands};
use crate::commands::Output;

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::new(filter))
        .init();
}

/// Persisted settings with this run's flags applied on top.
fn effective_settings(cli: &Cli) -> Settings {
    let mut settings = Settings::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not load settings, using defaults");
        Settings::default()
    });
    if let Some(network) = &cli.network {
        settings.network = Some(network.clone());
    }
    if let Some(home) = &cli.polar_home {
        settings.polar_home = Some(home.clone());
    }
    if let Some(timeout) = cli.timeout {
        settings.timeout_secs = timeout;
    }
    settings.strict_tls |= cli.strict_tls;
    settings
}

fn load(settings: &Settings) -> Result<(PolarConfig, ClientOptions)> {
    let config =
        polar_core::load_config(settings).context("failed to load node configuration")?;
    Ok((config, ClientOptions::from_settings(settings)))
}

async fn run(cli: Cli) -> Result<()> {
    let settings = effective_settings(&cli);
    let out = Output::new(cli.json);

    match cli.command {
        Commands::Config { action } => commands::config(&action, &settings, out),
        Commands::Networks => commands::networks(&settings, out),
        Commands::Nodes => {
            let (config, options) = load(&settings)?;
            commands::nodes(&config, &options, out)
        }
        Commands::Status => {
            let (config, options) = load(&settings)?;
            status::run(&config, &options, out).await
        }
        Commands::Cln { node, action } => {
            let (config, options) = load(&settings)?;
            let client = CoreLightningClient::new(&config, &node, &options)?;
            commands::node_action(&client, action, out).await
        }
        Commands::Lnd { node, action } => {
            let (config, options) = load(&settings)?;
            let client = LndClient::new(&config, &node, &options)?;
            commands::lnd_action(&client, action, out).await
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{}", format!("Error: {e:#}").red());
        std::process::exit(1);
    }
    Ok(())
}
