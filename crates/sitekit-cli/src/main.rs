use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sitekit_core::SiteConfig;

mod commands;
mod script;

#[derive(Parser)]
#[command(name = "sitekit")]
#[command(author, version, about = "Headless driver for the sitekit interactivity layer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ~/.config/sitekit/config.toml)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scripted session against a page fixture
    Replay {
        /// Page fixture (TOML or JSON)
        #[arg(short = 'p', long)]
        page: PathBuf,
        /// Session script (TOML `[[step]]` list)
        #[arg(short = 's', long)]
        script: PathBuf,
        /// Print notifications and the final snapshot as JSON
        #[arg(long)]
        json: bool,
        /// Pace `wait` steps in wall-clock time
        #[arg(long)]
        realtime: bool,
    },
    /// Classify a viewport width
    Breakpoint {
        width: f64,
    },
    /// Print the effective configuration
    Config {
        /// Write the defaults to the configuration path
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => SiteConfig::from_path(path)?,
        None => SiteConfig::load()?,
    };

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let config = Arc::new(config);

    match cli.command {
        Commands::Replay {
            page,
            script,
            json,
            realtime,
        } => commands::replay::run(config, &page, &script, json, realtime).await,
        Commands::Breakpoint { width } => commands::breakpoint::run(width),
        Commands::Config { init } => commands::config::run(&config, init),
    }
}
