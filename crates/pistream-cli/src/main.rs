//! pistream - live display for a streamed computation of π

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pistream_core::{StreamClient, StreamConfig};

mod headless;
mod logging;
mod reconnect;
mod tui;

use reconnect::AutoReconnect;
use tui::themes::{Theme, THEME_REGISTRY};

#[derive(Parser)]
#[command(name = "pistream")]
#[command(about = "Watch π being computed digit by digit")]
#[command(version)]
struct Cli {
    /// Stream endpoint (overrides the config file)
    #[arg(short, long, global = true)]
    endpoint: Option<String>,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Color theme for the terminal UI
    #[arg(short, long, global = true)]
    theme: Option<String>,

    /// Reconnect automatically after connection errors
    #[arg(long, global = true)]
    auto_reconnect: bool,

    /// Log file for the terminal UI
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Interactive terminal display (default)
    Tui,
    /// Print one line per change until the stream completes
    Watch,
    /// Query the current snapshot once
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Tui);

    match command {
        Commands::Tui => {
            let path = cli
                .log_file
                .clone()
                .or_else(logging::default_log_path)
                .context("No data directory for the log file; pass --log-file")?;
            logging::init_file(&path)?;
        }
        Commands::Watch | Commands::Status => logging::init_stderr(),
    }

    let config = load_config(&cli)?;
    tracing::debug!(endpoint = %config.endpoint, "Loaded configuration");

    match command {
        Commands::Tui => {
            let theme = resolve_theme(cli.theme.as_deref())?;
            let reconnect = AutoReconnect::new(config.reconnect.clone());
            let client = StreamClient::http(config).context("Failed to build HTTP client")?;
            tui::run(client, theme, reconnect).await
        }
        Commands::Watch => {
            let reconnect = AutoReconnect::new(config.reconnect.clone());
            let client = StreamClient::http(config).context("Failed to build HTTP client")?;
            headless::watch(client, reconnect).await
        }
        Commands::Status => headless::status(&config).await,
    }
}

fn load_config(cli: &Cli) -> Result<StreamConfig> {
    let mut config = StreamConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(endpoint) = &cli.endpoint {
        config = config.with_endpoint(endpoint)?;
    }
    if cli.auto_reconnect {
        config.reconnect.enabled = true;
    }
    Ok(config)
}

fn resolve_theme(name: Option<&str>) -> Result<Theme> {
    match name {
        Some(name) => THEME_REGISTRY.get(name).cloned().with_context(|| {
            let available: Vec<&str> = THEME_REGISTRY.list().into_iter().map(|(n, _)| n).collect();
            format!(
                "Unknown theme '{}' (available: {})",
                name,
                available.join(", ")
            )
        }),
        None => Ok(THEME_REGISTRY.get_or_default(None).clone()),
    }
}
