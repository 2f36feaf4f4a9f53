//! Lorechat terminal client entry point.

use std::error::Error;

use clap::{Parser, Subcommand};
use lorechat_client::HttpBackend;
use tracing_subscriber::EnvFilter;

mod admin;
mod config;
mod error;
mod input;
mod render;
mod repl;

use admin::AdminCommand;
use config::{Config, ConfigArgs, LogFormat};

#[derive(Debug, Parser)]
#[command(name = "lorechat", version)]
#[command(about = "Talk to the NPCs of a lore-driven world", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Pick a location and an NPC, then talk (default).
    Chat,
    /// Manage lore, locations and characters.
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },
}

fn init_tracing(format: LogFormat) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = Config::from_args(&cli.config)?;
    init_tracing(config.log_format);

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => repl::run(&config).await?,
        Command::Admin { command } => {
            let backend = HttpBackend::new(&config.api_base, config.timeout)?;
            admin::run(command, &backend, &mut std::io::stdout()).await?;
        }
    }

    Ok(())
}
