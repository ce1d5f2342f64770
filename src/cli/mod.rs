use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::core::AppConfig;

pub mod auth;
pub mod chat;

#[derive(Subcommand)]
enum Command {
    /// Start a scheduling chat session
    Chat {},
    /// Perform Google OAuth consent and print a refresh token
    Auth {},
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        // Keep stdout for the REPL
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();

    init_tracing();

    match args.command {
        Some(Command::Chat {}) => {
            let config = AppConfig::from_env()?;
            chat::run(&config).await?;
        }
        Some(Command::Auth {}) => {
            let config = AppConfig::from_env()?;
            auth::run(&config).await?;
        }
        None => {}
    }

    Ok(())
}
