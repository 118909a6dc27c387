//! Gastos CLI - Household finance tracker
//!
//! Usage:
//!   gastos init                       Initialize database and seed defaults
//!   gastos serve --port 8000          Start the REST API
//!   gastos summary --month 3 --year 2024
//!   gastos accounts                   Show account balances

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db),
        Commands::Serve {
            port,
            host,
            static_dir,
        } => commands::cmd_serve(&cli.db, &host, port, static_dir.as_deref()).await,
        Commands::Summary { month, year } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_summary(&db, month, year)
        }
        Commands::Accounts => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_accounts(&db)
        }
    }
}
