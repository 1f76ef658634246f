//! Connect Four server binary.

use anyhow::Result;
use clap::Parser;
use connect4_server::cli::{Cli, Command};
use connect4_server::{ResultRepository, ServerConfig};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,connect4_server=debug")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            host,
            port,
            db_path,
        } => {
            let mut config = ServerConfig::load(Some(config.as_path()))?;
            if let Some(host) = host {
                config = config.with_host(host);
            }
            if let Some(port) = port {
                config = config.with_port(port);
            }
            if let Some(path) = db_path {
                config = config.with_database_path(Some(path));
            }
            info!(?config, "Starting Connect Four server");
            connect4_server::run(config).await
        }
        Command::Leaderboard { db_path, limit } => print_leaderboard(db_path, limit),
    }
}

#[instrument]
fn print_leaderboard(db_path: String, limit: Option<usize>) -> Result<()> {
    let repository = ResultRepository::new(db_path)?;
    let entries = repository.leaderboard(limit)?;
    if entries.is_empty() {
        println!("No games recorded yet.");
        return Ok(());
    }
    for (rank, entry) in entries.iter().enumerate() {
        println!("{:>3}. {:<20} {}", rank + 1, entry.player(), entry.wins());
    }
    Ok(())
}
