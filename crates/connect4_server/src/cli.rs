//! Command-line interface for the Connect Four server.

use clap::{Parser, Subcommand};

/// Connect Four - real-time matchmaking server with a bot fallback
#[derive(Parser, Debug)]
#[command(name = "connect4")]
#[command(about = "Real-time Connect Four server", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the game server
    Serve {
        /// Path to a TOML config file
        #[arg(short, long, default_value = "connect4.toml")]
        config: std::path::PathBuf,

        /// Host to bind to (overrides config and HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// SQLite file for results (overrides config and DATABASE_PATH)
        #[arg(long)]
        db_path: Option<String>,
    },

    /// Print the leaderboard
    Leaderboard {
        /// Path to the database file
        #[arg(long, default_value = "connect4.db")]
        db_path: String,

        /// Maximum number of players to show
        #[arg(short, long)]
        limit: Option<usize>,
    },
}
