//! Server configuration.
//!
//! Values come from an optional TOML file, then environment variables
//! (`HOST`, `PORT`, `DATABASE_PATH`), then command-line flags.

use crate::error::ConfigError;
use derive_getters::Getters;
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Configuration for the game server.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    host: String,

    /// Port to bind.
    port: u16,

    /// SQLite file for finished games. Results are not saved when unset.
    database_path: Option<String>,

    /// How long a lone player waits before the bot joins.
    bot_join_delay_ms: u64,

    /// Pause before the bot answers a move.
    bot_move_delay_ms: u64,

    /// How often the liveness monitor looks at a disconnected player.
    poll_interval_ms: u64,

    /// How long a player may stay disconnected before forfeiting.
    grace_period_ms: u64,

    /// How long a finished session stays queryable.
    finished_retention_ms: u64,

    /// How often finished sessions are swept.
    sweep_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_path: None,
            bot_join_delay_ms: 10_000,
            bot_move_delay_ms: 700,
            poll_interval_ms: 5_000,
            grace_period_ms: 30_000,
            finished_retention_ms: 300_000,
            sweep_interval_ms: 60_000,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file. Missing keys take defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(port = config.port, "Config loaded successfully");
        Ok(config)
    }

    /// Loads the file if given and present, then applies environment overrides.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) if path.exists() => Self::from_file(path)?,
            Some(path) => {
                info!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };
        config.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `HOST`, `PORT` and `DATABASE_PATH` from `lookup`.
    pub fn with_env_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(host) = lookup("HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.port = port
                .parse()
                .map_err(|e| ConfigError::new(format!("Invalid PORT '{}': {}", port, e)))?;
        }
        if let Some(path) = lookup("DATABASE_PATH").filter(|p| !p.is_empty()) {
            self.database_path = Some(path);
        }
        if self.database_path.is_none() {
            warn!("DATABASE_PATH is not set; game results will not be saved");
        }
        Ok(self)
    }

    /// Delay before the bot joins a lone player.
    pub fn bot_join_delay(&self) -> Duration {
        Duration::from_millis(self.bot_join_delay_ms)
    }

    /// Delay before the bot answers a move.
    pub fn bot_move_delay(&self) -> Duration {
        Duration::from_millis(self.bot_move_delay_ms)
    }

    /// Liveness polling interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Disconnect grace period.
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    /// Retention of finished sessions.
    pub fn finished_retention(&self) -> Duration {
        Duration::from_millis(self.finished_retention_ms)
    }

    /// Sweep interval for finished sessions.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(*config.port(), 8080);
        assert_eq!(config.bot_join_delay(), Duration::from_secs(10));
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.grace_period(), Duration::from_secs(30));
        assert!(config.database_path().is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ServerConfig =
            toml::from_str("port = 9000\ngrace_period_ms = 1000\n").expect("valid toml");
        assert_eq!(*config.port(), 9000);
        assert_eq!(config.grace_period(), Duration::from_secs(1));
        assert_eq!(config.bot_move_delay(), Duration::from_millis(700));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> =
            [("PORT", "9999"), ("DATABASE_PATH", "results.db")].into_iter().collect();
        let config = ServerConfig::default()
            .with_env_overrides(|key| env.get(key).map(|v| v.to_string()))
            .expect("valid overrides");
        assert_eq!(*config.port(), 9999);
        assert_eq!(config.database_path().as_deref(), Some("results.db"));
        assert_eq!(config.host(), "127.0.0.1");
    }

    #[test]
    fn test_bad_port_is_rejected() {
        let result = ServerConfig::default()
            .with_env_overrides(|key| (key == "PORT").then(|| "not-a-port".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("server.toml");
        std::fs::write(&path, "host = \"0.0.0.0\"\nbot_join_delay_ms = 250\n").expect("write");
        let config = ServerConfig::from_file(&path).expect("load");
        assert_eq!(config.host(), "0.0.0.0");
        assert_eq!(config.bot_join_delay(), Duration::from_millis(250));
    }

    #[test]
    fn test_setters() {
        let config = ServerConfig::default().with_port(1234).with_grace_period_ms(10);
        assert_eq!(*config.port(), 1234);
        assert_eq!(config.grace_period(), Duration::from_millis(10));
    }
}
