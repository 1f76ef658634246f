//! Destinations for finished game results.

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::db::{DbError, NewGameResult, ResultRepository};
use crate::session::GameResult;

/// Receives each finished game exactly once.
#[async_trait]
pub trait ResultSink: Send + Sync + std::fmt::Debug {
    /// Persists a finished game.
    async fn record_result(&self, result: &GameResult) -> Result<(), DbError>;
}

/// Writes results to SQLite on the blocking pool.
#[derive(Debug, Clone)]
pub struct SqliteResultSink {
    repository: ResultRepository,
}

impl SqliteResultSink {
    /// Wraps an opened repository.
    pub fn new(repository: ResultRepository) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl ResultSink for SqliteResultSink {
    #[instrument(skip(self, result), fields(session_id = %result.session_id()))]
    async fn record_result(&self, result: &GameResult) -> Result<(), DbError> {
        let repository = self.repository.clone();
        let row = NewGameResult::from(result);
        tokio::task::spawn_blocking(move || repository.record_result(row)).await??;
        Ok(())
    }
}

/// Discards results. Used when no database is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullResultSink;

#[async_trait]
impl ResultSink for NullResultSink {
    async fn record_result(&self, result: &GameResult) -> Result<(), DbError> {
        debug!(session_id = %result.session_id(), "No database configured, result dropped");
        Ok(())
    }
}
