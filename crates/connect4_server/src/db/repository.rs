//! Repository for finished game results.

use std::collections::HashMap;

use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info, instrument};

use crate::db::{DbError, GameResultRow, LeaderboardEntry, NewGameResult, schema};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// SQLite-backed store of finished games.
#[derive(Debug, Clone)]
pub struct ResultRepository {
    db_path: String,
}

impl ResultRepository {
    /// Opens the database at `db_path` and applies pending migrations.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the database cannot be opened or migrated.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Result<Self, DbError> {
        info!(path = %db_path, "Opening result repository");
        let repository = Self { db_path };
        let mut conn = repository.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| DbError::new(format!("Failed to run migrations: {}", e)))?;
        info!(count = applied.len(), "Migrations applied");
        Ok(repository)
    }

    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        SqliteConnection::establish(&self.db_path)
            .map_err(|e| DbError::new(format!("Failed to connect to '{}': {}", self.db_path, e)))
    }

    /// Stores a finished game.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self, result), fields(session_id = %result.session_id(), reason = %result.reason()))]
    pub fn record_result(&self, result: NewGameResult) -> Result<GameResultRow, DbError> {
        debug!("Recording game result");
        let mut conn = self.connection()?;

        let row = diesel::insert_into(schema::game_results::table)
            .values(&result)
            .returning(GameResultRow::as_returning())
            .get_result(&mut conn)?;

        info!(
            result_id = row.id(),
            player1 = %row.player1(),
            player2 = %row.player2(),
            winner = row.winner(),
            "Game result recorded"
        );
        Ok(row)
    }

    /// Lists stored results, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn list_results(&self) -> Result<Vec<GameResultRow>, DbError> {
        let mut conn = self.connection()?;

        let rows = schema::game_results::table
            .order((
                schema::game_results::created_at.desc(),
                schema::game_results::id.desc(),
            ))
            .load::<GameResultRow>(&mut conn)?;

        debug!(count = rows.len(), "Results loaded");
        Ok(rows)
    }

    /// Counts wins per player, most wins first, ties broken by name.
    ///
    /// Draws credit nobody.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn leaderboard(&self, limit: Option<usize>) -> Result<Vec<LeaderboardEntry>, DbError> {
        let mut conn = self.connection()?;

        let rows = schema::game_results::table
            .filter(schema::game_results::is_draw.eq(false))
            .load::<GameResultRow>(&mut conn)?;

        let mut wins: HashMap<String, i64> = HashMap::new();
        for row in &rows {
            if let Some(name) = row.winner_name() {
                *wins.entry(name.to_string()).or_default() += 1;
            }
        }

        let mut entries: Vec<LeaderboardEntry> = wins
            .into_iter()
            .map(|(player, wins)| LeaderboardEntry::new(player, wins))
            .collect();
        entries.sort_by(|a, b| b.wins().cmp(a.wins()).then_with(|| a.player().cmp(b.player())));
        if let Some(limit) = limit {
            entries.truncate(limit);
        }

        info!(players = entries.len(), games = rows.len(), "Leaderboard computed");
        Ok(entries)
    }
}
