//! Database models for finished games.

use chrono::NaiveDateTime;
use connect4_game::Winner;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::db::schema;
use crate::session::GameResult;

/// Stored result of a finished game.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::game_results)]
pub struct GameResultRow {
    id: i32,
    session_id: String,
    player1: String,
    player2: String,
    winner: i32,
    is_draw: bool,
    reason: String,
    created_at: NaiveDateTime,
}

impl GameResultRow {
    /// Name of the winning player, `None` for a draw.
    pub fn winner_name(&self) -> Option<&str> {
        match self.winner {
            1 => Some(&self.player1),
            2 => Some(&self.player2),
            _ => None,
        }
    }
}

/// Insertable result row.
#[derive(Debug, Clone, Insertable, new, Getters)]
#[diesel(table_name = schema::game_results)]
pub struct NewGameResult {
    session_id: String,
    player1: String,
    player2: String,
    winner: i32,
    is_draw: bool,
    reason: String,
}

impl From<&GameResult> for NewGameResult {
    fn from(result: &GameResult) -> Self {
        Self::new(
            result.session_id().to_string(),
            result.player_one().clone(),
            result.player_two().clone(),
            i32::from(result.winner().code()),
            *result.winner() == Winner::Draw,
            result.reason().to_string(),
        )
    }
}

/// One leaderboard line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new, Getters)]
pub struct LeaderboardEntry {
    player: String,
    wins: i64,
}
