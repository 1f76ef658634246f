//! SQLite persistence for finished games.

mod error;
mod models;
mod repository;
mod schema;

pub use error::DbError;
pub use models::{GameResultRow, LeaderboardEntry, NewGameResult};
pub use repository::ResultRepository;
