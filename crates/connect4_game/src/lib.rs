//! Pure Connect Four game logic.
//!
//! # Architecture
//!
//! - **Types**: the 6x7 board, seats and cells
//! - **Rules**: win, draw and threat detection as pure functions
//! - **Game**: the move-application state machine
//! - **Bot**: a heuristic opponent built on the rules
//!
//! Nothing here is async or shared; the server crate wraps [`Game`] in its
//! own synchronisation.
//!
//! # Example
//!
//! ```
//! use connect4_game::{Disc, Game, MoveOutcome};
//!
//! let mut game = Game::new();
//! assert_eq!(game.apply_move(3, Disc::PlayerOne), Ok(MoveOutcome::Continue));
//! assert_eq!(game.turn(), Disc::PlayerTwo);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod bot;
mod game;
pub mod rules;
mod types;

pub use game::{Game, GameStatus, MoveError, MoveOutcome, Winner};
pub use types::{Board, COLS, Cell, Disc, ROWS};
