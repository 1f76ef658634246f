//! Connect Four game state machine.

use crate::rules::{check_win, is_full};
use crate::types::{Board, COLS, Disc};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Current status of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    /// Waiting for the side to move.
    InProgress,
    /// Game ended with four in a row, or by forfeit.
    Won(Disc),
    /// Board filled with no winner.
    Draw,
}

/// Outcome reported to observers: NONE, PLAYER_ONE, PLAYER_TWO or DRAW.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Winner {
    /// Game still running.
    None,
    /// Player one won.
    PlayerOne,
    /// Player two won.
    PlayerTwo,
    /// Board filled with no winner.
    Draw,
}

impl Winner {
    /// Numeric code used on the wire. Draw and none both encode as 0;
    /// observers disambiguate with the game-over flag.
    pub fn code(self) -> u8 {
        match self {
            Winner::None | Winner::Draw => 0,
            Winner::PlayerOne => 1,
            Winner::PlayerTwo => 2,
        }
    }
}

impl From<Disc> for Winner {
    fn from(disc: Disc) -> Self {
        match disc {
            Disc::PlayerOne => Winner::PlayerOne,
            Disc::PlayerTwo => Winner::PlayerTwo,
        }
    }
}

/// Result of a successfully applied move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum MoveOutcome {
    /// Disc placed, turn passed to the opponent.
    #[strum(to_string = "OK")]
    Continue,
    /// Disc placed and completed four in a row.
    Win,
    /// Disc placed and filled the board.
    Draw,
}

impl MoveOutcome {
    /// Returns true when the move ended the game.
    pub fn is_terminal(self) -> bool {
        !matches!(self, MoveOutcome::Continue)
    }
}

/// Rule violations. The game is left unchanged when one is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum MoveError {
    /// The game is already over.
    #[display("Game already finished")]
    GameAlreadyOver,
    /// The acting seat is not the side to move.
    #[display("Not your turn")]
    NotYourTurn,
    /// Column outside 0..=6.
    #[display("Invalid column")]
    InvalidColumn,
    /// Column has no empty cell left.
    #[display("Column full")]
    ColumnFull,
}

/// Connect Four game engine.
///
/// [`Game::apply_move`] and [`Game::forfeit`] are the only mutators; board,
/// turn and status are read-only from the outside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    board: Board,
    turn: Disc,
    status: GameStatus,
    moves: usize,
}

impl Game {
    /// Creates a new game with player one to move.
    #[instrument]
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            turn: Disc::PlayerOne,
            status: GameStatus::InProgress,
            moves: 0,
        }
    }

    /// Returns the board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the side to move. Frozen once the game is over.
    pub fn turn(&self) -> Disc {
        self.turn
    }

    /// Returns the game status.
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Number of discs placed so far.
    pub fn moves(&self) -> usize {
        self.moves
    }

    /// Returns true once the game has ended.
    pub fn is_over(&self) -> bool {
        self.status != GameStatus::InProgress
    }

    /// Returns the observer-facing winner.
    pub fn winner(&self) -> Winner {
        match self.status {
            GameStatus::InProgress => Winner::None,
            GameStatus::Won(disc) => disc.into(),
            GameStatus::Draw => Winner::Draw,
        }
    }

    /// Drops a disc for `acting` into `column`.
    ///
    /// Checks run in a fixed order: game over, turn, column range, column
    /// capacity.
    ///
    /// # Errors
    ///
    /// Returns the first [`MoveError`] that applies; the game is unchanged.
    #[instrument(skip(self), fields(turn = %self.turn, moves = self.moves))]
    pub fn apply_move(&mut self, column: i64, acting: Disc) -> Result<MoveOutcome, MoveError> {
        if self.is_over() {
            return Err(MoveError::GameAlreadyOver);
        }

        if acting != self.turn {
            return Err(MoveError::NotYourTurn);
        }

        let column = usize::try_from(column)
            .ok()
            .filter(|&c| c < COLS)
            .ok_or(MoveError::InvalidColumn)?;

        if !self.board.drop_disc(column, acting) {
            return Err(MoveError::ColumnFull);
        }
        self.moves += 1;

        if check_win(&self.board, acting) {
            self.status = GameStatus::Won(acting);
            debug!(column, winner = %acting, "Move completed four in a row");
            return Ok(MoveOutcome::Win);
        }

        if is_full(&self.board) {
            self.status = GameStatus::Draw;
            debug!(column, "Board full, game drawn");
            return Ok(MoveOutcome::Draw);
        }

        self.turn = acting.opponent();
        Ok(MoveOutcome::Continue)
    }

    /// Ends the game in favour of the opponent of `forfeiting`.
    ///
    /// Returns `false` without touching anything if the game is already over.
    #[instrument(skip(self))]
    pub fn forfeit(&mut self, forfeiting: Disc) -> bool {
        if self.is_over() {
            return false;
        }
        self.status = GameStatus::Won(forfeiting.opponent());
        true
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}
