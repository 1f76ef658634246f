//! JSON frames exchanged with browser clients.

use connect4_game::{COLS, ROWS, Winner};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::ProtocolError;
use crate::session::{EndReason, GameResult, SessionId, SessionSnapshot};

/// Frame sent by a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Drop a disc in `column`.
    Move {
        /// Target column, validated by the game.
        column: i64,
    },
    /// Any other frame type. The server does not act on it.
    Ignored {
        /// The frame's `type`, if it had one.
        kind: Option<String>,
    },
}

impl ClientMessage {
    /// Decodes a text frame.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::InvalidJson`] for anything that is not a JSON object,
    /// [`ProtocolError::InvalidColumn`] for a move without an integer column.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(text).map_err(|_| ProtocolError::InvalidJson)?;
        let frame = value.as_object().ok_or(ProtocolError::InvalidJson)?;

        match frame.get("type").and_then(Value::as_str) {
            Some("move") => frame
                .get("column")
                .and_then(Value::as_i64)
                .map(|column| ClientMessage::Move { column })
                .ok_or(ProtocolError::InvalidColumn),
            kind => {
                debug!(kind, "Ignoring client frame");
                Ok(ClientMessage::Ignored {
                    kind: kind.map(str::to_string),
                })
            }
        }
    }
}

/// Frame sent to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Queued for an opponent.
    Waiting {
        /// Human-readable status.
        message: String,
    },
    /// A session was created for this client.
    GameStarted {
        /// Human-readable status.
        message: String,
        /// Opponent's name.
        opponent: String,
        /// Id to reconnect with.
        game_id: SessionId,
    },
    /// An existing session was resumed.
    Reconnected {
        /// Human-readable status.
        message: String,
        /// Resumed session.
        game_id: SessionId,
    },
    /// Current board and turn.
    State(SessionSnapshot),
    /// A request was rejected.
    Error {
        /// Reason shown to the player.
        error: String,
    },
    /// The game has ended.
    GameOver {
        /// 0 for a draw, else the winning seat.
        winner: u8,
        /// Winner's name or `"draw"`.
        result: String,
        /// Final board.
        board: [[u8; COLS]; ROWS],
        /// How the game ended.
        reason: EndReason,
    },
}

impl ServerMessage {
    /// Waiting notice.
    pub fn waiting() -> Self {
        ServerMessage::Waiting {
            message: "Waiting for opponent...".to_string(),
        }
    }

    /// Game start notice.
    pub fn game_started(opponent: &str, game_id: &SessionId) -> Self {
        ServerMessage::GameStarted {
            message: format!("Game started against {}", opponent),
            opponent: opponent.to_string(),
            game_id: game_id.clone(),
        }
    }

    /// Resume notice.
    pub fn reconnected(game_id: &SessionId) -> Self {
        ServerMessage::Reconnected {
            message: "Reconnected to game".to_string(),
            game_id: game_id.clone(),
        }
    }

    /// Error notice.
    pub fn error(error: impl ToString) -> Self {
        ServerMessage::Error {
            error: error.to_string(),
        }
    }

    /// Game over notice for a finished game.
    pub fn game_over(result: &GameResult, board: [[u8; COLS]; ROWS]) -> Self {
        let name = match result.winner() {
            Winner::PlayerOne => result.player_one().as_str(),
            Winner::PlayerTwo => result.player_two().as_str(),
            Winner::None | Winner::Draw => "draw",
        };
        ServerMessage::GameOver {
            winner: result.winner().code(),
            result: name.to_string(),
            board,
            reason: *result.reason(),
        }
    }

    /// Encodes the frame as JSON text.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
