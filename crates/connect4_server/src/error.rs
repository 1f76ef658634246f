//! Error types for the session engine.

use connect4_game::MoveError;
use derive_more::{Display, Error, From};
use tracing::instrument;

/// Errors reported back to a single participant. None of them change
/// session state.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, From)]
pub enum SessionError {
    /// A game rule rejected the move.
    #[display("{_0}")]
    #[from]
    Move(MoveError),
    /// Reconnection named a session the identity does not play in.
    #[display("Username doesn't match this game")]
    IdentityMismatch,
    /// The identity holds no seat in the session it addressed.
    #[display("{identity} is not playing in this game")]
    NotAParticipant {
        /// Identity that attempted the action.
        identity: String,
    },
}

/// Malformed inbound frame. The connection stays open.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum ProtocolError {
    /// Frame is not a JSON object.
    #[display("Invalid JSON")]
    InvalidJson,
    /// Move frame without an integral column.
    #[display("Invalid column")]
    InvalidColumn,
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}
