//! Game sessions: one match, its participants and their liveness.

use crate::error::SessionError;
use connect4_game::{Board, COLS, Disc, Game, MoveOutcome, ROWS, Winner, bot};
use derive_getters::Getters;
use derive_new::new;
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Display name of the automated opponent.
pub const BOT_NAME: &str = "BOT";

/// Opaque session identifier (16 hex digits).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, From, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generates a fresh random id.
    pub fn generate() -> Self {
        Self(format!("{:016x}", rand::random::<u64>()))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Occupant of a seat.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Participant {
    /// A connected client, keyed by its identity.
    Human(String),
    /// The automated opponent.
    Bot,
}

impl Participant {
    /// Name shown to clients and stored with results.
    pub fn name(&self) -> &str {
        match self {
            Participant::Human(identity) => identity,
            Participant::Bot => BOT_NAME,
        }
    }

    /// Returns true for the automated opponent.
    pub fn is_bot(&self) -> bool {
        matches!(self, Participant::Bot)
    }

    /// Returns true if this seat belongs to the human `identity`.
    pub fn is(&self, identity: &str) -> bool {
        matches!(self, Participant::Human(name) if name == identity)
    }
}

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Four in a row.
    #[display("win")]
    Win,
    /// Full board.
    #[display("draw")]
    Draw,
    /// A participant stayed disconnected past the grace period.
    #[display("forfeit")]
    Forfeit,
}

/// Connection bookkeeping for one human seat.
#[derive(Debug, Clone, Default, Getters)]
pub struct Liveness {
    connected: bool,
    last_seen: Option<Instant>,
    monitored: bool,
}

/// Result of a finished game, handed to the result sink once.
#[derive(Debug, Clone, PartialEq, Eq, Getters, new)]
pub struct GameResult {
    session_id: SessionId,
    player_one: String,
    player_two: String,
    winner: Winner,
    reason: EndReason,
}

/// Point-in-time view of a session for broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    game_id: SessionId,
    board: [[u8; COLS]; ROWS],
    turn: u8,
    game_over: bool,
    winner: u8,
    player1: String,
    player2: String,
}

/// Column the bot played and what it led to.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct BotMove {
    column: usize,
    outcome: MoveOutcome,
}

/// One match between two participants.
#[derive(Debug)]
pub struct GameSession {
    id: SessionId,
    player_one: Participant,
    player_two: Participant,
    game: Game,
    liveness: [Liveness; 2],
    end_reason: Option<EndReason>,
    finished_at: Option<Instant>,
    result_taken: bool,
}

impl GameSession {
    /// Creates a session with player one to move. Human seats start connected.
    #[instrument(fields(session_id = %id))]
    pub fn new(id: SessionId, player_one: Participant, player_two: Participant) -> Self {
        info!(
            player_one = player_one.name(),
            player_two = player_two.name(),
            "Creating game session"
        );
        let seat = |p: &Participant| Liveness {
            connected: !p.is_bot(),
            ..Liveness::default()
        };
        let liveness = [seat(&player_one), seat(&player_two)];
        Self {
            id,
            player_one,
            player_two,
            game: Game::new(),
            liveness,
            end_reason: None,
            finished_at: None,
            result_taken: false,
        }
    }

    /// Session id.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Underlying game state.
    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Board shortcut.
    pub fn board(&self) -> &Board {
        self.game.board()
    }

    /// Occupant of `disc`'s seat.
    pub fn participant(&self, disc: Disc) -> &Participant {
        match disc {
            Disc::PlayerOne => &self.player_one,
            Disc::PlayerTwo => &self.player_two,
        }
    }

    /// Seat held by the human `identity`, if any.
    pub fn seat_of(&self, identity: &str) -> Option<Disc> {
        if self.player_one.is(identity) {
            Some(Disc::PlayerOne)
        } else if self.player_two.is(identity) {
            Some(Disc::PlayerTwo)
        } else {
            None
        }
    }

    /// Occupant of the seat opposite `identity`.
    pub fn opponent_of(&self, identity: &str) -> Option<&Participant> {
        self.seat_of(identity)
            .map(|disc| self.participant(disc.opponent()))
    }

    /// Returns true once the game has ended.
    pub fn is_over(&self) -> bool {
        self.game.is_over()
    }

    /// Observer-facing winner.
    pub fn winner(&self) -> Winner {
        self.game.winner()
    }

    /// How the game ended, if it has.
    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    /// When the game ended, if it has.
    pub fn finished_at(&self) -> Option<Instant> {
        self.finished_at
    }

    /// Returns true when the game is running and the bot is to move.
    pub fn is_bot_turn(&self) -> bool {
        !self.is_over() && self.participant(self.game.turn()).is_bot()
    }

    /// Liveness of the human `identity`.
    pub fn liveness(&self, identity: &str) -> Option<&Liveness> {
        self.seat_of(identity).map(|disc| &self.liveness[seat_index(disc)])
    }

    fn liveness_mut(&mut self, identity: &str) -> Result<&mut Liveness, SessionError> {
        let disc = self.require_seat(identity)?;
        Ok(&mut self.liveness[seat_index(disc)])
    }

    fn require_seat(&self, identity: &str) -> Result<Disc, SessionError> {
        self.seat_of(identity)
            .ok_or_else(|| SessionError::NotAParticipant {
                identity: identity.to_string(),
            })
    }

    /// Applies a move on behalf of the human `identity`.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotAParticipant`] for strangers, otherwise the game's
    /// rule violation. State is unchanged on error.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn apply_move(&mut self, identity: &str, column: i64) -> Result<MoveOutcome, SessionError> {
        let disc = self.require_seat(identity)?;
        let outcome = self.game.apply_move(column, disc).map_err(|e| {
            warn!(identity, column, error = %e, "Move rejected");
            e
        })?;
        self.settle(outcome);
        debug!(identity, column, %outcome, "Move applied");
        Ok(outcome)
    }

    /// Lets the bot move if it holds the turn.
    ///
    /// Returns `None` when the game is over or a human is to move.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn apply_bot_move(&mut self) -> Option<BotMove> {
        if !self.is_bot_turn() {
            return None;
        }
        let disc = self.game.turn();
        let column = bot::pick_column(self.game.board(), disc);
        // The ladder only returns open columns while the game is running.
        let outcome = self.game.apply_move(column as i64, disc).ok()?;
        self.settle(outcome);
        debug!(column, %outcome, "Bot moved");
        Some(BotMove { column, outcome })
    }

    fn settle(&mut self, outcome: MoveOutcome) {
        let reason = match outcome {
            MoveOutcome::Continue => return,
            MoveOutcome::Win => EndReason::Win,
            MoveOutcome::Draw => EndReason::Draw,
        };
        self.end_reason = Some(reason);
        self.finished_at = Some(Instant::now());
        info!(session_id = %self.id, winner = %self.winner(), %reason, "Game over");
    }

    /// Ends the game in favour of the opponent of `identity`.
    ///
    /// Returns `Ok(false)` when the game was already over.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn forfeit(&mut self, identity: &str) -> Result<bool, SessionError> {
        let disc = self.require_seat(identity)?;
        if !self.game.forfeit(disc) {
            return Ok(false);
        }
        self.end_reason = Some(EndReason::Forfeit);
        self.finished_at = Some(Instant::now());
        info!(identity, winner = %self.winner(), "Game forfeited");
        Ok(true)
    }

    /// Records a dropped connection. The monitor counts the grace period
    /// from `now`.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn mark_disconnected(&mut self, identity: &str, now: Instant) -> Result<(), SessionError> {
        let liveness = self.liveness_mut(identity)?;
        liveness.connected = false;
        liveness.last_seen = Some(now);
        info!(identity, "Player disconnected, grace period started");
        Ok(())
    }

    /// Records a resumed connection and cancels any countdown.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn mark_reconnected(&mut self, identity: &str) -> Result<(), SessionError> {
        let liveness = self.liveness_mut(identity)?;
        liveness.connected = true;
        liveness.last_seen = None;
        info!(identity, "Player connected");
        Ok(())
    }

    /// Claims the liveness monitor slot for `identity`.
    ///
    /// Returns false if a monitor already runs for that seat.
    pub fn claim_monitor(&mut self, identity: &str) -> bool {
        match self.liveness_mut(identity) {
            Ok(liveness) if !liveness.monitored => {
                liveness.monitored = true;
                true
            }
            _ => false,
        }
    }

    /// Releases the liveness monitor slot for `identity`.
    pub fn release_monitor(&mut self, identity: &str) {
        if let Ok(liveness) = self.liveness_mut(identity) {
            liveness.monitored = false;
        }
    }

    /// Hands out the result the first time it is asked for after game over.
    pub fn take_result(&mut self) -> Option<GameResult> {
        if self.result_taken {
            return None;
        }
        let reason = self.end_reason?;
        self.result_taken = true;
        Some(GameResult {
            session_id: self.id.clone(),
            player_one: self.player_one.name().to_string(),
            player_two: self.player_two.name().to_string(),
            winner: self.winner(),
            reason,
        })
    }

    /// Snapshot for broadcast.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            game_id: self.id.clone(),
            board: self.game.board().to_codes(),
            turn: self.game.turn().code(),
            game_over: self.is_over(),
            winner: self.winner().code(),
            player1: self.player_one.name().to_string(),
            player2: self.player_two.name().to_string(),
        }
    }
}

fn seat_index(disc: Disc) -> usize {
    match disc {
        Disc::PlayerOne => 0,
        Disc::PlayerTwo => 1,
    }
}

/// Shared handle to a session.
///
/// Every access locks the session for one synchronous closure, so no guard
/// survives an `.await`.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: SessionId,
    inner: Arc<Mutex<GameSession>>,
}

impl SessionHandle {
    /// Wraps a new session.
    pub fn new(session: GameSession) -> Self {
        Self {
            id: session.id().clone(),
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Session id, readable without locking.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    fn lock(&self) -> MutexGuard<'_, GameSession> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` with shared access to the session.
    pub fn with<R>(&self, f: impl FnOnce(&GameSession) -> R) -> R {
        f(&self.lock())
    }

    /// Runs `f` with exclusive access to the session.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut GameSession) -> R) -> R {
        f(&mut self.lock())
    }

    /// Returns true once the game has ended.
    pub fn is_over(&self) -> bool {
        self.with(GameSession::is_over)
    }

    /// Snapshot for broadcast.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.with(GameSession::snapshot)
    }

    /// Returns true if both handles point at the same session.
    pub fn same_session(&self, other: &SessionHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connect4_game::MoveError;

    fn humans() -> GameSession {
        GameSession::new(
            SessionId::from("s1"),
            Participant::Human("alice".into()),
            Participant::Human("bob".into()),
        )
    }

    #[test]
    fn test_seats() {
        let session = humans();
        assert_eq!(session.seat_of("alice"), Some(Disc::PlayerOne));
        assert_eq!(session.seat_of("bob"), Some(Disc::PlayerTwo));
        assert_eq!(session.seat_of("carol"), None);
        assert_eq!(session.opponent_of("alice"), Some(&Participant::Human("bob".into())));
    }

    #[test]
    fn test_moves_alternate_by_identity() {
        let mut session = humans();
        assert_eq!(session.apply_move("alice", 3), Ok(MoveOutcome::Continue));
        assert_eq!(
            session.apply_move("alice", 3),
            Err(SessionError::Move(MoveError::NotYourTurn))
        );
        assert_eq!(session.apply_move("bob", 3), Ok(MoveOutcome::Continue));
        assert_eq!(session.snapshot().turn, 1);
    }

    #[test]
    fn test_stranger_cannot_move() {
        let mut session = humans();
        assert!(matches!(
            session.apply_move("mallory", 0),
            Err(SessionError::NotAParticipant { .. })
        ));
    }

    #[test]
    fn test_forfeit_by_player_one() {
        let mut session = humans();
        assert_eq!(session.forfeit("alice"), Ok(true));
        assert_eq!(session.winner(), Winner::PlayerTwo);
        assert_eq!(session.end_reason(), Some(EndReason::Forfeit));
        let before = session.snapshot();
        assert_eq!(session.forfeit("alice"), Ok(false));
        assert_eq!(session.forfeit("bob"), Ok(false));
        assert_eq!(session.snapshot(), before);
    }

    #[tokio::test]
    async fn test_liveness_markers() {
        let mut session = humans();
        assert!(session.liveness("alice").is_some_and(|l| *l.connected()));
        let now = Instant::now();
        session.mark_disconnected("alice", now).expect("seat");
        let liveness = session.liveness("alice").expect("seat");
        assert!(!*liveness.connected());
        assert_eq!(*liveness.last_seen(), Some(now));
        session.mark_reconnected("alice").expect("seat");
        let liveness = session.liveness("alice").expect("seat");
        assert!(*liveness.connected());
        assert!(liveness.last_seen().is_none());
    }

    #[test]
    fn test_monitor_claim_is_exclusive() {
        let mut session = humans();
        assert!(session.claim_monitor("bob"));
        assert!(!session.claim_monitor("bob"));
        session.release_monitor("bob");
        assert!(session.claim_monitor("bob"));
        assert!(!session.claim_monitor("nobody"));
    }

    #[tokio::test]
    async fn test_result_taken_once() {
        let mut session = humans();
        assert!(session.take_result().is_none());
        session.forfeit("bob").expect("seat");
        let result = session.take_result().expect("finished");
        assert_eq!(*result.winner(), Winner::PlayerOne);
        assert_eq!(result.player_one(), "alice");
        assert_eq!(*result.reason(), EndReason::Forfeit);
        assert!(session.take_result().is_none());
    }

    #[tokio::test]
    async fn test_result_carries_win_reason() {
        let mut session = humans();
        for _ in 0..3 {
            session.apply_move("alice", 0).expect("legal");
            session.apply_move("bob", 1).expect("legal");
        }
        session.apply_move("alice", 0).expect("winning move");
        let result = session.take_result().expect("finished");
        assert_eq!(*result.reason(), EndReason::Win);
        assert_eq!(session.end_reason(), Some(EndReason::Win));
    }

    #[tokio::test]
    async fn test_bot_replies_only_on_its_turn() {
        let mut session = GameSession::new(
            SessionId::from("s2"),
            Participant::Human("alice".into()),
            Participant::Bot,
        );
        assert!(session.apply_bot_move().is_none());
        session.apply_move("alice", 0).expect("legal");
        let reply = session.apply_bot_move().expect("bot to move");
        assert_eq!(*reply.column(), 3);
        assert_eq!(session.game().turn(), Disc::PlayerOne);
        assert_eq!(session.snapshot().player2, BOT_NAME);
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let json = serde_json::to_value(humans().snapshot()).expect("serialize");
        assert_eq!(json["gameId"], "s1");
        assert_eq!(json["gameOver"], false);
        assert_eq!(json["turn"], 1);
        assert_eq!(json["board"][5][0], 0);
    }
}
