//! Connection-facing facade over the registry, sessions and result sink.

use std::sync::Arc;
use std::time::Duration;

use connect4_game::MoveOutcome;
use derive_getters::Getters;
use derive_new::new;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::{debug, info, instrument, warn};

use crate::config::ServerConfig;
use crate::error::SessionError;
use crate::hub::ConnectionHub;
use crate::liveness::{ForfeitHook, LivenessMonitor, LivenessPolicy};
use crate::protocol::ServerMessage;
use crate::registry::{MatchOutcome, SessionRegistry, WaitingToken};
use crate::session::{GameSession, SessionHandle, SessionId, SessionSnapshot};
use crate::sink::ResultSink;

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// How a connecting client was placed.
#[derive(Debug)]
pub enum Connection {
    /// Back in a session it already plays in.
    Resumed(SessionHandle),
    /// Paired with the waiting player.
    Matched(SessionHandle),
    /// Queued for an opponent.
    Waiting(WaitingToken),
}

/// The bot's answer to a move.
#[derive(Debug, Clone, PartialEq, Eq, Getters, new)]
pub struct BotReply {
    column: usize,
    outcome: MoveOutcome,
    snapshot: SessionSnapshot,
}

/// Result of a player's move.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct MoveReport {
    outcome: MoveOutcome,
    snapshot: SessionSnapshot,
    bot_reply: Option<BotReply>,
}

/// Game service shared by all connections.
#[derive(Debug, Clone)]
pub struct GameService {
    registry: SessionRegistry,
    hub: ConnectionHub,
    sink: Arc<dyn ResultSink>,
    config: Arc<ServerConfig>,
}

impl GameService {
    /// Creates a service with empty registry and hub.
    pub fn new(config: ServerConfig, sink: Arc<dyn ResultSink>) -> Self {
        Self {
            registry: SessionRegistry::new(),
            hub: ConnectionHub::new(),
            sink,
            config: Arc::new(config),
        }
    }

    /// Session registry.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Connection hub.
    pub fn hub(&self) -> &ConnectionHub {
        &self.hub
    }

    /// Active configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    fn policy(&self) -> LivenessPolicy {
        LivenessPolicy::new(
            self.config.poll_interval().max(MIN_PERIOD),
            self.config.grace_period(),
        )
    }

    /// Places a connecting client.
    ///
    /// A known `game_id` resumes that session; an unknown one falls through
    /// to matchmaking.
    ///
    /// # Errors
    ///
    /// [`SessionError::IdentityMismatch`] if the session does not list
    /// `identity`.
    #[instrument(skip(self))]
    pub fn on_connect(
        &self,
        identity: &str,
        game_id: Option<&str>,
    ) -> Result<Connection, SessionError> {
        if let Some(id) = game_id.filter(|id| !id.is_empty()) {
            match self.registry.lookup_by_session_id(&SessionId::from(id)) {
                Some(handle) => {
                    if handle.with(|s| s.seat_of(identity).is_none()) {
                        warn!("Reconnect attempt for a game the identity does not play");
                        return Err(SessionError::IdentityMismatch);
                    }
                    self.on_reconnect(&handle, identity)?;
                    return Ok(Connection::Resumed(handle));
                }
                None => debug!("Unknown game id, matching instead"),
            }
        }

        match self.registry.find_or_create_match(identity) {
            MatchOutcome::Existing(handle) => {
                self.on_reconnect(&handle, identity)?;
                Ok(Connection::Resumed(handle))
            }
            MatchOutcome::Matched(handle) => Ok(Connection::Matched(handle)),
            MatchOutcome::Waiting(token) => {
                self.registry
                    .schedule_bot_fallback(&token, self.config.bot_join_delay());
                Ok(Connection::Waiting(token))
            }
        }
    }

    /// Registers a client's outbound channel and starts watching its seat.
    ///
    /// Returns the connection id to hand back to [`Self::on_disconnect`].
    #[instrument(skip(self, handle, outbound), fields(session_id = %handle.id()))]
    pub fn attach(
        &self,
        handle: &SessionHandle,
        identity: &str,
        outbound: UnboundedSender<ServerMessage>,
    ) -> Result<u64, SessionError> {
        handle.with_mut(|s| s.mark_reconnected(identity))?;
        let connection = self.hub.attach(handle.id(), identity, outbound);
        self.watch(handle, identity);
        Ok(connection)
    }

    fn watch(&self, handle: &SessionHandle, identity: &str) {
        LivenessMonitor::spawn(
            handle.clone(),
            identity.to_string(),
            self.policy(),
            Arc::new(self.clone()),
        );
    }

    /// Applies a player's move, broadcasts the new state and lets the bot
    /// answer when it is the opponent.
    ///
    /// # Errors
    ///
    /// Rule violations and unknown identities; the session is unchanged.
    #[instrument(skip(self, handle), fields(session_id = %handle.id()))]
    pub async fn on_message(
        &self,
        handle: &SessionHandle,
        identity: &str,
        column: i64,
    ) -> Result<MoveReport, SessionError> {
        let (outcome, snapshot) = handle.with_mut(|s| {
            s.apply_move(identity, column)
                .map(|outcome| (outcome, s.snapshot()))
        })?;
        self.hub
            .broadcast(handle.id(), &ServerMessage::State(snapshot.clone()));

        if outcome.is_terminal() {
            self.finish(handle);
            return Ok(MoveReport {
                outcome,
                snapshot,
                bot_reply: None,
            });
        }

        let bot_reply = self.play_bot_turn(handle).await;
        Ok(MoveReport {
            outcome,
            snapshot,
            bot_reply,
        })
    }

    /// Plays the bot's move after the configured pause if it holds the turn.
    pub async fn play_bot_turn(&self, handle: &SessionHandle) -> Option<BotReply> {
        if !handle.with(GameSession::is_bot_turn) {
            return None;
        }
        tokio::time::sleep(self.config.bot_move_delay()).await;

        let (bot_move, snapshot) =
            handle.with_mut(|s| s.apply_bot_move().map(|m| (m, s.snapshot())))?;
        self.hub
            .broadcast(handle.id(), &ServerMessage::State(snapshot.clone()));
        if bot_move.outcome().is_terminal() {
            self.finish(handle);
        }
        Some(BotReply::new(*bot_move.column(), *bot_move.outcome(), snapshot))
    }

    /// Announces a finished game and hands its result to the sink.
    ///
    /// Does nothing after the first call for a session. The returned task
    /// completes once the sink has been called.
    #[instrument(skip(self, handle), fields(session_id = %handle.id()))]
    pub fn finish(&self, handle: &SessionHandle) -> Option<JoinHandle<()>> {
        let (result, board) =
            handle.with_mut(|s| s.take_result().map(|r| (r, s.board().to_codes())))?;
        let delivered = self
            .hub
            .broadcast(handle.id(), &ServerMessage::game_over(&result, board));
        info!(
            winner = %result.winner(),
            reason = %result.reason(),
            delivered,
            "Game finished"
        );

        let sink = Arc::clone(&self.sink);
        Some(tokio::spawn(async move {
            if let Err(e) = sink.record_result(&result).await {
                warn!(session_id = %result.session_id(), error = %e, "Failed to save game result");
            }
        }))
    }

    /// Handles a closed socket. Stale connections are ignored.
    #[instrument(skip(self, handle), fields(session_id = %handle.id()))]
    pub fn on_disconnect(&self, handle: &SessionHandle, identity: &str, connection: u64) {
        if !self.hub.detach(handle.id(), identity, connection) {
            return;
        }
        if let Err(e) = handle.with_mut(|s| s.mark_disconnected(identity, Instant::now())) {
            warn!(error = %e, "Disconnect for unknown seat");
            return;
        }
        self.watch(handle, identity);
    }

    /// Marks `identity` as back in `handle`'s session.
    #[instrument(skip(self, handle), fields(session_id = %handle.id()))]
    pub fn on_reconnect(&self, handle: &SessionHandle, identity: &str) -> Result<(), SessionError> {
        handle.with_mut(|s| s.mark_reconnected(identity))
    }

    /// Withdraws a queued client whose socket closed.
    ///
    /// If pairing won the race, the client is treated as disconnected from
    /// the new session instead.
    #[instrument(skip(self, token), fields(identity = token.identity()))]
    pub fn abandon_wait(&self, mut token: WaitingToken) {
        if self.registry.cancel_waiting(&token) {
            return;
        }
        let Some(handle) = token.try_matched() else {
            return;
        };
        let identity = token.identity();
        info!(session_id = %handle.id(), "Matched after leaving, grace period started");
        if handle
            .with_mut(|s| s.mark_disconnected(identity, Instant::now()))
            .is_ok()
        {
            self.watch(&handle, identity);
        }
    }

    /// Starts the periodic eviction of finished sessions.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            let period = service.config.sweep_interval().max(MIN_PERIOD);
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let evicted = service
                    .registry
                    .sweep(Instant::now(), service.config.finished_retention());
                for id in &evicted {
                    service.hub.remove_session(id);
                }
            }
        })
    }
}

impl ForfeitHook for GameService {
    fn on_forfeit(&self, handle: &SessionHandle, forfeiting: &str) {
        debug!(session_id = %handle.id(), forfeiting, "Announcing forfeit");
        self.finish(handle);
    }
}
