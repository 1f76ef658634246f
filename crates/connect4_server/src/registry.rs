//! Session registry: matchmaking, bot fallback and lookups.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::session::{GameSession, Participant, SessionHandle, SessionId};

#[derive(Debug)]
struct Waiter {
    identity: String,
    ticket: u64,
    wake: oneshot::Sender<SessionHandle>,
    timer: Option<AbortHandle>,
}

impl Waiter {
    fn disarm(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    waiting: Option<Waiter>,
    next_ticket: u64,
    by_identity: HashMap<String, SessionHandle>,
    by_id: HashMap<SessionId, SessionHandle>,
}

impl RegistryState {
    fn index(&mut self, handle: &SessionHandle, identities: &[&str]) {
        for identity in identities {
            self.by_identity.insert(identity.to_string(), handle.clone());
        }
        self.by_id.insert(handle.id().clone(), handle.clone());
    }
}

/// Outcome of [`SessionRegistry::find_or_create_match`].
#[derive(Debug)]
pub enum MatchOutcome {
    /// The identity already plays in this running session.
    Existing(SessionHandle),
    /// Paired with the waiting player; the requester is player two.
    Matched(SessionHandle),
    /// Queued; the token resolves once paired.
    Waiting(WaitingToken),
}

/// Held by a queued client until a session is ready.
#[derive(Debug)]
pub struct WaitingToken {
    identity: String,
    ticket: u64,
    rx: oneshot::Receiver<SessionHandle>,
}

impl WaitingToken {
    /// Identity that is waiting.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Resolves with the session once paired, or `None` if the wait was
    /// superseded. Safe to use in `select!`.
    pub async fn recv(&mut self) -> Option<SessionHandle> {
        (&mut self.rx).await.ok()
    }

    /// Ticket of this wait; a later wait by the same identity gets a new one.
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    /// Returns the session if pairing already happened.
    pub fn try_matched(&mut self) -> Option<SessionHandle> {
        self.rx.try_recv().ok()
    }
}

/// Owner of every live session and of the waiting slot.
///
/// All bookkeeping happens under one lock. The registry lock is always taken
/// before a session lock.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pairs `identity` with the waiting player, or queues it.
    #[instrument(skip(self))]
    pub fn find_or_create_match(&self, identity: &str) -> MatchOutcome {
        let mut state = self.lock();

        if let Some(handle) = state.by_identity.get(identity)
            && !handle.is_over()
        {
            debug!(session_id = %handle.id(), "Identity already in a running game");
            return MatchOutcome::Existing(handle.clone());
        }

        if let Some(mut waiter) = state.waiting.take() {
            waiter.disarm();
            if waiter.identity != identity {
                let session = GameSession::new(
                    SessionId::generate(),
                    Participant::Human(waiter.identity.clone()),
                    Participant::Human(identity.to_string()),
                );
                let handle = SessionHandle::new(session);
                if waiter.wake.send(handle.clone()).is_ok() {
                    state.index(&handle, &[waiter.identity.as_str(), identity]);
                    info!(
                        session_id = %handle.id(),
                        player_one = %waiter.identity,
                        player_two = identity,
                        "Players matched"
                    );
                    return MatchOutcome::Matched(handle);
                }
                warn!(waiting = %waiter.identity, "Waiting player left before pairing");
            } else {
                debug!("Same identity queued again, replacing its wait");
            }
        }

        let (wake, rx) = oneshot::channel();
        state.next_ticket += 1;
        let ticket = state.next_ticket;
        state.waiting = Some(Waiter {
            identity: identity.to_string(),
            ticket,
            wake,
            timer: None,
        });
        info!(ticket, "Player waiting for opponent");
        MatchOutcome::Waiting(WaitingToken {
            identity: identity.to_string(),
            ticket,
            rx,
        })
    }

    /// Starts a timer that seats the bot against the client holding
    /// `token` after `delay`, if that same wait is still pending then.
    ///
    /// A wait has at most one armed timer; it is aborted when the wait ends.
    #[instrument(skip(self, token), fields(identity = token.identity(), ticket = token.ticket()))]
    pub fn schedule_bot_fallback(&self, token: &WaitingToken, delay: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        let identity = token.identity.clone();
        let ticket = token.ticket;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            registry.fire_bot_fallback(&identity, ticket);
        });

        let mut state = self.lock();
        match state.waiting.as_mut().filter(|w| w.ticket == ticket) {
            Some(waiter) => {
                waiter.disarm();
                waiter.timer = Some(task.abort_handle());
            }
            None => {
                debug!("Wait already over, bot timer not armed");
                task.abort();
            }
        }
        task
    }

    /// Seats the bot against `identity` if its wait `ticket` still holds the
    /// waiting slot.
    ///
    /// Returns the new session, or `None` when there is nothing to do.
    #[instrument(skip(self))]
    pub fn fire_bot_fallback(&self, identity: &str, ticket: u64) -> Option<SessionHandle> {
        let mut state = self.lock();
        if state
            .waiting
            .as_ref()
            .is_none_or(|w| w.identity != identity || w.ticket != ticket)
        {
            debug!("No longer waiting, bot not needed");
            return None;
        }
        let waiter = state.waiting.take()?;

        let session = GameSession::new(
            SessionId::generate(),
            Participant::Human(waiter.identity.clone()),
            Participant::Bot,
        );
        let handle = SessionHandle::new(session);
        if waiter.wake.send(handle.clone()).is_err() {
            warn!("Waiting player left before the bot joined");
            return None;
        }
        state.index(&handle, &[identity]);
        info!(session_id = %handle.id(), "Bot joined");
        Some(handle)
    }

    /// Clears the waiting slot if this token still holds it.
    #[instrument(skip(self, token), fields(identity = token.identity()))]
    pub fn cancel_waiting(&self, token: &WaitingToken) -> bool {
        let mut state = self.lock();
        let holds = state
            .waiting
            .as_ref()
            .is_some_and(|w| w.identity == token.identity && w.ticket == token.ticket);
        if holds && let Some(mut waiter) = state.waiting.take() {
            waiter.disarm();
            info!("Wait cancelled");
        }
        holds
    }

    /// Session with the given id.
    pub fn lookup_by_session_id(&self, id: &SessionId) -> Option<SessionHandle> {
        self.lock().by_id.get(id).cloned()
    }

    /// Most recent session of `identity`.
    pub fn lookup_by_identity(&self, identity: &str) -> Option<SessionHandle> {
        self.lock().by_identity.get(identity).cloned()
    }

    /// Identity currently in the waiting slot.
    pub fn waiting_identity(&self) -> Option<String> {
        self.lock().waiting.as_ref().map(|w| w.identity.clone())
    }

    /// Number of indexed sessions.
    pub fn session_count(&self) -> usize {
        self.lock().by_id.len()
    }

    /// Evicts sessions that finished more than `retention` before `now`.
    ///
    /// Identity entries are dropped only if they still point at an evicted
    /// session.
    #[instrument(skip(self))]
    pub fn sweep(&self, now: Instant, retention: Duration) -> Vec<SessionId> {
        let mut state = self.lock();
        let expired: Vec<SessionId> = state
            .by_id
            .iter()
            .filter(|(_, handle)| {
                handle.with(|s| {
                    s.finished_at()
                        .is_some_and(|at| now.saturating_duration_since(at) > retention)
                })
            })
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            state.by_id.remove(id);
        }
        state
            .by_identity
            .retain(|_, handle| !expired.contains(handle.id()));

        if !expired.is_empty() {
            info!(count = expired.len(), "Finished sessions evicted");
        }
        expired
    }
}
