//! Outbound channels of connected clients, grouped by session.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, instrument};

use crate::protocol::ServerMessage;
use crate::session::SessionId;

#[derive(Debug)]
struct Endpoint {
    connection: u64,
    outbound: UnboundedSender<ServerMessage>,
}

#[derive(Debug, Default)]
struct HubState {
    next_connection: u64,
    sessions: HashMap<SessionId, HashMap<String, Endpoint>>,
}

/// Routes server frames to the clients attached to a session.
///
/// Each identity has at most one live endpoint per session; attaching again
/// replaces the previous one.
#[derive(Debug, Clone, Default)]
pub struct ConnectionHub {
    state: Arc<Mutex<HubState>>,
}

impl ConnectionHub {
    /// Creates an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `outbound` for `identity` and returns its connection id.
    #[instrument(skip(self, outbound))]
    pub fn attach(
        &self,
        session: &SessionId,
        identity: &str,
        outbound: UnboundedSender<ServerMessage>,
    ) -> u64 {
        let mut state = self.lock();
        state.next_connection += 1;
        let connection = state.next_connection;
        let replaced = state
            .sessions
            .entry(session.clone())
            .or_default()
            .insert(identity.to_string(), Endpoint { connection, outbound });
        debug!(connection, replaced = replaced.is_some(), "Connection attached");
        connection
    }

    /// Removes the endpoint if `connection` is still the current one.
    ///
    /// Returns false when a newer connection has taken over.
    #[instrument(skip(self))]
    pub fn detach(&self, session: &SessionId, identity: &str, connection: u64) -> bool {
        let mut state = self.lock();
        let Some(endpoints) = state.sessions.get_mut(session) else {
            return false;
        };
        if endpoints.get(identity).is_none_or(|e| e.connection != connection) {
            debug!("Superseded connection closed");
            return false;
        }
        endpoints.remove(identity);
        if endpoints.is_empty() {
            state.sessions.remove(session);
        }
        true
    }

    /// Sends to every participant attached to `session`. Returns how many
    /// received it.
    ///
    /// Endpoints with a closed channel stay registered until their
    /// connection detaches, so the close is still reported as a disconnect.
    pub fn broadcast(&self, session: &SessionId, message: &ServerMessage) -> usize {
        let state = self.lock();
        let Some(endpoints) = state.sessions.get(session) else {
            return 0;
        };
        endpoints
            .values()
            .filter(|endpoint| endpoint.outbound.send(message.clone()).is_ok())
            .count()
    }

    /// Forgets every endpoint of `session`.
    pub fn remove_session(&self, session: &SessionId) {
        self.lock().sessions.remove(session);
    }
}
