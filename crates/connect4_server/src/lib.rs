//! Real-time Connect Four server.
//!
//! Players connect over WebSocket and are paired first come, first served.
//! A player left alone is matched against a bot after a delay. Dropped
//! players may reconnect within a grace period before their game is
//! forfeited. Finished games are stored in SQLite.
//!
//! # Architecture
//!
//! - **Session**: one match and its participants' liveness
//! - **Registry**: matchmaking, bot fallback, lookups and eviction
//! - **Liveness**: per-seat disconnect monitor
//! - **Service**: the facade connections talk to
//! - **Transport**: axum routes and the WebSocket protocol
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use connect4_server::{Connection, GameService, NullResultSink, ServerConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let service = GameService::new(ServerConfig::default(), Arc::new(NullResultSink));
//! if let Connection::Waiting(mut token) = service.on_connect("alice", None)? {
//!     let session = token.recv().await;
//!     assert!(session.is_some());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod db;
mod error;
mod hub;
mod liveness;
mod protocol;
mod registry;
mod server;
mod service;
mod session;
mod sink;
mod transport;

pub mod cli;

pub use config::ServerConfig;
pub use db::{DbError, GameResultRow, LeaderboardEntry, NewGameResult, ResultRepository};
pub use error::{ConfigError, ProtocolError, SessionError};
pub use hub::ConnectionHub;
pub use liveness::{ForfeitHook, LivenessMonitor, LivenessPolicy, Verdict, assess};
pub use protocol::{ClientMessage, ServerMessage};
pub use registry::{MatchOutcome, SessionRegistry, WaitingToken};
pub use server::run;
pub use service::{BotReply, Connection, GameService, MoveReport};
pub use session::{
    BOT_NAME, BotMove, EndReason, GameResult, GameSession, Liveness, Participant, SessionHandle,
    SessionId, SessionSnapshot,
};
pub use sink::{NullResultSink, ResultSink, SqliteResultSink};
pub use transport::{AppState, ConnectParams, resolve_identity, router};
