//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use connect4_server::{
    Connection, DbError, GameResult, GameService, ResultSink, ServerConfig, SessionHandle,
    WaitingToken,
};

/// Sink that keeps every result in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    results: Mutex<Vec<GameResult>>,
}

impl MemorySink {
    pub fn results(&self) -> Vec<GameResult> {
        self.results.lock().expect("sink lock").clone()
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn record_result(&self, result: &GameResult) -> Result<(), DbError> {
        self.results.lock().expect("sink lock").push(result.clone());
        Ok(())
    }
}

/// Sink that always fails.
#[derive(Debug, Default)]
pub struct FailingSink;

#[async_trait]
impl ResultSink for FailingSink {
    async fn record_result(&self, _result: &GameResult) -> Result<(), DbError> {
        Err(DbError::new("disk full"))
    }
}

pub fn service_with(config: ServerConfig) -> (GameService, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::default());
    (GameService::new(config, sink.clone()), sink)
}

pub fn service() -> (GameService, Arc<MemorySink>) {
    service_with(ServerConfig::default())
}

pub fn expect_waiting(connection: Connection) -> WaitingToken {
    match connection {
        Connection::Waiting(token) => token,
        other => panic!("expected to wait, got {:?}", other),
    }
}

pub fn expect_matched(connection: Connection) -> SessionHandle {
    match connection {
        Connection::Matched(handle) => handle,
        other => panic!("expected a match, got {:?}", other),
    }
}

pub fn expect_resumed(connection: Connection) -> SessionHandle {
    match connection {
        Connection::Resumed(handle) => handle,
        other => panic!("expected to resume, got {:?}", other),
    }
}
