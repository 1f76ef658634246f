//! HTTP and WebSocket front end.

use axum::{
    Json, Router,
    extract::{
        Query, Request, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderValue, Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use futures::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use serde::Deserialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tower::ServiceBuilder;
use tracing::{debug, info, instrument, warn};

use crate::db::{LeaderboardEntry, ResultRepository};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::registry::WaitingToken;
use crate::service::{Connection, GameService};
use crate::session::{BOT_NAME, SessionHandle};

/// Shared state of the HTTP handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    service: GameService,
    results: Option<ResultRepository>,
}

impl AppState {
    /// Bundles the game service with the optional result store.
    pub fn new(service: GameService, results: Option<ResultRepository>) -> Self {
        Self { service, results }
    }
}

/// Query string of `/ws`.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    username: Option<String>,
    #[serde(rename = "gameId")]
    game_id: Option<String>,
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/leaderboard", get(leaderboard))
        .route("/health", get(health))
        .layer(middleware::from_fn(cors))
        .layer(ServiceBuilder::new().map_request(|req: Request| {
            info!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
            req
        }))
        .with_state(state)
}

async fn cors(req: Request, next: Next) -> Response {
    let mut response = if req.method() == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        next.run(req).await
    };
    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    response
}

async fn health() -> &'static str {
    "ok"
}

async fn leaderboard(
    State(state): State<AppState>,
) -> Result<Json<Vec<LeaderboardEntry>>, (StatusCode, String)> {
    let Some(repository) = state.results else {
        return Ok(Json(Vec::new()));
    };
    let entries = tokio::task::spawn_blocking(move || repository.leaderboard(None))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| {
            warn!(error = %e, "Leaderboard query failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch leaderboard".to_string())
        })?;
    Ok(Json(entries))
}

/// Picks the identity for a connection; blank or reserved names get a guest id.
pub fn resolve_identity(username: Option<&str>) -> String {
    match username.map(str::trim) {
        Some(name) if !name.is_empty() && name != BOT_NAME => name.to_string(),
        _ => format!("guest-{:06x}", rand::random::<u32>() & 0xff_ffff),
    }
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<AppState>,
) -> Response {
    let identity = resolve_identity(params.username.as_deref());
    let game_id = params.game_id.filter(|id| !id.is_empty());
    ws.on_upgrade(move |socket| handle_socket(socket, state.service, identity, game_id))
}

#[instrument(skip(socket, service))]
async fn handle_socket(
    socket: WebSocket,
    service: GameService,
    identity: String,
    game_id: Option<String>,
) {
    info!("Client connected");
    let (sink, mut stream) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_frames(sink, rx));

    if let Some(handle) = place(&service, &identity, game_id.as_deref(), &tx, &mut stream).await {
        play(&service, &handle, &identity, &tx, &mut stream).await;
    }

    drop(tx);
    if let Err(e) = writer.await {
        warn!(error = %e, "Writer task failed");
    }
    info!("Client disconnected");
}

async fn write_frames(
    mut sink: SplitSink<WebSocket, Message>,
    mut rx: UnboundedReceiver<ServerMessage>,
) {
    while let Some(message) = rx.recv().await {
        let text = match message.to_json() {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Failed to encode frame");
                continue;
            }
        };
        if sink.send(Message::Text(text.into())).await.is_err() {
            debug!("Socket closed while sending");
            return;
        }
    }
    if let Err(e) = sink.close().await {
        debug!(error = %e, "Socket close failed");
    }
}

/// Resolves the client's session, waiting for an opponent if needed.
async fn place(
    service: &GameService,
    identity: &str,
    game_id: Option<&str>,
    tx: &UnboundedSender<ServerMessage>,
    stream: &mut SplitStream<WebSocket>,
) -> Option<SessionHandle> {
    let handle = match service.on_connect(identity, game_id) {
        Err(e) => {
            let _ = tx.send(ServerMessage::error(&e));
            return None;
        }
        Ok(Connection::Resumed(handle)) => {
            let _ = tx.send(ServerMessage::reconnected(handle.id()));
            return Some(handle);
        }
        Ok(Connection::Matched(handle)) => handle,
        Ok(Connection::Waiting(mut token)) => {
            let _ = tx.send(ServerMessage::waiting());
            match wait_for_match(&mut token, stream, tx).await {
                Some(handle) => handle,
                None => {
                    service.abandon_wait(token);
                    return None;
                }
            }
        }
    };

    let opponent = handle
        .with(|s| s.opponent_of(identity).map(|p| p.name().to_string()))
        .unwrap_or_default();
    let _ = tx.send(ServerMessage::game_started(&opponent, handle.id()));
    Some(handle)
}

async fn wait_for_match(
    token: &mut WaitingToken,
    stream: &mut SplitStream<WebSocket>,
    tx: &UnboundedSender<ServerMessage>,
) -> Option<SessionHandle> {
    loop {
        tokio::select! {
            matched = token.recv() => return matched,
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if let Err(e) = ClientMessage::parse(text.as_str()) {
                        let _ = tx.send(ServerMessage::error(e));
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return None,
                Some(Ok(_)) => {}
            },
        }
    }
}

/// Runs the move loop until the socket closes.
async fn play(
    service: &GameService,
    handle: &SessionHandle,
    identity: &str,
    tx: &UnboundedSender<ServerMessage>,
    stream: &mut SplitStream<WebSocket>,
) {
    let connection = match service.attach(handle, identity, tx.clone()) {
        Ok(connection) => connection,
        Err(e) => {
            let _ = tx.send(ServerMessage::error(&e));
            return;
        }
    };
    // Snapshot under the session lock so later broadcasts cannot overtake it.
    handle.with(|s| tx.send(ServerMessage::State(s.snapshot())).ok());

    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                debug!(error = %e, "Socket error");
                break;
            }
        };
        match ClientMessage::parse(text.as_str()) {
            Ok(ClientMessage::Move { column }) => {
                if let Err(e) = service.on_message(handle, identity, column).await {
                    let _ = tx.send(ServerMessage::error(&e));
                }
            }
            Ok(ClientMessage::Ignored { .. }) => {}
            Err(e) => {
                let _ = tx.send(ServerMessage::error(e));
            }
        }
    }

    service.on_disconnect(handle, identity, connection);
}
