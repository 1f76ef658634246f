//! Server assembly and lifecycle.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, instrument, warn};

use crate::config::ServerConfig;
use crate::db::ResultRepository;
use crate::service::GameService;
use crate::sink::{NullResultSink, ResultSink, SqliteResultSink};
use crate::transport::{AppState, router};

/// Opens the result store, starts background tasks and serves until Ctrl-C.
///
/// # Errors
///
/// Fails if the database cannot be opened or the address cannot be bound.
#[instrument(skip(config), fields(host = %config.host(), port = config.port()))]
pub async fn run(config: ServerConfig) -> Result<()> {
    let repository = match config.database_path() {
        Some(path) => Some(ResultRepository::new(path.clone())?),
        None => None,
    };
    let sink: Arc<dyn ResultSink> = match &repository {
        Some(repository) => Arc::new(SqliteResultSink::new(repository.clone())),
        None => Arc::new(NullResultSink),
    };

    let listener = tokio::net::TcpListener::bind((config.host().as_str(), *config.port())).await?;
    let service = GameService::new(config, sink);
    let sweeper = service.spawn_sweeper();
    let app = router(AppState::new(service, repository));

    info!(addr = %listener.local_addr()?, "Server ready");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
