//! HTTP server entry point.

use dairy_core::DairyConfig;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::error::ServerError;
use crate::routes::create_router;
use crate::state::AppState;

/// Serve the API until ctrl-c.
pub async fn run(config: DairyConfig) -> Result<(), ServerError> {
    let bind = config.server.bind.clone();
    let state = AppState::new(config)?;
    let app = create_router(state);

    let listener = TcpListener::bind(&bind)
        .await
        .map_err(|e| ServerError::StartupFailed(format!("cannot bind {bind}: {e}")))?;
    tracing::info!(address = %bind, "Starting dairy admin API");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
