//! WebSocket rendezvous relay: hands out peer identities and forwards
//! signaling messages between them.

mod relay_config;
mod relay_service;
mod ws_handler;

pub use relay_config::{DEFAULT_BIND, RelayConfig};
pub use relay_service::{RegisterError, RelayService};
pub use ws_handler::ws_handler;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tracing::info;

pub fn router(service: RelayService, path: &str) -> Router {
    Router::new()
        .route(path, get(ws_handler))
        .with_state(service)
}

/// Binds `config.bind` and serves until the process stops.
pub async fn serve(config: RelayConfig) -> Result<()> {
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind relay to {}", config.bind))?;
    serve_listener(listener, RelayService::new(), &config.path).await
}

pub async fn serve_listener(listener: TcpListener, service: RelayService, path: &str) -> Result<()> {
    let addr = listener.local_addr().context("Listener has no address")?;
    info!("Relay listening on ws://{}{}", addr, path);
    axum::serve(listener, router(service, path))
        .await
        .context("Relay server stopped")
}
