//! Health HTTP surface.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tracing::info;

/// Port used when `PORT` is unset.
pub const DEFAULT_HTTP_PORT: u16 = 8000;

/// Body served at `/`.
pub const INDEX_BODY: &str = "Bot has arrived";

/// Build the health router.
pub fn router() -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
}

async fn index() -> &'static str {
    INDEX_BODY
}

async fn healthz() -> &'static str {
    "OK"
}

/// Resolve the listen port from an optional `PORT` value.
pub fn port_from(value: Option<&str>) -> Result<u16> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid PORT value: {raw:?}")),
        None => Ok(DEFAULT_HTTP_PORT),
    }
}

/// Resolve the listen port from the `PORT` environment variable.
pub fn port_from_env() -> Result<u16> {
    port_from(std::env::var("PORT").ok().as_deref())
}

/// Bind the health listener on all interfaces.
pub async fn bind(port: u16) -> Result<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind health server on {addr}"))
}

/// Serve the health routes until the listener fails.
pub async fn serve(listener: TcpListener) -> Result<()> {
    info!("Health server listening on {}", listener.local_addr()?);
    axum::serve(listener, router()).await?;
    Ok(())
}
