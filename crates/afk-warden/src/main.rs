//! # AFK Warden
//!
//! Keeps one automated occupant connected to a game server, re-establishes it
//! when lost, yields to human players, and rotates its identity over time.
//!
//! ## Architecture
//!
//! This is Layer 2 - the binary that ties together:
//! - afk-warden-core: Identity, events, configuration
//! - afk-warden-session: Session lifecycle supervisor
//! - afk-warden: Logging, health server, TCP connector

use std::path::Path;

use afk_warden::{health, logging, Args, TcpConnector};
use afk_warden_core::WardenConfig;
use afk_warden_session::{Greeting, NightSkip, Supervisor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse(std::env::args().skip(1))?;

    let config = WardenConfig::from_file(&args.config).map_err(|e| {
        anyhow::anyhow!("failed to load config {}: {}", args.config.display(), e)
    })?;

    // Initialize logging
    let _log_guard = logging::init(Path::new(&config.log_file))?;

    tracing::info!(
        "AFK Warden v{} starting, config {}",
        env!("CARGO_PKG_VERSION"),
        args.config.display()
    );

    // Bind before starting the supervisor so a taken port fails startup
    let listener = health::bind(health::port_from_env()?).await?;
    tokio::spawn(async move {
        if let Err(e) = health::serve(listener).await {
            tracing::error!("Health server stopped: {}", e);
        }
    });

    let (host, port) = config.server_address();
    tracing::info!("Target server {}:{}", host, port);
    let connector = TcpConnector::new(host, port, config.supervisor.connect_timeout());

    let mut supervisor = Supervisor::new(config.name.clone(), config.supervisor.clone(), connector)
        .with_behavior(Greeting::default());
    if config.auto_night_skip {
        tracing::info!("Auto night skip enabled");
        supervisor = supervisor.with_behavior(NightSkip::new());
    }

    supervisor
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    tracing::info!("AFK Warden shut down");

    Ok(())
}
