//! # lanchat-server
//!
//! LAN-local private messaging server.
//!
//! This binary provides:
//! - **WebSocket endpoint** (`/ws`) carrying the chat protocol: roster,
//!   direct text and file messages, receipts, typing pings, history
//! - **Chat hub**: one task owning the connection registry and the
//!   in-memory conversation store
//! - **Upload endpoint** (`/upload`) and serving of uploaded files
//! - **Static client** served from the public directory

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lanchat_server::api::{self, AppState};
use lanchat_server::config::ServerConfig;
use lanchat_server::hub::spawn_hub;
use lanchat_server::lan;
use lanchat_server::uploads::UploadStore;
use lanchat_shared::constants::APP_NAME;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,lanchat_server=debug")),
        )
        .init();

    info!("Starting {} server v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------
    let uploads = Arc::new(UploadStore::new(config.upload_dir.clone(), config.max_upload_size).await?);

    let (hub, hub_task) = spawn_hub(config.retention);

    let app_state = AppState {
        hub: hub.clone(),
        uploads,
        config: Arc::new(config.clone()),
        started_at: Utc::now(),
    };

    // -----------------------------------------------------------------------
    // 4. Bind and announce the LAN address
    // -----------------------------------------------------------------------
    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    let bound = listener.local_addr()?;
    let url = lan::lan_url(bound, lan::local_ipv4().await);
    info!(port = bound.port(), "Server listening");
    info!(%url, "Open this URL on any device on the same network");
    match lan::render_qr(&url) {
        Ok(qr) => info!("Scan to join:\n{}", qr),
        Err(e) => warn!(error = %e, "Failed to render QR code"),
    }

    // -----------------------------------------------------------------------
    // 5. Serve until Ctrl+C
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, listener) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    hub.shutdown().await.ok();
    hub_task.await.ok();

    Ok(())
}
