use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::Method,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use lanchat_shared::constants::UPLOADS_URL_PREFIX;
use lanchat_shared::FileRef;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::hub::HubHandle;
use crate::uploads::UploadStore;
use crate::ws::ws_handler;

/// Slack on top of the upload limit for multipart framing.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub hub: HubHandle,
    pub uploads: Arc<UploadStore>,
    pub config: Arc<ServerConfig>,
    pub started_at: DateTime<Utc>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let body_limit = state.uploads.max_size() + MULTIPART_OVERHEAD;
    let uploads_dir = ServeDir::new(state.uploads.base_path());
    let public_dir = ServeDir::new(&state.config.public_dir);

    Router::new()
        .route("/health", get(health_check))
        .route("/info", get(server_info))
        .route("/ws", get(ws_handler))
        .route("/upload", post(upload))
        .nest_service(UPLOADS_URL_PREFIX, uploads_dir)
        .fallback_service(public_dir)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct ServerInfoResponse {
    version: &'static str,
    started_at: DateTime<Utc>,
    connections: usize,
    named: usize,
    conversations: usize,
    messages: usize,
    max_upload_size: usize,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn server_info(State(state): State<AppState>) -> Result<Json<ServerInfoResponse>, ServerError> {
    let stats = state.hub.stats().await?;

    Ok(Json(ServerInfoResponse {
        version: env!("CARGO_PKG_VERSION"),
        started_at: state.started_at,
        connections: stats.connections,
        named: stats.named,
        conversations: stats.conversations,
        messages: stats.messages,
        max_upload_size: state.uploads.max_size(),
    }))
}

/// POST /upload with a multipart `file` field. Returns `{url, name}`.
async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<FileRef>, ServerError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let client_name = field.file_name().unwrap_or("").to_string();
        let data = field.bytes().await?;

        let file = state.uploads.store(&client_name, &data).await?;

        info!(url = %file.url, name = %file.name, size = data.len(), "File uploaded");

        return Ok(Json(file));
    }

    Err(ServerError::BadRequest(
        "Missing 'file' field in multipart form".to_string(),
    ))
}

pub async fn serve(
    state: AppState,
    listener: tokio::net::TcpListener,
) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %listener.local_addr()?, "Starting HTTP server");

    axum::serve(listener, app).await?;

    Ok(())
}
