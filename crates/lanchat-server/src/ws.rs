//! WebSocket session glue.
//!
//! Each upgraded socket becomes one connection: it gets a fresh id, an
//! outbound queue registered with the hub, a writer task draining that
//! queue, and a reader loop decoding client frames into hub commands.
//! Malformed frames are logged and skipped; the session stays open.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use lanchat_shared::constants::MAX_FRAME_SIZE;
use lanchat_shared::{ClientEvent, ConnectionId, ServerEvent};

use crate::api::AppState;
use crate::hub::HubHandle;

/// GET /ws (WebSocket upgrade)
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let queue = state.config.session_queue;
    ws.max_message_size(MAX_FRAME_SIZE)
        .on_upgrade(move |socket| run_session(socket, state.hub, queue))
}

async fn run_session(socket: WebSocket, hub: HubHandle, queue: usize) {
    let id = ConnectionId::generate();
    let (outbox_tx, mut outbox_rx) = mpsc::channel::<ServerEvent>(queue);

    if let Err(e) = hub.connect(id.clone(), outbox_tx).await {
        warn!(conn = %id, error = %e, "Rejecting session");
        return;
    }

    let (mut sender, mut receiver) = socket.split();

    // Hub -> socket
    let writer_id = id.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = outbox_rx.recv().await {
            let frame = match event.to_text() {
                Ok(frame) => frame,
                Err(e) => {
                    warn!(conn = %writer_id, error = %e, "Failed to encode event");
                    continue;
                }
            };
            if sender.send(Message::Text(frame)).await.is_err() {
                debug!(conn = %writer_id, "Socket closed while writing");
                break;
            }
        }
        let _ = sender.close().await;
    });

    // Socket -> hub
    let reader_id = id.clone();
    let reader_hub = hub.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match ClientEvent::from_text(&text) {
                    Ok(event) => {
                        if reader_hub.dispatch(reader_id.clone(), event).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(conn = %reader_id, error = %e, "Failed to parse client frame");
                    }
                },
                Message::Binary(_) => {
                    warn!(conn = %reader_id, "Ignoring binary frame");
                }
                Message::Close(_) => break,
                // Pong is handled automatically by axum
                Message::Ping(_) | Message::Pong(_) => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    if let Err(e) = hub.disconnect(id.clone()).await {
        debug!(conn = %id, error = %e, "Hub gone before disconnect");
    }
}
