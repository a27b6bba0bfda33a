//! Chat hub: the single task that owns all mutable chat state.
//!
//! WebSocket sessions and HTTP handlers never share the registry or the
//! conversation store. They send [`HubCommand`]s into the hub task, which
//! applies them one at a time to its [`MessageRouter`]. Every mutation
//! therefore happens on one sequential timeline.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use lanchat_shared::{ClientEvent, ConnectionId, ServerEvent};

use crate::conversations::{ConversationStore, RetentionPolicy};
use crate::error::ServerError;
use crate::registry::ConnectionRegistry;
use crate::router::{MessageRouter, RouterStats};
use crate::transport::SessionTable;

/// Depth of the hub's inbound command queue.
const COMMAND_QUEUE: usize = 1024;

// ---------------------------------------------------------------------------
// Command types
// ---------------------------------------------------------------------------

/// Commands sent *into* the hub task.
#[derive(Debug)]
pub enum HubCommand {
    /// A session opened; `outbox` feeds its socket writer.
    Connect {
        id: ConnectionId,
        outbox: mpsc::Sender<ServerEvent>,
    },
    /// A decoded client event.
    Event {
        from: ConnectionId,
        event: ClientEvent,
    },
    /// A session closed.
    Disconnect { id: ConnectionId },
    /// Request a snapshot of hub counters.
    Stats(oneshot::Sender<RouterStats>),
    /// Stop the hub task.
    Shutdown,
}

/// Cloneable handle for talking to the hub task.
#[derive(Debug, Clone)]
pub struct HubHandle {
    cmd_tx: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    pub async fn connect(
        &self,
        id: ConnectionId,
        outbox: mpsc::Sender<ServerEvent>,
    ) -> Result<(), ServerError> {
        self.send(HubCommand::Connect { id, outbox }).await
    }

    pub async fn dispatch(&self, from: ConnectionId, event: ClientEvent) -> Result<(), ServerError> {
        self.send(HubCommand::Event { from, event }).await
    }

    pub async fn disconnect(&self, id: ConnectionId) -> Result<(), ServerError> {
        self.send(HubCommand::Disconnect { id }).await
    }

    pub async fn stats(&self) -> Result<RouterStats, ServerError> {
        let (tx, rx) = oneshot::channel();
        self.send(HubCommand::Stats(tx)).await?;
        rx.await.map_err(|_| ServerError::HubUnavailable)
    }

    pub async fn shutdown(&self) -> Result<(), ServerError> {
        self.send(HubCommand::Shutdown).await
    }

    async fn send(&self, cmd: HubCommand) -> Result<(), ServerError> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| ServerError::HubUnavailable)
    }
}

/// Spawn the hub in a background tokio task.
///
/// Returns the handle used by sessions and the task's join handle.
pub fn spawn_hub(retention: RetentionPolicy) -> (HubHandle, JoinHandle<()>) {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<HubCommand>(COMMAND_QUEUE);

    let mut router = MessageRouter::new(
        SessionTable::new(),
        ConnectionRegistry::new(),
        ConversationStore::new(retention),
    );

    info!(retention = ?retention, "Chat hub started");

    let task = tokio::spawn(async move {
        while let Some(cmd) = cmd_rx.recv().await {
            match cmd {
                HubCommand::Connect { id, outbox } => {
                    router.transport_mut().attach(id.clone(), outbox);
                    router.connect(id);
                }
                HubCommand::Event { from, event } => {
                    router.handle(&from, event);
                }
                HubCommand::Disconnect { id } => {
                    router.transport_mut().detach(&id);
                    router.disconnect(&id);
                }
                HubCommand::Stats(reply) => {
                    let _ = reply.send(router.stats());
                }
                HubCommand::Shutdown => {
                    info!("Chat hub shutting down");
                    break;
                }
            }
        }
        debug!("Chat hub task exited");
    });

    (HubHandle { cmd_tx }, task)
}
