//! Outbound side of the duplex transport.
//!
//! The router never touches sockets. It addresses connections by id through
//! the [`Transport`] trait; [`SessionTable`] implements it on top of one
//! bounded queue per WebSocket session. Delivery is best-effort and
//! at-most-once: an event for an unknown id or a full queue is dropped.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::debug;

use lanchat_shared::{ConnectionId, ServerEvent};

pub trait Transport {
    /// Deliver to one live connection. Returns `false` if the event was dropped.
    fn emit(&mut self, to: &ConnectionId, event: ServerEvent) -> bool;

    /// Deliver to every live connection.
    fn broadcast(&mut self, event: ServerEvent);
}

/// Live sessions and their outbound queues.
#[derive(Debug, Default)]
pub struct SessionTable {
    outboxes: HashMap<ConnectionId, mpsc::Sender<ServerEvent>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, id: ConnectionId, outbox: mpsc::Sender<ServerEvent>) {
        self.outboxes.insert(id, outbox);
    }

    pub fn detach(&mut self, id: &ConnectionId) -> bool {
        self.outboxes.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.outboxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outboxes.is_empty()
    }
}

impl Transport for SessionTable {
    fn emit(&mut self, to: &ConnectionId, event: ServerEvent) -> bool {
        let Some(outbox) = self.outboxes.get(to) else {
            debug!(conn = %to, "Dropping event for disconnected session");
            return false;
        };

        match outbox.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!(conn = %to, "Dropping event for slow session");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(conn = %to, "Dropping event for closing session");
                false
            }
        }
    }

    fn broadcast(&mut self, event: ServerEvent) {
        for (id, outbox) in &self.outboxes {
            if outbox.try_send(event.clone()).is_err() {
                debug!(conn = %id, "Dropping broadcast for slow session");
            }
        }
    }
}
