//! Message router: the per-connection protocol state machine.
//!
//! Inbound events are validated and enriched here (id, timestamp, sender
//! name, status), stored in the [`ConversationStore`], and delivered through
//! a [`Transport`]. The router is driven from a single task, so it never
//! needs locks and append order always equals arrival order.

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use lanchat_shared::{
    ClientEvent, ConnectionId, FileRef, HistoryReply, Message, MessageBody, MessageId,
    MessageStatus, Receipt, ServerEvent, StatusUpdate,
};

use crate::conversations::ConversationStore;
use crate::registry::ConnectionRegistry;
use crate::transport::Transport;

/// Lifecycle of a live connection. A closed connection has no entry at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unnamed,
    Named,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RouterStats {
    pub connections: usize,
    pub named: usize,
    pub conversations: usize,
    pub messages: usize,
}

pub struct MessageRouter<T> {
    transport: T,
    registry: ConnectionRegistry,
    conversations: ConversationStore,
    sessions: HashMap<ConnectionId, SessionState>,
}

impl<T: Transport> MessageRouter<T> {
    pub fn new(transport: T, registry: ConnectionRegistry, conversations: ConversationStore) -> Self {
        Self {
            transport,
            registry,
            conversations,
            sessions: HashMap::new(),
        }
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn session_state(&self, id: &ConnectionId) -> Option<SessionState> {
        self.sessions.get(id).copied()
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    pub fn stats(&self) -> RouterStats {
        RouterStats {
            connections: self.sessions.len(),
            named: self.registry.len(),
            conversations: self.conversations.conversation_count(),
            messages: self.conversations.message_count(),
        }
    }

    /// A new session opened. It learns its own id and the current roster.
    pub fn connect(&mut self, id: ConnectionId) {
        info!(conn = %id, "Connected");
        self.sessions.insert(id.clone(), SessionState::Unnamed);
        self.transport
            .emit(&id, ServerEvent::Welcome { id: id.clone() });
        self.transport
            .emit(&id, ServerEvent::UserList(self.registry.snapshot()));
    }

    /// A session closed. Everyone left gets the updated roster once.
    pub fn disconnect(&mut self, id: &ConnectionId) {
        if self.sessions.remove(id).is_none() {
            return;
        }
        info!(conn = %id, "Disconnected");
        self.registry.remove(id);
        self.broadcast_roster();
    }

    pub fn handle(&mut self, from: &ConnectionId, event: ClientEvent) {
        if !self.sessions.contains_key(from) {
            debug!(conn = %from, event = event.name(), "Ignoring event from closed session");
            return;
        }

        match event {
            ClientEvent::SetName(name) => self.register_name(from, name.as_deref()),
            ClientEvent::SendText { to, text } => self.send_text(from, &to, text),
            ClientEvent::SendFile { to, file } => self.send_file(from, &to, file),
            ClientEvent::Delivered(receipt) => {
                self.relay_status(from, receipt, MessageStatus::Delivered)
            }
            ClientEvent::Read(receipt) => self.relay_status(from, receipt, MessageStatus::Read),
            ClientEvent::GetHistory(other) => self.reply_history(from, other),
            ClientEvent::Typing(to) => self.relay_typing(from, &to),
        }
    }

    fn register_name(&mut self, id: &ConnectionId, name: Option<&str>) {
        let stored = self.registry.register(id.clone(), name);
        info!(conn = %id, name = %stored, "Display name set");
        self.sessions.insert(id.clone(), SessionState::Named);
        self.broadcast_roster();
    }

    fn broadcast_roster(&mut self) {
        let roster = self.registry.snapshot();
        self.transport.broadcast(ServerEvent::UserList(roster));
    }

    fn send_text(&mut self, from: &ConnectionId, to: &ConnectionId, text: String) {
        if text.trim().is_empty() {
            debug!(conn = %from, "Ignoring empty text message");
            return;
        }
        self.deliver(from, to, MessageBody::Text { text });
    }

    fn send_file(&mut self, from: &ConnectionId, to: &ConnectionId, file: FileRef) {
        if file.url.trim().is_empty() {
            debug!(conn = %from, "Ignoring file message without url");
            return;
        }
        self.deliver(from, to, MessageBody::File { file });
    }

    /// Store a new message, push it to the recipient if live, echo it to the
    /// sender. The echo carries the canonical id the sender needs to match
    /// later receipts.
    fn deliver(&mut self, from: &ConnectionId, to: &ConnectionId, body: MessageBody) {
        let ts = Utc::now().timestamp_millis();
        let message = Message {
            id: MessageId::generate(ts),
            from: from.clone(),
            from_name: self.registry.sender_name(from),
            body,
            ts,
            to: to.clone(),
            status: MessageStatus::Sent,
        };

        self.conversations.append(from, to, message.clone());

        let delivered = from != to && self.transport.emit(to, ServerEvent::message(message.clone()));
        debug!(
            msg = %message.id,
            from = %from,
            to = %to,
            delivered,
            "Routed message"
        );

        self.transport.emit(from, ServerEvent::message(message));
    }

    fn relay_status(&mut self, reporter: &ConnectionId, receipt: Receipt, status: MessageStatus) {
        debug!(
            msg = %receipt.msg_id,
            reporter = %reporter,
            sender = %receipt.from,
            status = ?status,
            "Relaying receipt"
        );
        let update = StatusUpdate {
            msg_id: receipt.msg_id,
            status,
        };
        self.transport
            .emit(&receipt.from, ServerEvent::MessageStatus(update));
    }

    fn reply_history(&mut self, requester: &ConnectionId, other: ConnectionId) {
        let messages = self.conversations.history(requester, &other).to_vec();
        debug!(conn = %requester, with = %other, count = messages.len(), "History requested");
        self.transport.emit(
            requester,
            ServerEvent::ChatHistory(HistoryReply {
                with: other,
                messages,
            }),
        );
    }

    fn relay_typing(&mut self, from: &ConnectionId, to: &ConnectionId) {
        self.transport.emit(to, ServerEvent::Typing(from.clone()));
    }
}
