//! In-memory conversation store.
//!
//! One append-only log per unordered pair of connection ids. Logs are
//! created on the first message between a pair and live for the whole
//! process; nothing is pruned when a participant disconnects.

use std::collections::HashMap;

use lanchat_shared::{ConnectionId, Message};

/// Direction-independent key for a pair of connections.
///
/// The two ids are stored sorted, so `ConversationKey::new(a, b)` and
/// `ConversationKey::new(b, a)` are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationKey(ConnectionId, ConnectionId);

impl ConversationKey {
    pub fn new(a: &ConnectionId, b: &ConnectionId) -> Self {
        if a <= b {
            Self(a.clone(), b.clone())
        } else {
            Self(b.clone(), a.clone())
        }
    }
}

impl std::fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.0, self.1)
    }
}

/// How much history each conversation keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetentionPolicy {
    /// Keep every message for the life of the process.
    #[default]
    Unbounded,
    /// Keep only the newest `n` messages per conversation.
    KeepLast(usize),
}

impl RetentionPolicy {
    /// `0` means unbounded.
    pub fn from_limit(limit: usize) -> Self {
        match limit {
            0 => Self::Unbounded,
            n => Self::KeepLast(n),
        }
    }
}

#[derive(Debug, Default)]
pub struct ConversationStore {
    logs: HashMap<ConversationKey, Vec<Message>>,
    retention: RetentionPolicy,
}

impl ConversationStore {
    pub fn new(retention: RetentionPolicy) -> Self {
        Self {
            logs: HashMap::new(),
            retention,
        }
    }

    pub fn key(a: &ConnectionId, b: &ConnectionId) -> ConversationKey {
        ConversationKey::new(a, b)
    }

    pub fn append(&mut self, a: &ConnectionId, b: &ConnectionId, message: Message) {
        let log = self.logs.entry(ConversationKey::new(a, b)).or_default();
        log.push(message);

        if let RetentionPolicy::KeepLast(limit) = self.retention {
            if log.len() > limit {
                let excess = log.len() - limit;
                log.drain(..excess);
            }
        }
    }

    /// Ordered log for the pair; empty when they have never exchanged messages.
    pub fn history(&self, a: &ConnectionId, b: &ConnectionId) -> &[Message] {
        self.logs
            .get(&ConversationKey::new(a, b))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn conversation_count(&self) -> usize {
        self.logs.len()
    }

    pub fn message_count(&self) -> usize {
        self.logs.values().map(Vec::len).sum()
    }

    pub fn retention(&self) -> RetentionPolicy {
        self.retention
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanchat_shared::{MessageBody, MessageId, MessageStatus};

    fn id(s: &str) -> ConnectionId {
        ConnectionId::from(s)
    }

    fn text_message(from: &str, to: &str, text: &str) -> Message {
        Message {
            id: MessageId::generate(0),
            from: id(from),
            from_name: from.to_uppercase(),
            body: MessageBody::Text { text: text.into() },
            ts: 0,
            to: id(to),
            status: MessageStatus::Sent,
        }
    }

    fn texts(log: &[Message]) -> Vec<&str> {
        log.iter().filter_map(Message::text).collect()
    }

    #[test]
    fn test_key_is_order_independent() {
        let a = id("zeta");
        let b = id("alpha");
        assert_eq!(ConversationStore::key(&a, &b), ConversationStore::key(&b, &a));
        assert_eq!(ConversationStore::key(&a, &b).to_string(), "alpha_zeta");
    }

    #[test]
    fn test_history_is_shared_by_both_sides() {
        let mut store = ConversationStore::default();
        let m = text_message("a", "b", "hello");
        store.append(&id("a"), &id("b"), m.clone());

        assert_eq!(store.history(&id("a"), &id("b")), &[m.clone()]);
        assert_eq!(store.history(&id("b"), &id("a")), &[m]);
        assert_eq!(store.conversation_count(), 1);
    }

    #[test]
    fn test_empty_history() {
        let store = ConversationStore::default();
        assert!(store.history(&id("a"), &id("b")).is_empty());
    }

    #[test]
    fn test_append_preserves_arrival_order() {
        let mut store = ConversationStore::default();
        store.append(&id("a"), &id("b"), text_message("a", "b", "1"));
        store.append(&id("b"), &id("a"), text_message("b", "a", "2"));
        store.append(&id("a"), &id("b"), text_message("a", "b", "3"));

        assert_eq!(texts(store.history(&id("b"), &id("a"))), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_pairs_are_isolated() {
        let mut store = ConversationStore::default();
        store.append(&id("a"), &id("b"), text_message("a", "b", "for b"));
        store.append(&id("a"), &id("c"), text_message("a", "c", "for c"));

        assert_eq!(texts(store.history(&id("a"), &id("b"))), vec!["for b"]);
        assert_eq!(texts(store.history(&id("c"), &id("a"))), vec!["for c"]);
        assert_eq!(store.message_count(), 2);
    }

    #[test]
    fn test_unbounded_never_truncates() {
        let mut store = ConversationStore::new(RetentionPolicy::Unbounded);
        for i in 0..500 {
            store.append(&id("a"), &id("b"), text_message("a", "b", &i.to_string()));
        }
        assert_eq!(store.history(&id("a"), &id("b")).len(), 500);
    }

    #[test]
    fn test_keep_last_drops_oldest() {
        let mut store = ConversationStore::new(RetentionPolicy::KeepLast(2));
        for text in ["1", "2", "3"] {
            store.append(&id("a"), &id("b"), text_message("a", "b", text));
        }
        assert_eq!(texts(store.history(&id("a"), &id("b"))), vec!["2", "3"]);
    }

    #[test]
    fn test_retention_from_limit() {
        assert_eq!(RetentionPolicy::from_limit(0), RetentionPolicy::Unbounded);
        assert_eq!(RetentionPolicy::from_limit(10), RetentionPolicy::KeepLast(10));
    }
}
