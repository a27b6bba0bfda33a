use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::MESSAGE_ID_SUFFIX_LEN;

// Connection identity = opaque per-session token, never reused
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct ConnectionId(pub String);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Message identifier: creation time in milliseconds, a dash, then a short
/// random base-36 suffix. Unique enough without a shared counter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn generate(timestamp_ms: i64) -> Self {
        const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

        let mut rng = rand::thread_rng();
        let suffix: String = (0..MESSAGE_ID_SUFFIX_LEN)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect();

        Self(format!("{timestamp_ms}-{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_ids_are_unique() {
        let a = ConnectionId::generate();
        let b = ConnectionId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn test_message_id_shape() {
        let id = MessageId::generate(1_700_000_000_000);
        let (prefix, suffix) = id.as_str().split_once('-').unwrap();
        assert_eq!(prefix, "1700000000000");
        assert_eq!(suffix.len(), MESSAGE_ID_SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_message_ids_differ_within_same_millisecond() {
        let a = MessageId::generate(42);
        let b = MessageId::generate(42);
        assert_ne!(a, b);
    }
}
