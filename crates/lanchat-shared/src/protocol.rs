use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::MAX_FRAME_SIZE;
use crate::error::ProtocolError;
use crate::types::{ConnectionId, MessageId};

/// Live mapping of connection id to display name
pub type Roster = BTreeMap<ConnectionId, String>;

/// Events a client sends to the server.
///
/// On the wire every event is a JSON text frame of the form
/// `{"event": "<name>", "data": <payload>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    /// Set or overwrite the display name
    #[serde(rename = "setName")]
    SetName(Option<String>),

    /// Direct text message
    #[serde(rename = "private.message")]
    SendText {
        to: ConnectionId,
        #[serde(default)]
        text: String,
    },

    /// Direct message carrying an uploaded file reference
    #[serde(rename = "private.file")]
    SendFile { to: ConnectionId, file: FileRef },

    /// Recipient reports that a message reached it
    #[serde(rename = "message.delivered")]
    Delivered(Receipt),

    /// Recipient reports that a message was displayed
    #[serde(rename = "message.read")]
    Read(Receipt),

    /// Ask for the full history with another connection
    #[serde(rename = "getHistory")]
    GetHistory(ConnectionId),

    /// Typing ping addressed to one connection
    #[serde(rename = "typing")]
    Typing(ConnectionId),
}

/// Events the server pushes to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// First frame of every session: the id the server assigned
    #[serde(rename = "welcome")]
    Welcome { id: ConnectionId },

    /// Full roster snapshot
    #[serde(rename = "userList")]
    UserList(Roster),

    #[serde(rename = "private.message")]
    PrivateMessage(Message),

    #[serde(rename = "private.file")]
    PrivateFile(Message),

    #[serde(rename = "chatHistory")]
    ChatHistory(HistoryReply),

    #[serde(rename = "message.status")]
    MessageStatus(StatusUpdate),

    /// Carries the id of the connection that is typing
    #[serde(rename = "typing")]
    Typing(ConnectionId),
}

/// A direct message as stored and delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub from: ConnectionId,
    /// Sender's display name at send time
    pub from_name: String,
    #[serde(flatten)]
    pub body: MessageBody,
    /// Creation time, milliseconds since the Unix epoch
    pub ts: i64,
    pub to: ConnectionId,
    pub status: MessageStatus,
}

/// Text XOR file: a message never carries both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageBody {
    Text { text: String },
    File { file: FileRef },
}

/// Reference to a file previously posted to the upload endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Sent,
    Delivered,
    Read,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub msg_id: MessageId,
    /// Original sender the status update is routed back to
    pub from: ConnectionId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryReply {
    pub with: ConnectionId,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub msg_id: MessageId,
    pub status: MessageStatus,
}

impl Message {
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            MessageBody::Text { text } => Some(text),
            MessageBody::File { .. } => None,
        }
    }

    pub fn file(&self) -> Option<&FileRef> {
        match &self.body {
            MessageBody::File { file } => Some(file),
            MessageBody::Text { .. } => None,
        }
    }
}

impl ClientEvent {
    /// Decode a JSON text frame
    pub fn from_text(frame: &str) -> Result<Self, ProtocolError> {
        if frame.len() > MAX_FRAME_SIZE {
            return Err(ProtocolError::FrameTooLarge {
                size: frame.len(),
                max: MAX_FRAME_SIZE,
            });
        }
        Ok(serde_json::from_str(frame)?)
    }

    pub fn to_text(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Wire name of the event, for logging
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::SetName(_) => "setName",
            ClientEvent::SendText { .. } => "private.message",
            ClientEvent::SendFile { .. } => "private.file",
            ClientEvent::Delivered(_) => "message.delivered",
            ClientEvent::Read(_) => "message.read",
            ClientEvent::GetHistory(_) => "getHistory",
            ClientEvent::Typing(_) => "typing",
        }
    }
}

impl ServerEvent {
    /// Wrap a message in the event variant matching its body
    pub fn message(msg: Message) -> Self {
        match msg.body {
            MessageBody::Text { .. } => ServerEvent::PrivateMessage(msg),
            MessageBody::File { .. } => ServerEvent::PrivateFile(msg),
        }
    }

    pub fn to_text(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_text(frame: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(frame)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_message(body: MessageBody) -> Message {
        Message {
            id: MessageId("1700000000000-abc123xyz".into()),
            from: ConnectionId::from("alice"),
            from_name: "Alice".into(),
            body,
            ts: 1_700_000_000_000,
            to: ConnectionId::from("bob"),
            status: MessageStatus::Sent,
        }
    }

    #[test]
    fn test_decode_client_frames() {
        let ev = ClientEvent::from_text(r#"{"event":"setName","data":"Alice"}"#).unwrap();
        assert_eq!(ev, ClientEvent::SetName(Some("Alice".into())));

        let ev = ClientEvent::from_text(
            r#"{"event":"private.message","data":{"to":"bob","text":"hi"}}"#,
        )
        .unwrap();
        assert_eq!(
            ev,
            ClientEvent::SendText {
                to: ConnectionId::from("bob"),
                text: "hi".into()
            }
        );

        let ev = ClientEvent::from_text(
            r#"{"event":"message.read","data":{"msgId":"1-a","from":"alice"}}"#,
        )
        .unwrap();
        assert_eq!(
            ev,
            ClientEvent::Read(Receipt {
                msg_id: MessageId("1-a".into()),
                from: ConnectionId::from("alice"),
            })
        );

        let ev = ClientEvent::from_text(r#"{"event":"typing","data":"bob"}"#).unwrap();
        assert_eq!(ev, ClientEvent::Typing(ConnectionId::from("bob")));
    }

    #[test]
    fn test_set_name_accepts_null() {
        let ev = ClientEvent::from_text(r#"{"event":"setName","data":null}"#).unwrap();
        assert_eq!(ev, ClientEvent::SetName(None));
    }

    #[test]
    fn test_missing_text_defaults_to_empty() {
        let ev =
            ClientEvent::from_text(r#"{"event":"private.message","data":{"to":"bob"}}"#).unwrap();
        assert_eq!(
            ev,
            ClientEvent::SendText {
                to: ConnectionId::from("bob"),
                text: String::new()
            }
        );
    }

    #[test]
    fn test_unknown_event_rejected() {
        let err = ClientEvent::from_text(r#"{"event":"joinRoom","data":"x"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed(_)));
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let frame = "x".repeat(MAX_FRAME_SIZE + 1);
        let err = ClientEvent::from_text(&frame).unwrap_err();
        assert!(matches!(err, ProtocolError::FrameTooLarge { .. }));
    }

    #[test]
    fn test_text_message_wire_shape() {
        let msg = sample_message(MessageBody::Text { text: "hello".into() });
        let value = serde_json::to_value(ServerEvent::message(msg)).unwrap();
        assert_eq!(
            value,
            json!({
                "event": "private.message",
                "data": {
                    "id": "1700000000000-abc123xyz",
                    "from": "alice",
                    "fromName": "Alice",
                    "text": "hello",
                    "ts": 1_700_000_000_000i64,
                    "to": "bob",
                    "status": "sent"
                }
            })
        );
    }

    #[test]
    fn test_file_message_uses_file_event() {
        let msg = sample_message(MessageBody::File {
            file: FileRef {
                name: "cat.png".into(),
                url: "/uploads/abc".into(),
            },
        });
        let ev = ServerEvent::message(msg);
        let text = ev.to_text().unwrap();
        assert!(text.contains(r#""event":"private.file""#));
        assert!(!text.contains(r#""text""#));

        match ServerEvent::from_text(&text).unwrap() {
            ServerEvent::PrivateFile(m) => {
                assert_eq!(m.file().map(|f| f.url.as_str()), Some("/uploads/abc"));
                assert!(m.text().is_none());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_roster_serializes_as_object() {
        let mut roster = Roster::new();
        roster.insert(ConnectionId::from("a"), "Alice".into());
        let value = serde_json::to_value(ServerEvent::UserList(roster)).unwrap();
        assert_eq!(value, json!({"event": "userList", "data": {"a": "Alice"}}));
    }

    #[test]
    fn test_status_ordering() {
        assert!(MessageStatus::Sent < MessageStatus::Delivered);
        assert!(MessageStatus::Delivered < MessageStatus::Read);
    }
}
