// Types and wire protocol shared by the lanchat server and its clients.

pub mod constants;
pub mod error;
pub mod protocol;
pub mod types;

pub use error::ProtocolError;
pub use protocol::{
    ClientEvent, FileRef, HistoryReply, Message, MessageBody, MessageStatus, Receipt, Roster,
    ServerEvent, StatusUpdate,
};
pub use types::{ConnectionId, MessageId};
