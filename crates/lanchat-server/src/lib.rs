// LAN chat server: session registry, pair conversations and message routing
// over WebSocket, plus the upload and static-file endpoints around them.

pub mod api;
pub mod config;
pub mod conversations;
pub mod error;
pub mod hub;
pub mod lan;
pub mod registry;
pub mod router;
pub mod transport;
pub mod uploads;
pub mod ws;

pub use api::{build_router, serve, AppState};
pub use config::ServerConfig;
pub use hub::{spawn_hub, HubHandle};
