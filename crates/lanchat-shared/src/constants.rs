/// Application name
pub const APP_NAME: &str = "lanchat";

/// Display name used until a connection registers one
pub const DEFAULT_DISPLAY_NAME: &str = "Anonymous";

/// Length of the random base-36 tail of a message id
pub const MESSAGE_ID_SUFFIX_LEN: usize = 9;

/// Default HTTP port (server)
pub const DEFAULT_HTTP_PORT: u16 = 5000;

/// Maximum upload size in bytes (50 MiB)
pub const MAX_UPLOAD_SIZE: usize = 50 * 1024 * 1024;

/// Maximum inbound WebSocket frame size in bytes (256 KiB)
pub const MAX_FRAME_SIZE: usize = 262_144;

/// Outbound events buffered per session before new ones are dropped
pub const DEFAULT_SESSION_QUEUE: usize = 256;

/// URL prefix under which uploaded files are served
pub const UPLOADS_URL_PREFIX: &str = "/uploads";
