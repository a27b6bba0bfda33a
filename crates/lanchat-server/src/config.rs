//! Server configuration loaded from environment variables.
//!
//! All settings have defaults so the server starts with zero configuration
//! on a LAN.

use std::net::SocketAddr;
use std::path::PathBuf;

use lanchat_shared::constants::{DEFAULT_HTTP_PORT, DEFAULT_SESSION_QUEUE, MAX_UPLOAD_SIZE};

use crate::conversations::RetentionPolicy;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP and WebSocket server.
    /// Env: `HTTP_ADDR`, or `PORT` to change only the port.
    /// Default: `0.0.0.0:5000`
    pub http_addr: SocketAddr,

    /// Directory holding the browser client (index.html, script.js, ...).
    /// Env: `PUBLIC_DIR`
    /// Default: `./public`
    pub public_dir: PathBuf,

    /// Directory uploaded files are written to.
    /// Env: `UPLOAD_DIR`
    /// Default: `./uploads`
    pub upload_dir: PathBuf,

    /// Maximum upload size in bytes.
    /// Env: `MAX_UPLOAD_SIZE`
    /// Default: 50 MiB
    pub max_upload_size: usize,

    /// Outbound events buffered per session before new ones are dropped.
    /// Env: `SESSION_QUEUE`
    /// Default: `256`
    pub session_queue: usize,

    /// Per-conversation history cap.
    /// Env: `HISTORY_LIMIT` (`0` or unset = keep everything)
    pub retention: RetentionPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            public_dir: PathBuf::from("./public"),
            upload_dir: PathBuf::from("./uploads"),
            max_upload_size: MAX_UPLOAD_SIZE,
            session_queue: DEFAULT_SESSION_QUEUE,
            retention: RetentionPolicy::Unbounded,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(port) = lookup("PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) => config.http_addr.set_port(port),
                Err(_) => tracing::warn!(value = %port, "Invalid PORT, using default"),
            }
        }

        if let Some(addr) = lookup("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(
                    value = %addr,
                    "Invalid HTTP_ADDR, using default"
                );
            }
        }

        if let Some(path) = lookup("PUBLIC_DIR") {
            config.public_dir = PathBuf::from(path);
        }

        if let Some(path) = lookup("UPLOAD_DIR") {
            config.upload_dir = PathBuf::from(path);
        }

        if let Some(val) = lookup("MAX_UPLOAD_SIZE") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.max_upload_size = n,
                _ => tracing::warn!(value = %val, "Invalid MAX_UPLOAD_SIZE, using default"),
            }
        }

        if let Some(val) = lookup("SESSION_QUEUE") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.session_queue = n,
                _ => tracing::warn!(value = %val, "Invalid SESSION_QUEUE, using default"),
            }
        }

        if let Some(val) = lookup("HISTORY_LIMIT") {
            match val.parse::<usize>() {
                Ok(n) => config.retention = RetentionPolicy::from_limit(n),
                Err(_) => tracing::warn!(value = %val, "Invalid HISTORY_LIMIT, keeping full history"),
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter.

        config
    }
}
