//! Connection registry.
//!
//! Maps live connection ids to the display name each client declared.
//! Names are self-declared and never verified. Every mutation is followed by
//! a full roster broadcast, which the router performs.

use std::collections::HashMap;

use tracing::debug;

use lanchat_shared::constants::DEFAULT_DISPLAY_NAME;
use lanchat_shared::{ConnectionId, Roster};

#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    names: HashMap<ConnectionId, String>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or overwrite the display name for a connection.
    ///
    /// Absent or whitespace-only names become `"Anonymous"`. Returns the name
    /// that was stored.
    pub fn register(&mut self, id: ConnectionId, name: Option<&str>) -> &str {
        let name = normalize_name(name);
        debug!(conn = %id, name = %name, "Registering display name");

        let slot = self.names.entry(id).or_default();
        *slot = name;
        slot
    }

    /// Drop a connection. Returns `true` if it had registered a name.
    pub fn remove(&mut self, id: &ConnectionId) -> bool {
        self.names.remove(id).is_some()
    }

    pub fn display_name(&self, id: &ConnectionId) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    /// Name a message from `id` is stamped with.
    pub fn sender_name(&self, id: &ConnectionId) -> String {
        self.display_name(id)
            .unwrap_or(DEFAULT_DISPLAY_NAME)
            .to_string()
    }

    pub fn snapshot(&self) -> Roster {
        self.names
            .iter()
            .map(|(id, name)| (id.clone(), name.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn normalize_name(name: Option<&str>) -> String {
    match name.map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => trimmed.to_string(),
        _ => DEFAULT_DISPLAY_NAME.to_string(),
    }
}
