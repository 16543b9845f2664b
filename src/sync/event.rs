//! Sync event wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of task mutation a node is announcing. Unknown kinds deserialize
/// to [`SyncEventKind::Unknown`] so a newer node never breaks an older
/// one; the receiver logs and drops them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncEventKind {
    Added,
    Updated,
    Removed,
    Cleared,
    #[serde(other)]
    Unknown,
}

impl SyncEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncEventKind::Added => "added",
            SyncEventKind::Updated => "updated",
            SyncEventKind::Removed => "removed",
            SyncEventKind::Cleared => "cleared",
            SyncEventKind::Unknown => "unknown",
        }
    }
}

/// One task-mutation notification. Created by the mutating node, consumed
/// read-only by every other node, never mutated after publication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncEvent {
    #[serde(rename = "type")]
    pub kind: SyncEventKind,
    pub session_id: String,
    /// Identity of the publishing node; stamped by the channel on publish.
    pub node_id: String,
    /// Opaque task-shaped data; the channel does not interpret it.
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl SyncEvent {
    /// Build an event for the given mutation. `node_id` and `timestamp`
    /// are placeholders until the channel stamps them on publish.
    pub fn new(kind: SyncEventKind, session_id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            kind,
            session_id: session_id.into(),
            node_id: String::new(),
            payload,
            timestamp: Utc::now(),
        }
    }
}
