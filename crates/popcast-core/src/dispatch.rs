//! Command dispatcher: entry type → presenter command.

use serde::{Deserialize, Serialize};

use crate::targeting::matches;
use crate::types::{AgentId, Entry, EntryId, EntryType, ToastContent};

/// Request to show one new toast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnRequest {
    pub origin: EntryId,
    pub content: ToastContent,
    pub persistent: bool,
}

/// Dispatch result delivered across the worker→overlay boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    Spawn(SpawnRequest),
    KillAlerts,
    /// Recognized but without renderer behavior.
    Reserved { entry_type: EntryType },
}

impl Command {
    /// Whether the overlay has anything to do with this command.
    pub fn is_actionable(&self) -> bool {
        !matches!(self, Self::Reserved { .. })
    }
}

/// Map an entry to its command, regardless of addressing.
pub fn dispatch(entry: &Entry) -> Command {
    match entry.entry_type {
        EntryType::Broadcast => Command::Spawn(SpawnRequest {
            origin: entry.id.clone(),
            content: ToastContent::from_entry(entry),
            persistent: false,
        }),
        EntryType::Persistent => Command::Spawn(SpawnRequest {
            origin: entry.id.clone(),
            content: ToastContent::from_entry(entry),
            persistent: true,
        }),
        EntryType::KillAlerts => Command::KillAlerts,
        entry_type @ (EntryType::LockInput | EntryType::UnlockInput) => {
            Command::Reserved { entry_type }
        }
    }
}

/// Resolve and dispatch in one step. `None` when the entry is not addressed
/// to `agent`.
pub fn route(entry: &Entry, agent: &AgentId) -> Option<Command> {
    matches(&entry.targets, agent).then(|| dispatch(entry))
}
