//! In-process log for tests and single-process loopback.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use popcast_core::{AgentId, AgentStatus, Entry, EntryId};

use crate::error::LogError;
use crate::store::{BroadcastLog, StatusSink, sequential_id};

#[derive(Default)]
struct State {
    entries: Vec<Entry>,
    statuses: BTreeMap<AgentId, AgentStatus>,
    unreachable: bool,
    fetches: usize,
}

#[derive(Default)]
pub struct MemoryLog {
    state: Mutex<State>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Simulate a network outage: every call fails until cleared.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.lock().unreachable = unreachable;
    }

    pub fn status_of(&self, agent: &AgentId) -> Option<AgentStatus> {
        self.lock().statuses.get(agent).copied()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `fetch_latest` calls served, including failed ones.
    pub fn fetch_count(&self) -> usize {
        self.lock().fetches
    }

    fn check(state: &State) -> Result<(), LogError> {
        if state.unreachable {
            return Err(LogError::Api {
                status: 503,
                message: "log unreachable".into(),
            });
        }
        Ok(())
    }
}

impl BroadcastLog for MemoryLog {
    async fn fetch_latest(&self) -> Result<Option<Entry>, LogError> {
        let mut state = self.lock();
        state.fetches += 1;
        Self::check(&state)?;
        Ok(state.entries.last().cloned())
    }

    async fn append(&self, mut entry: Entry) -> Result<Entry, LogError> {
        let mut state = self.lock();
        Self::check(&state)?;
        if entry.id.is_empty() {
            entry.id = EntryId::new(sequential_id(state.entries.len() + 1));
        }
        if entry.created_at == popcast_core::wire::epoch() {
            entry.created_at = Utc::now();
        }
        state.entries.push(entry.clone());
        Ok(entry)
    }
}

impl StatusSink for MemoryLog {
    async fn set_status(&self, agent: &AgentId, status: AgentStatus) -> Result<(), LogError> {
        let mut state = self.lock();
        Self::check(&state)?;
        state.statuses.insert(agent.clone(), status);
        Ok(())
    }
}
