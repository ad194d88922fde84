//! Latest-wins dedup cursor for the log head.
//!
//! Only the newest entry is ever inspected. Entries superseded between two
//! polls are never seen and never retried.

use crate::types::{Entry, EntryId};

/// Position of an agent session in the log.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum DedupCursor {
    /// No poll has completed yet. The first head seen is a baseline.
    #[default]
    Uninitialized,
    /// The log was empty when first observed.
    Empty,
    /// Id of the last head observed.
    At(EntryId),
}

/// Outcome of observing one log head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// First observation of the session; recorded, not dispatched.
    Baseline,
    /// Same head as last time, or still empty.
    Unchanged,
    /// A head the session has not seen; dispatch it.
    Novel,
}

impl DedupCursor {
    pub fn new() -> Self {
        Self::Uninitialized
    }

    pub fn last_id(&self) -> Option<&EntryId> {
        match self {
            Self::At(id) => Some(id),
            _ => None,
        }
    }

    /// Compare the current head against the cursor and advance it.
    pub fn observe(&mut self, head: Option<&Entry>) -> Observation {
        let Some(entry) = head else {
            // An append-only log never shrinks back to empty; keep the last id.
            if *self == Self::Uninitialized {
                *self = Self::Empty;
                return Observation::Baseline;
            }
            return Observation::Unchanged;
        };

        match self {
            Self::Uninitialized => {
                *self = Self::At(entry.id.clone());
                Observation::Baseline
            }
            Self::At(last) if *last == entry.id => Observation::Unchanged,
            Self::Empty | Self::At(_) => {
                *self = Self::At(entry.id.clone());
                Observation::Novel
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntryType, Targets};

    fn entry(id: &str) -> Entry {
        Entry {
            id: EntryId::new(id),
            entry_type: EntryType::Broadcast,
            company_name: String::new(),
            title: String::new(),
            message: String::new(),
            logo: String::new(),
            targets: Targets::All,
            duration: 0,
            created_at: crate::wire::epoch(),
        }
    }

    #[test]
    fn first_head_is_baseline_not_novel() {
        let mut cursor = DedupCursor::new();
        assert_eq!(cursor.observe(Some(&entry("a"))), Observation::Baseline);
        assert_eq!(cursor.last_id(), Some(&EntryId::new("a")));
    }

    #[test]
    fn same_head_is_idempotent() {
        let mut cursor = DedupCursor::new();
        cursor.observe(Some(&entry("a")));
        for _ in 0..5 {
            assert_eq!(cursor.observe(Some(&entry("a"))), Observation::Unchanged);
        }
    }

    #[test]
    fn new_head_is_novel_once() {
        let mut cursor = DedupCursor::new();
        cursor.observe(Some(&entry("a")));
        assert_eq!(cursor.observe(Some(&entry("b"))), Observation::Novel);
        assert_eq!(cursor.observe(Some(&entry("b"))), Observation::Unchanged);
    }

    #[test]
    fn first_entry_after_empty_log_is_novel() {
        let mut cursor = DedupCursor::new();
        assert_eq!(cursor.observe(None), Observation::Baseline);
        assert_eq!(cursor.observe(None), Observation::Unchanged);
        assert_eq!(cursor.observe(Some(&entry("a"))), Observation::Novel);
    }

    #[test]
    fn fresh_cursor_rebaselines_on_reconnect() {
        let mut cursor = DedupCursor::new();
        cursor.observe(Some(&entry("a")));
        cursor.observe(Some(&entry("b")));

        let mut cursor = DedupCursor::new();
        assert_eq!(cursor, DedupCursor::Uninitialized);
        assert_eq!(cursor.observe(Some(&entry("b"))), Observation::Baseline);
    }

    #[test]
    fn missing_head_after_at_keeps_cursor() {
        let mut cursor = DedupCursor::new();
        cursor.observe(Some(&entry("a")));
        assert_eq!(cursor.observe(None), Observation::Unchanged);
        assert_eq!(cursor.observe(Some(&entry("a"))), Observation::Unchanged);
    }
}
