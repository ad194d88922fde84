use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::wire;

/// Wire sentinel addressing every agent.
pub const TARGET_ALL: &str = "ALL";

/// Title shown when an entry carries none.
pub const FALLBACK_TITLE: &str = "System Alert";

// ─── Agent identity ───────────────────────────────────────────────

/// Normalized station id: trimmed and ASCII-uppercased. Punctuation is
/// kept as is, so `S_1` and `S.1` are different stations. The targeting
/// sentinel `ALL` is reserved and never a station id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AgentId(String);

impl AgentId {
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let normalized = raw.trim().to_ascii_uppercase();
        if normalized.is_empty() || normalized == TARGET_ALL {
            return Err(CoreError::InvalidAgentId(raw.to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AgentId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AgentId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AgentId> for String {
    fn from(id: AgentId) -> Self {
        id.0
    }
}

// ─── Agent status ─────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentStatus {
    Online,
    #[default]
    Offline,
    Busy,
    Locked,
}

impl AgentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Online => "ONLINE",
            Self::Offline => "OFFLINE",
            Self::Busy => "BUSY",
            Self::Locked => "LOCKED",
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Entry ────────────────────────────────────────────────────────

/// Ordering key assigned by the log backend.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub String);

impl EntryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryType {
    #[default]
    Broadcast,
    Persistent,
    KillAlerts,
    LockInput,
    UnlockInput,
}

impl EntryType {
    pub const ALL: [Self; 5] = [
        Self::Broadcast,
        Self::Persistent,
        Self::KillAlerts,
        Self::LockInput,
        Self::UnlockInput,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Broadcast => "BROADCAST",
            Self::Persistent => "PERSISTENT",
            Self::KillAlerts => "KILL_ALERTS",
            Self::LockInput => "LOCK_INPUT",
            Self::UnlockInput => "UNLOCK_INPUT",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == key)
            .ok_or_else(|| CoreError::UnknownEntryType(s.to_string()))
    }
}

/// Addressing of an entry: everyone, or an explicit set of agents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Targets {
    All,
    Agents(BTreeSet<AgentId>),
}

impl Targets {
    pub fn agents<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for raw in ids {
            let raw = raw.as_ref();
            // Case-sensitive: `all` is neither the sentinel nor a valid id.
            if raw.trim() == TARGET_ALL {
                return Self::All;
            }
            if let Ok(id) = AgentId::parse(raw) {
                set.insert(id);
            }
        }
        Self::Agents(set)
    }

    pub fn to_wire(&self) -> Vec<String> {
        match self {
            Self::All => vec![TARGET_ALL.to_string()],
            Self::Agents(set) => set.iter().map(|id| id.as_str().to_string()).collect(),
        }
    }
}

impl Default for Targets {
    fn default() -> Self {
        Self::Agents(BTreeSet::new())
    }
}

impl Serialize for Targets {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_wire().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Targets {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        wire::lenient_targets(deserializer)
    }
}

/// One immutable record of the broadcast log.
///
/// Decoding is lenient: missing or mistyped fields fall back to defaults
/// instead of failing the whole entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    #[serde(default, deserialize_with = "wire::lenient_entry_id")]
    pub id: EntryId,
    #[serde(rename = "type", default, deserialize_with = "wire::lenient_entry_type")]
    pub entry_type: EntryType,
    #[serde(default, deserialize_with = "wire::lenient_string")]
    pub company_name: String,
    #[serde(default, deserialize_with = "wire::lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "wire::lenient_string")]
    pub message: String,
    #[serde(default, deserialize_with = "wire::lenient_string")]
    pub logo: String,
    #[serde(default)]
    pub targets: Targets,
    #[serde(default, deserialize_with = "wire::lenient_duration")]
    pub duration: u64,
    #[serde(default = "wire::epoch", deserialize_with = "wire::lenient_timestamp")]
    pub created_at: DateTime<Utc>,
}

// ─── Toast content ────────────────────────────────────────────────

/// Longest auto-dismiss accepted, in seconds. Larger values are clamped so
/// deadlines in milliseconds stay far from `u64::MAX`.
pub const MAX_DURATION_SECS: u64 = u32::MAX as u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToastContent {
    pub company_name: String,
    pub title: String,
    pub message: String,
    pub logo: Option<String>,
    /// Auto-dismiss after this many seconds; 0 = until dismissed.
    pub duration_secs: u64,
}

impl ToastContent {
    pub fn from_entry(entry: &Entry) -> Self {
        let logo = entry.logo.trim();
        Self {
            company_name: entry.company_name.clone(),
            title: entry.title.clone(),
            message: entry.message.clone(),
            logo: (!logo.is_empty()).then(|| logo.to_string()),
            duration_secs: entry.duration,
        }
    }

    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            FALLBACK_TITLE
        } else {
            &self.title
        }
    }
}

// ─── Rendering primitives ─────────────────────────────────────────

/// Toast footprint used to keep random placements on-screen.
pub const TOAST_WIDTH: u32 = 360;
pub const TOAST_HEIGHT: u32 = 150;
pub const PLACEMENT_MARGIN: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

/// Size of the overlay surface in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    /// Exclusive upper limits for a toast's top-left corner.
    pub fn max_origin(&self) -> (u32, u32) {
        (
            self.width.saturating_sub(TOAST_WIDTH).max(1),
            self.height.saturating_sub(TOAST_HEIGHT).max(1),
        )
    }

    /// Clamp a raw origin into the placeable area.
    pub fn clamp(&self, x: u32, y: u32) -> Position {
        let (max_x, max_y) = self.max_origin();
        Position {
            x: x.min(max_x).max(PLACEMENT_MARGIN),
            y: y.min(max_y).max(PLACEMENT_MARGIN),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlyphKind {
    Bell,
    Alert,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "value")]
pub enum ToastIcon {
    Logo(String),
    Glyph(GlyphKind),
}

/// Audible cues requested from the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    /// Arrival of a new toast. Urgent for persistent toasts.
    Ping { urgent: bool },
    /// Rejected dismissal of a persistent toast.
    Error,
}
