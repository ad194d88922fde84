//! Log and status traits, backend selection.

use std::future::Future;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use popcast_core::{AgentId, AgentStatus, Entry};

use crate::error::LogError;
use crate::file::FileLog;
use crate::http::HttpLog;
use crate::memory::MemoryLog;

// ─── Traits ───────────────────────────────────────────────────────

/// Append-only broadcast log. Agents only read the head; the authority
/// appends.
pub trait BroadcastLog: Send + Sync {
    /// Newest entry, or `None` for an empty log.
    fn fetch_latest(&self) -> impl Future<Output = Result<Option<Entry>, LogError>> + Send;

    /// Append one entry. Returns the stored entry with its assigned id.
    fn append(&self, entry: Entry) -> impl Future<Output = Result<Entry, LogError>> + Send;
}

/// Shared `Agent.status` field. Last write wins.
pub trait StatusSink: Send + Sync {
    fn set_status(
        &self,
        agent: &AgentId,
        status: AgentStatus,
    ) -> impl Future<Output = Result<(), LogError>> + Send;
}

impl<T: BroadcastLog + ?Sized> BroadcastLog for Arc<T> {
    fn fetch_latest(&self) -> impl Future<Output = Result<Option<Entry>, LogError>> + Send {
        (**self).fetch_latest()
    }

    fn append(&self, entry: Entry) -> impl Future<Output = Result<Entry, LogError>> + Send {
        (**self).append(entry)
    }
}

impl<T: StatusSink + ?Sized> StatusSink for Arc<T> {
    fn set_status(
        &self,
        agent: &AgentId,
        status: AgentStatus,
    ) -> impl Future<Output = Result<(), LogError>> + Send {
        (**self).set_status(agent, status)
    }
}

/// Id assigned by local backends to the n-th entry (1-based).
pub(crate) fn sequential_id(n: usize) -> String {
    format!("e-{n:08}")
}

// ─── Location ─────────────────────────────────────────────────────

/// Where the log lives, parsed from `--log-url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogLocation {
    Http(String),
    File(PathBuf),
}

impl FromStr for LogLocation {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(LogError::InvalidUrl("empty location".into()));
        }
        let lower = s.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Ok(Self::Http(s.trim_end_matches('/').to_string()));
        }
        if let Some(path) = s.strip_prefix("file://") {
            if path.is_empty() {
                return Err(LogError::InvalidUrl(s.to_string()));
            }
            return Ok(Self::File(PathBuf::from(path)));
        }
        if s.contains("://") {
            return Err(LogError::InvalidUrl(format!("unsupported scheme: {s}")));
        }
        Ok(Self::File(PathBuf::from(s)))
    }
}

// ─── AnyLog ───────────────────────────────────────────────────────

/// Backend chosen at runtime.
pub enum AnyLog {
    Http(HttpLog),
    File(FileLog),
    Memory(MemoryLog),
}

impl AnyLog {
    pub fn open(location: &LogLocation, credential: Option<&str>) -> Result<Self, LogError> {
        Ok(match location {
            LogLocation::Http(base) => Self::Http(HttpLog::new(base, credential)?),
            LogLocation::File(path) => Self::File(FileLog::new(path)),
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::File(_) => "file",
            Self::Memory(_) => "memory",
        }
    }
}

impl BroadcastLog for AnyLog {
    async fn fetch_latest(&self) -> Result<Option<Entry>, LogError> {
        match self {
            Self::Http(log) => log.fetch_latest().await,
            Self::File(log) => log.fetch_latest().await,
            Self::Memory(log) => log.fetch_latest().await,
        }
    }

    async fn append(&self, entry: Entry) -> Result<Entry, LogError> {
        match self {
            Self::Http(log) => log.append(entry).await,
            Self::File(log) => log.append(entry).await,
            Self::Memory(log) => log.append(entry).await,
        }
    }
}

impl StatusSink for AnyLog {
    async fn set_status(&self, agent: &AgentId, status: AgentStatus) -> Result<(), LogError> {
        match self {
            Self::Http(log) => log.set_status(agent, status).await,
            Self::File(log) => log.set_status(agent, status).await,
            Self::Memory(log) => log.set_status(agent, status).await,
        }
    }
}
