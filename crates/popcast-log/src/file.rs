//! JSONL file log for single-host setups.
//!
//! One entry per line, oldest first. The head is the last non-blank line.
//! Agent statuses live next to the log in `<log>.agents.json`.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use popcast_core::{AgentId, AgentStatus, Entry, EntryId};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::error::LogError;
use crate::store::{BroadcastLog, StatusSink, sequential_id};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct StatusRecord {
    status: AgentStatus,
}

#[derive(Debug, Clone)]
pub struct FileLog {
    path: PathBuf,
    status_path: PathBuf,
}

impl FileLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut status_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        status_name.push(".agents.json");
        let status_path = path.with_file_name(status_name);
        Self { path, status_path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn status_path(&self) -> &Path {
        &self.status_path
    }

    async fn read_optional(path: &Path) -> Result<String, LogError> {
        match tokio::fs::read_to_string(path).await {
            Ok(s) => Ok(s),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn read_statuses(&self) -> Result<BTreeMap<String, StatusRecord>, LogError> {
        let raw = Self::read_optional(&self.status_path).await?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    pub async fn status_of(&self, agent: &AgentId) -> Result<Option<AgentStatus>, LogError> {
        Ok(self
            .read_statuses()
            .await?
            .get(agent.as_str())
            .map(|r| r.status))
    }
}

fn non_blank_lines(raw: &str) -> impl Iterator<Item = &str> {
    raw.lines().filter(|l| !l.trim().is_empty())
}

impl BroadcastLog for FileLog {
    async fn fetch_latest(&self) -> Result<Option<Entry>, LogError> {
        let raw = Self::read_optional(&self.path).await?;
        let Some(line) = non_blank_lines(&raw).last() else {
            return Ok(None);
        };
        let mut entry: Entry = serde_json::from_str(line)?;
        if entry.id.is_empty() {
            // Hand-written lines may omit the id; the line number stands in.
            entry.id = EntryId::new(sequential_id(non_blank_lines(&raw).count()));
        }
        Ok(Some(entry))
    }

    async fn append(&self, mut entry: Entry) -> Result<Entry, LogError> {
        let raw = Self::read_optional(&self.path).await?;
        let next = non_blank_lines(&raw).count() + 1;
        if entry.id.is_empty() {
            entry.id = EntryId::new(sequential_id(next));
        }
        if entry.created_at == popcast_core::wire::epoch() {
            entry.created_at = Utc::now();
        }

        let mut line = serde_json::to_string(&entry)?;
        if !raw.is_empty() && !raw.ends_with('\n') {
            line.insert(0, '\n');
        }
        line.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        tracing::debug!(id = %entry.id, path = %self.path.display(), "appended entry");
        Ok(entry)
    }
}

impl StatusSink for FileLog {
    async fn set_status(&self, agent: &AgentId, status: AgentStatus) -> Result<(), LogError> {
        let mut statuses = self.read_statuses().await?;
        statuses.insert(agent.as_str().to_string(), StatusRecord { status });
        let body = serde_json::to_string_pretty(&statuses)?;

        let mut tmp_name = self.status_path.as_os_str().to_os_string();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.status_path).await?;
        Ok(())
    }
}
