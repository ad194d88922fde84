//! REST log backend.
//!
//! - `GET  {base}/entries/latest` → 200 entry, 204/404 empty log
//! - `POST {base}/entries`        → stored entry
//! - `PATCH {base}/agents/{id}`   ← `{"status": "..."}`

use std::time::Duration;

use popcast_core::{AgentId, AgentStatus, Entry};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};

use crate::error::LogError;
use crate::store::{BroadcastLog, StatusSink};

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct HttpLog {
    http: reqwest::Client,
    base_url: String,
}

impl HttpLog {
    pub fn new(base_url: &str, credential: Option<&str>) -> Result<Self, LogError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        let lower = base_url.to_ascii_lowercase();
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return Err(LogError::InvalidUrl(base_url));
        }

        let mut headers = HeaderMap::new();
        if let Some(token) = credential.map(str::trim).filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| LogError::InvalidUrl("credential is not a valid header".into()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Non-success → `Api` error carrying a trimmed body excerpt.
    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, LogError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let message = match body.trim() {
            "" => status.canonical_reason().unwrap_or("Unknown").to_string(),
            text => text.chars().take(200).collect(),
        };
        Err(LogError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

impl BroadcastLog for HttpLog {
    async fn fetch_latest(&self) -> Result<Option<Entry>, LogError> {
        let resp = self.http.get(self.url("/entries/latest")).send().await?;
        if matches!(resp.status(), StatusCode::NO_CONTENT | StatusCode::NOT_FOUND) {
            return Ok(None);
        }
        let resp = Self::check_status(resp).await?;
        let body = resp.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        Ok(serde_json::from_str::<Option<Entry>>(&body)?)
    }

    async fn append(&self, entry: Entry) -> Result<Entry, LogError> {
        let mut body = serde_json::to_value(&entry)?;
        // The server assigns ids.
        if let (true, Some(obj)) = (entry.id.is_empty(), body.as_object_mut()) {
            obj.remove("id");
        }
        let resp = self.http.post(self.url("/entries")).json(&body).send().await?;
        let resp = Self::check_status(resp).await?;
        let text = resp.text().await?;
        if text.trim().is_empty() {
            return Ok(entry);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

impl StatusSink for HttpLog {
    async fn set_status(&self, agent: &AgentId, status: AgentStatus) -> Result<(), LogError> {
        let url = self.url(&format!("/agents/{}", agent.as_str()));
        let resp = self
            .http
            .patch(url)
            .json(&serde_json::json!({ "status": status }))
            .send()
            .await?;
        Self::check_status(resp).await?;
        Ok(())
    }
}
