//! Station roster and identity provisioning.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::AgentId;

/// Stations an agent may claim without generating an id.
pub const DEFAULT_ROSTER: [&str; 6] = [
    "Station-1",
    "Station-2",
    "Station-3",
    "Station-4",
    "Station-5",
    "Station-6",
];

/// Exclusive upper bound of the numeric suffix of generated ids.
pub const GENERATED_SUFFIX_RANGE: u16 = 10_000;

/// Local identity of an agent, persisted across restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: AgentId,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    names: Vec<String>,
}

impl Default for Roster {
    fn default() -> Self {
        Self::new(DEFAULT_ROSTER)
    }
}

impl Roster {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Claim a roster station. Matching is on the normalized id, so
    /// `station-3` selects `Station-3`.
    pub fn select(&self, name: &str) -> Result<Identity, CoreError> {
        let wanted = AgentId::parse(name)?;
        self.names
            .iter()
            .find(|n| AgentId::parse(n).is_ok_and(|id| id == wanted))
            .map(|n| Identity {
                id: wanted.clone(),
                display_name: n.clone(),
                credential: None,
            })
            .ok_or_else(|| CoreError::NotInRoster(name.to_string()))
    }
}

/// Fallback id `STATION-<OS>-<suffix>`. `suffix` is reduced into
/// `0..GENERATED_SUFFIX_RANGE`.
pub fn generated_identity(os: &str, suffix: u16) -> Result<Identity, CoreError> {
    let suffix = suffix % GENERATED_SUFFIX_RANGE;
    let id = AgentId::parse(&format!("STATION-{os}-{suffix}"))?;
    Ok(Identity {
        display_name: id.as_str().to_string(),
        id,
        credential: None,
    })
}
