//! Error types for the pure core.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid agent id: {0:?}")]
    InvalidAgentId(String),

    #[error("unknown entry type: {0}")]
    UnknownEntryType(String),

    #[error("station {0:?} is not in the roster")]
    NotInRoster(String),
}
