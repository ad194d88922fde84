//! popcast-core: data model and pure state machines of a popcast agent.
//!
//! Log head → dedup cursor → targeting → dispatch → presenter → (gate,
//! presence). Nothing here performs IO or reads a clock; callers pass
//! `now_ms` in and render the returned effects.

pub mod dedup;
pub mod dispatch;
pub mod error;
pub mod gate;
pub mod presence;
pub mod presenter;
pub mod roster;
pub mod station;
pub mod targeting;
pub mod types;
pub mod wire;

pub use dedup::{DedupCursor, Observation};
pub use dispatch::{Command, SpawnRequest, dispatch, route};
pub use error::CoreError;
pub use presenter::{Placement, PresenterEffect, ToastId, ToastView};
pub use roster::{Identity, Roster};
pub use station::{Station, StationUpdate};
pub use types::{
    AgentId, AgentStatus, Bounds, Cue, Entry, EntryId, EntryType, Position, Targets, ToastContent,
    ToastIcon,
};
