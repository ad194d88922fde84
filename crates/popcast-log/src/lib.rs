//! popcast-log: IO boundary to the broadcast log and the shared agent
//! status field.
//!
//! Backends: REST (`HttpLog`), JSONL file (`FileLog`) and in-process
//! (`MemoryLog`). Selection happens from a `LogLocation` string.

pub mod error;
pub mod file;
pub mod http;
pub mod memory;
pub mod store;

pub use error::LogError;
pub use file::FileLog;
pub use http::HttpLog;
pub use memory::MemoryLog;
pub use store::{AnyLog, BroadcastLog, LogLocation, StatusSink};
