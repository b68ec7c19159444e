//! Persisted conversation history
//!
//! The history list is the human-browsable view of past exchanges. It is
//! separate from the session's replay log: entries are display-oriented,
//! bounded, and survive restarts.

pub mod storage;
pub mod store;

pub use storage::{BlobStorage, FileStorage, MemoryStorage};
pub use store::{HistoryStore, DEFAULT_HISTORY_KEY, HISTORY_CAPACITY};
