//! Conversation session management
//!
//! # Architecture
//!
//! - **types**: turns, history entries and utterances
//! - **state**: the live session and its turn state machine
//! - **context**: assembles the replay context for a backend call
//! - **controller**: runs one turn at a time against an inference backend
//! - **input**: input source contract (voice or manual entry)
//! - **presentation**: display/speak/status sinks
//!
//! # Usage
//!
//! ```rust,ignore
//! use inner_voice::backend::HttpBackend;
//! use inner_voice::history::{HistoryStore, MemoryStorage};
//! use inner_voice::session::{ChannelSink, SessionController, UtteranceSource};
//! use std::sync::Arc;
//!
//! let (sink, events) = ChannelSink::new(64);
//! let history = HistoryStore::open(Arc::new(MemoryStorage::new()), "history");
//! let controller = SessionController::new(
//!     Arc::new(HttpBackend::new("http://localhost:3000")),
//!     history,
//!     Arc::new(sink),
//!     "Motivator",
//! );
//!
//! let outcome = controller
//!     .submit("I feel stuck", "Philosopher", UtteranceSource::Manual)
//!     .await?;
//! ```

pub mod context;
pub mod controller;
pub mod input;
pub mod presentation;
pub mod state;
pub mod types;

pub use context::build_context;
pub use controller::{SessionController, TurnOutcome};
pub use input::{InputError, InputSource, ManualEntry};
pub use presentation::{ChannelSink, PresentationEvent, PresentationSink, TerminalSink};
pub use state::{Session, SessionState};
pub use types::{HistoryEntry, Role, Turn, Utterance, UtteranceSource};
