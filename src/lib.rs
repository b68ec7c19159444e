pub mod backend;
pub mod config;
pub mod history;
pub mod server;
pub mod session;

pub use backend::BackendError;
pub use session::InputError;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum InnerVoiceError {
    #[error("Empty input")]
    EmptyInput,

    #[error("A request is already in flight")]
    Busy,

    #[error("Invalid session state: {0}")]
    InvalidState(String),

    #[error("Input source error: {0}")]
    InputSource(#[from] InputError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Persisted history is corrupt: {0}")]
    PersistenceCorruption(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No history entry at index {0}")]
    HistoryIndex(usize),

    #[error("Server error: {0}")]
    Server(String),
}

impl From<std::io::Error> for InnerVoiceError {
    fn from(e: std::io::Error) -> Self {
        InnerVoiceError::Storage(e.to_string())
    }
}

impl InnerVoiceError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Rejected locally, the session is untouched
            InnerVoiceError::EmptyInput => true,
            InnerVoiceError::Busy => true,
            InnerVoiceError::InvalidState(_) => true,
            // The user can retry the gesture
            InnerVoiceError::InputSource(_) => true,
            // The session moves to Failed, which accepts new input
            InnerVoiceError::Backend(_) => true,
            // Treated as empty history
            InnerVoiceError::PersistenceCorruption(_) => true,
            InnerVoiceError::HistoryIndex(_) => true,
            InnerVoiceError::Storage(_) => false,
            InnerVoiceError::Config(_) => false,
            InnerVoiceError::Server(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            InnerVoiceError::EmptyInput => {
                "Please enter some text first.".to_string()
            }
            InnerVoiceError::Busy => {
                "Still thinking about your last thought. Please wait.".to_string()
            }
            InnerVoiceError::InvalidState(_) => {
                "That action is not available right now.".to_string()
            }
            InnerVoiceError::InputSource(e) => e.status_message(),
            InnerVoiceError::Backend(_) => {
                "An error occurred. Details in log.".to_string()
            }
            InnerVoiceError::PersistenceCorruption(_) => {
                "Saved history could not be read and was reset.".to_string()
            }
            InnerVoiceError::Storage(_) => "File system error occurred.".to_string(),
            InnerVoiceError::Config(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            InnerVoiceError::HistoryIndex(_) => {
                "No such history entry.".to_string()
            }
            InnerVoiceError::Server(_) => "Server error occurred.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, InnerVoiceError>;
