//! Inference backends
//!
//! The session controller consults exactly one backend call per turn. A
//! backend receives the persona, the replay context and the new user text,
//! and either returns generated text or fails.
//!
//! - **http**: talks to a remote `/api/process-text` endpoint
//! - **gemini**: calls the Gemini `generateContent` API directly
//! - **prompts**: persona directives sent as system instructions
//! - **wire**: JSON shapes shared by the client, the server and the prompts

pub mod gemini;
pub mod http;
pub mod prompts;
pub mod wire;

pub use gemini::GeminiBackend;
pub use http::HttpBackend;
pub use prompts::{persona_prompt, DEFAULT_PERSONA, KNOWN_PERSONAS};

use crate::session::types::Turn;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Message used whenever the failure is in the transport rather than the
/// service; transport text only goes into `details`.
pub const TRANSPORT_FAILURE_MESSAGE: &str = "Could not reach the inference service.";

/// One backend call
#[derive(Debug, Clone, PartialEq)]
pub struct BackendRequest {
    pub persona: String,
    /// Prior turns, chronological
    pub context: Vec<Turn>,
    pub text: String,
}

/// Generated reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendReply {
    pub text: String,
}

impl BackendReply {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Failure of a backend call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct BackendError {
    /// Human-readable message
    pub message: String,
    /// Machine detail, never shown verbatim to the user
    pub details: Option<String>,
    /// HTTP status, when the failure came from a response
    pub status: Option<u16>,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: None,
            status: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// The request never produced a response
    pub fn transport(detail: impl Into<String>) -> Self {
        Self::new(TRANSPORT_FAILURE_MESSAGE).with_details(detail)
    }

    /// The configured deadline expired
    pub fn timeout(deadline: Duration) -> Self {
        Self::new("The inference service did not answer in time.")
            .with_details(format!("deadline of {:?} expired", deadline))
    }

    /// The service answered with no usable text
    pub fn empty_response() -> Self {
        Self::new("The inference service returned an empty response.")
    }
}

/// A generative-text service consulted once per turn
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    async fn generate(&self, request: &BackendRequest) -> Result<BackendReply, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_is_message() {
        let err = BackendError::new("AI Error")
            .with_details("quota exceeded")
            .with_status(500);
        assert_eq!(err.to_string(), "AI Error");
        assert_eq!(err.details.as_deref(), Some("quota exceeded"));
        assert_eq!(err.status, Some(500));
    }

    #[test]
    fn test_transport_error_keeps_detail_out_of_message() {
        let err = BackendError::transport("tcp connect error: refused");
        assert_eq!(err.message, TRANSPORT_FAILURE_MESSAGE);
        assert!(err.details.unwrap().contains("refused"));
        assert!(err.status.is_none());
    }

    #[test]
    fn test_timeout_error() {
        let err = BackendError::timeout(Duration::from_secs(5));
        assert!(err.details.unwrap().contains("5s"));
    }
}
