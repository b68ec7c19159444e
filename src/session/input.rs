//! Input sources
//!
//! An input source produces the text for one user gesture: a voice
//! transcript or typed entry. Speech recognition itself lives outside
//! this crate and plugs in through [`InputSource`].

use super::types::Utterance;
use async_trait::async_trait;
use thiserror::Error;

/// Failures reported by an input source
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("no speech detected")]
    NoSpeech,

    #[error("recognition error: {0}")]
    Other(String),
}

impl InputError {
    /// Status line shown to the user
    pub fn status_message(&self) -> String {
        match self {
            InputError::PermissionDenied => {
                "Error: Microphone access denied. Allow access in settings.".to_string()
            }
            InputError::NoSpeech => "Error: No speech recognized. Try again.".to_string(),
            InputError::Other(detail) => format!("Recognition error: {}", detail),
        }
    }
}

/// Produces text from voice or manual entry.
///
/// `Ok(None)` means the user aborted before any text was produced.
#[async_trait]
pub trait InputSource: Send {
    async fn capture(&mut self) -> Result<Option<Utterance>, InputError>;
}

/// One-shot source wrapping text the user already typed
#[derive(Debug, Clone)]
pub struct ManualEntry {
    text: Option<String>,
}

impl ManualEntry {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

#[async_trait]
impl InputSource for ManualEntry {
    async fn capture(&mut self) -> Result<Option<Utterance>, InputError> {
        Ok(self.text.take().map(Utterance::manual))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::types::UtteranceSource;

    #[tokio::test]
    async fn test_manual_entry_is_one_shot() {
        let mut entry = ManualEntry::new("I feel stuck");

        let first = entry.capture().await.unwrap().unwrap();
        assert_eq!(first.text, "I feel stuck");
        assert_eq!(first.source, UtteranceSource::Manual);

        assert!(entry.capture().await.unwrap().is_none());
    }

    #[test]
    fn test_status_messages() {
        assert!(InputError::PermissionDenied
            .status_message()
            .contains("Microphone access denied"));
        assert!(InputError::NoSpeech.status_message().contains("No speech"));
        assert_eq!(
            InputError::Other("network".to_string()).status_message(),
            "Recognition error: network"
        );
    }
}
