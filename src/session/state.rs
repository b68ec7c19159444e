//! Live conversation state
//!
//! The `Session` owns the replay log and the turn state machine:
//!
//! ```text
//! Idle/Failed -> Capturing -> Awaiting -> Presenting -> Idle
//!                               \-> Failed
//! ```
//!
//! Transitions are plain methods; callers hold the session lock only
//! for the duration of a transition, never across a backend call.

use super::types::Turn;
use crate::{InnerVoiceError, Result};
use tracing::debug;

/// Turn processing state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Ready for input
    #[default]
    Idle,
    /// Input source is acquiring text
    Capturing,
    /// Waiting on the inference backend
    Awaiting,
    /// Reply is being handed to the presentation sink
    Presenting,
    /// Last turn failed; ready for new input
    Failed,
}

impl SessionState {
    /// States that accept a new utterance
    pub fn accepts_input(&self) -> bool {
        matches!(self, SessionState::Idle | SessionState::Failed)
    }

    /// A turn is between backend call and presentation
    pub fn is_in_flight(&self) -> bool {
        matches!(self, SessionState::Awaiting | SessionState::Presenting)
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SessionState::Failed)
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self, SessionState::Capturing)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "Idle"),
            SessionState::Capturing => write!(f, "Capturing"),
            SessionState::Awaiting => write!(f, "Awaiting"),
            SessionState::Presenting => write!(f, "Presenting"),
            SessionState::Failed => write!(f, "Failed"),
        }
    }
}

/// The live conversation
#[derive(Clone, Debug)]
pub struct Session {
    /// Replay log, chronological
    turns: Vec<Turn>,
    active_persona: String,
    state: SessionState,
    last_error: Option<String>,
}

impl Session {
    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            turns: Vec::new(),
            active_persona: persona.into(),
            state: SessionState::Idle,
            last_error: None,
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn active_persona(&self) -> &str {
        &self.active_persona
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Change the persona used for subsequent turns.
    ///
    /// Only legal between turns. Past turns keep the persona they were
    /// produced with.
    pub fn set_persona(&mut self, persona: &str) -> Result<()> {
        let persona = persona.trim();
        if persona.is_empty() {
            return Err(InnerVoiceError::InvalidState(
                "persona must not be blank".to_string(),
            ));
        }
        if !self.state.accepts_input() {
            return Err(InnerVoiceError::InvalidState(format!(
                "cannot change persona while {}",
                self.state
            )));
        }
        self.active_persona = persona.to_string();
        Ok(())
    }

    /// Input source started acquiring text
    pub fn begin_capture(&mut self) -> Result<()> {
        match self.state {
            SessionState::Idle | SessionState::Failed => {
                self.transition(SessionState::Capturing);
                Ok(())
            }
            SessionState::Capturing => Err(InnerVoiceError::InvalidState(
                "already capturing".to_string(),
            )),
            SessionState::Awaiting | SessionState::Presenting => Err(InnerVoiceError::Busy),
        }
    }

    /// Abort capture without side effects. Returns whether a capture was active.
    pub fn end_capture(&mut self) -> bool {
        if self.state.is_capturing() {
            self.transition(SessionState::Idle);
            true
        } else {
            false
        }
    }

    /// Claim the single in-flight slot for a new turn.
    ///
    /// A blank `persona` keeps the active one.
    pub fn begin_request(&mut self, persona: &str) -> Result<()> {
        match self.state {
            SessionState::Idle | SessionState::Failed => {
                self.transition(SessionState::Capturing);
            }
            SessionState::Capturing => {}
            SessionState::Awaiting | SessionState::Presenting => {
                return Err(InnerVoiceError::Busy);
            }
        }

        let persona = persona.trim();
        if !persona.is_empty() {
            self.active_persona = persona.to_string();
        }
        self.last_error = None;
        self.transition(SessionState::Awaiting);
        Ok(())
    }

    /// Record a successful exchange. Both turns are appended or neither.
    pub fn complete_request(&mut self, user: Turn, reply: Turn) -> Result<()> {
        if self.state != SessionState::Awaiting {
            return Err(InnerVoiceError::InvalidState(format!(
                "no request in flight (state {})",
                self.state
            )));
        }
        self.turns.push(user);
        self.turns.push(reply);
        self.transition(SessionState::Presenting);
        Ok(())
    }

    /// Presentation handed off; back to ready
    pub fn finish_presenting(&mut self) {
        if self.state == SessionState::Presenting {
            self.transition(SessionState::Idle);
        }
    }

    /// Record a failed exchange. The replay log is left untouched.
    pub fn fail_request(&mut self, error: impl Into<String>) -> Result<()> {
        if self.state != SessionState::Awaiting {
            return Err(InnerVoiceError::InvalidState(format!(
                "no request in flight (state {})",
                self.state
            )));
        }
        self.last_error = Some(error.into());
        self.transition(SessionState::Failed);
        Ok(())
    }

    /// Drop the replay log
    pub fn clear_turns(&mut self) -> Result<()> {
        if self.state.is_in_flight() {
            return Err(InnerVoiceError::Busy);
        }
        self.turns.clear();
        self.last_error = None;
        if self.state.is_failed() {
            self.transition(SessionState::Idle);
        }
        Ok(())
    }

    fn transition(&mut self, next: SessionState) {
        debug!("Session state {} -> {}", self.state, next);
        self.state = next;
    }
}
