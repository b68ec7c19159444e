//! Session controller
//!
//! Serializes turn processing for one live session: it claims the single
//! in-flight slot, snapshots the replay context, calls the inference
//! backend once, then records the outcome in the replay log and the
//! history store and notifies the presentation sink.
//!
//! Every path out of [`SessionController::submit`] leaves the session in
//! `Idle` or `Failed`, including a submit future dropped mid-call. The
//! only exception is a backend call that never returns while no request
//! timeout is configured and the caller keeps waiting.

use super::context::{build_context, estimate_context_tokens};
use super::input::{InputError, InputSource};
use super::presentation::PresentationSink;
use super::state::{Session, SessionState};
use super::types::{HistoryEntry, Turn, UtteranceSource};
use crate::backend::prompts::is_known_persona;
use crate::backend::{BackendError, BackendReply, BackendRequest, InferenceBackend};
use crate::history::HistoryStore;
use crate::{InnerVoiceError, Result};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

pub const STATUS_LISTENING: &str = "Listening... Speak now.";
pub const STATUS_READY: &str = "Ready.";
pub const STATUS_GENERATING: &str = "Generating AI response...";
pub const STATUS_COMPLETE: &str = "Processing complete. Inner Voice Response:";
pub const STATUS_FAILED: &str = "An error occurred. Details in log.";
pub const STATUS_CLEARED: &str = "Conversation cleared.";
pub const STATUS_REPLAY: &str = "Replaying a past response.";

/// Failure message for a turn whose submit future was dropped
pub const TURN_CANCELLED: &str = "cancelled";

/// Shown when replaying an entry whose request failed
pub const FAILED_RESPONSE_PLACEHOLDER: &str = "(no response: the request failed)";

/// How a submitted turn ended
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The backend answered; both turns were appended to the replay log
    Completed { entry: HistoryEntry },

    /// The backend failed; only the history entry was written
    Failed {
        entry: HistoryEntry,
        error: BackendError,
    },
}

impl TurnOutcome {
    pub fn entry(&self) -> &HistoryEntry {
        match self {
            TurnOutcome::Completed { entry } => entry,
            TurnOutcome::Failed { entry, .. } => entry,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, TurnOutcome::Completed { .. })
    }
}

/// Owns the live session and coordinates each turn
#[derive(Clone)]
pub struct SessionController {
    session: Arc<RwLock<Session>>,
    history: HistoryStore,
    backend: Arc<dyn InferenceBackend>,
    sink: Arc<dyn PresentationSink>,
    request_timeout: Option<Duration>,
}

impl SessionController {
    pub fn new(
        backend: Arc<dyn InferenceBackend>,
        history: HistoryStore,
        sink: Arc<dyn PresentationSink>,
        persona: impl Into<String>,
    ) -> Self {
        Self {
            session: Arc::new(RwLock::new(Session::new(persona))),
            history,
            backend,
            sink,
            request_timeout: None,
        }
    }

    /// Fail a turn when the backend takes longer than `timeout`.
    /// `None` waits indefinitely.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Copy of the current session (no lock held after return)
    pub fn snapshot(&self) -> Session {
        self.session.read().clone()
    }

    pub fn state(&self) -> SessionState {
        self.session.read().state()
    }

    pub fn active_persona(&self) -> String {
        self.session.read().active_persona().to_string()
    }

    /// Context that the next request would carry
    pub fn context(&self) -> Vec<Turn> {
        build_context(&self.session.read())
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Change the active persona between turns
    pub fn set_persona(&self, persona: &str) -> Result<()> {
        self.session.write().set_persona(persona)?;
        let persona = persona.trim();
        if !is_known_persona(persona) {
            warn!("Persona '{}' has no style guide line", persona);
        }
        info!("Active persona set to '{}'", persona);
        Ok(())
    }

    /// Input source started listening
    pub fn begin_capture(&self) -> Result<()> {
        self.session.write().begin_capture()?;
        self.sink.status(STATUS_LISTENING);
        Ok(())
    }

    /// User stopped the input source before any text was produced
    pub fn cancel_capture(&self) {
        if self.session.write().end_capture() {
            debug!("Capture cancelled");
            self.sink.status(STATUS_READY);
        }
    }

    /// Input source failed; surface it and return to ready
    pub fn report_input_error(&self, error: &InputError) {
        warn!("Input source error: {}", error);
        self.session.write().end_capture();
        self.sink.status(&error.status_message());
    }

    /// Run one input gesture through `source` and submit what it produced.
    ///
    /// Returns `Ok(None)` when the user aborted the capture.
    pub async fn capture_and_submit<S>(
        &self,
        source: &mut S,
        persona: &str,
    ) -> Result<Option<TurnOutcome>>
    where
        S: InputSource + ?Sized,
    {
        self.begin_capture()?;

        match source.capture().await {
            Ok(Some(utterance)) => {
                match self.submit(&utterance.text, persona, utterance.source).await {
                    Ok(outcome) => Ok(Some(outcome)),
                    Err(e) => {
                        self.session.write().end_capture();
                        Err(e)
                    }
                }
            }
            Ok(None) => {
                self.cancel_capture();
                Ok(None)
            }
            Err(e) => {
                self.report_input_error(&e);
                Err(InnerVoiceError::InputSource(e))
            }
        }
    }

    /// Process one user utterance to completion.
    ///
    /// Rejects blank text with `EmptyInput` and a turn already in flight with
    /// `Busy`; neither touches the replay log or the history. Backend
    /// failures are not errors here: they come back as
    /// [`TurnOutcome::Failed`].
    pub async fn submit(
        &self,
        text: &str,
        persona: &str,
        source: UtteranceSource,
    ) -> Result<TurnOutcome> {
        let text = text.trim();
        if text.is_empty() {
            let err = InnerVoiceError::EmptyInput;
            self.sink.status(&err.user_message());
            return Err(err);
        }

        let request = {
            let mut session = self.session.write();
            if let Err(e) = session.begin_request(persona) {
                drop(session);
                warn!("Rejecting submit: {}", e);
                self.sink.status(&e.user_message());
                return Err(e);
            }
            BackendRequest {
                persona: session.active_persona().to_string(),
                context: build_context(&session),
                text: text.to_string(),
            }
        };

        info!(
            "Submitting {} turn as '{}' to {} backend ({} context turns, ~{} tokens)",
            source,
            request.persona,
            self.backend.name(),
            request.context.len(),
            estimate_context_tokens(&request.context)
        );
        self.sink.status(STATUS_GENERATING);

        let mut in_flight = InFlightTurn {
            controller: self,
            query: &request.text,
            persona: &request.persona,
            source,
            armed: true,
        };
        let start_time = Instant::now();
        let result = self.call_backend(&request).await;
        let total_ms = start_time.elapsed().as_millis() as u64;
        in_flight.armed = false;
        drop(in_flight);

        match result {
            Ok(reply) => {
                debug!("Backend answered in {}ms", total_ms);
                self.complete_turn(request, source, reply)
            }
            Err(error) => {
                error!(
                    "Backend failed after {}ms: {} (details: {})",
                    total_ms,
                    error.message,
                    error.details.as_deref().unwrap_or("none")
                );
                self.fail_turn(request, source, error)
            }
        }
    }

    /// Re-present a past exchange without touching the replay log or the
    /// backend
    pub fn replay(&self, index: usize) -> Result<HistoryEntry> {
        let entry = self
            .history
            .select(index)
            .ok_or(InnerVoiceError::HistoryIndex(index))?;

        if entry.is_failed() {
            self.sink.display(FAILED_RESPONSE_PLACEHOLDER);
        } else {
            self.sink.display(&entry.response);
            self.sink.speak(&entry.response);
        }
        self.sink.status(STATUS_REPLAY);
        Ok(entry)
    }

    /// Start over: drop the replay log and the persisted history
    pub fn clear_conversation(&self) -> Result<()> {
        self.session.write().clear_turns()?;
        self.history.clear()?;
        info!("Conversation cleared");
        self.sink.status(STATUS_CLEARED);
        Ok(())
    }

    async fn call_backend(
        &self,
        request: &BackendRequest,
    ) -> std::result::Result<BackendReply, BackendError> {
        let call = self.backend.generate(request);
        let reply = match self.request_timeout {
            Some(deadline) => match tokio::time::timeout(deadline, call).await {
                Ok(result) => result?,
                Err(_) => return Err(BackendError::timeout(deadline)),
            },
            None => call.await?,
        };

        if reply.text.trim().is_empty() {
            return Err(BackendError::empty_response());
        }
        Ok(reply)
    }

    fn complete_turn(
        &self,
        request: BackendRequest,
        source: UtteranceSource,
        reply: BackendReply,
    ) -> Result<TurnOutcome> {
        let persona = request.persona;
        self.session.write().complete_request(
            Turn::user(&request.text, &persona, source),
            Turn::assistant(&reply.text, &persona),
        )?;

        let entry = HistoryEntry::new(request.text, reply.text.clone(), persona, source);
        self.record(entry.clone());

        self.sink.display(&reply.text);
        self.sink.speak(&reply.text);
        self.sink.status(STATUS_COMPLETE);

        self.session.write().finish_presenting();
        Ok(TurnOutcome::Completed { entry })
    }

    fn fail_turn(
        &self,
        request: BackendRequest,
        source: UtteranceSource,
        error: BackendError,
    ) -> Result<TurnOutcome> {
        self.session.write().fail_request(error.message.clone())?;

        let entry = HistoryEntry::failed(request.text, request.persona, source);
        self.record(entry.clone());

        self.sink.display(&format!("Error: {}", error.message));
        self.sink.status(STATUS_FAILED);
        Ok(TurnOutcome::Failed { entry, error })
    }

    fn record(&self, entry: HistoryEntry) {
        if let Err(e) = self.history.append(entry) {
            warn!("History entry kept in memory only: {}", e);
        }
    }
}

/// Armed while a submit awaits the backend. Dropped armed, it fails the
/// turn so the session never stays `Awaiting` after the caller gives up.
struct InFlightTurn<'a> {
    controller: &'a SessionController,
    query: &'a str,
    persona: &'a str,
    source: UtteranceSource,
    armed: bool,
}

impl Drop for InFlightTurn<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if self.controller.session.write().fail_request(TURN_CANCELLED).is_err() {
            return;
        }

        warn!("Turn cancelled while awaiting the backend");
        self.controller
            .record(HistoryEntry::failed(self.query, self.persona, self.source));
        self.controller.sink.status(STATUS_FAILED);
    }
}
