//! Presentation sinks
//!
//! The controller only emits abstract display/speak/status notifications.
//! Rendering and speech synthesis belong to the sink.

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::warn;

/// Receives presentation commands from the session controller.
///
/// Calls are fire-and-forget; a sink must not block.
pub trait PresentationSink: Send + Sync {
    /// Show text in the response area
    fn display(&self, text: &str);

    /// Speak text, interrupting any utterance still in progress
    fn speak(&self, text: &str);

    /// Update the status line
    fn status(&self, text: &str);
}

/// Events emitted by [`ChannelSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentationEvent {
    /// Text for the response area
    Display(String),

    /// Stop whatever is being spoken
    CancelSpeech,

    /// Start speaking this text
    Speak(String),

    /// New status line
    Status(String),
}

/// Sink that forwards every command over a channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    event_tx: Sender<PresentationEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver for its events
    pub fn new(capacity: usize) -> (Self, Receiver<PresentationEvent>) {
        let (event_tx, event_rx) = bounded(capacity);
        (Self { event_tx }, event_rx)
    }

    fn emit(&self, event: PresentationEvent) {
        if let Err(e) = self.event_tx.try_send(event) {
            warn!("Dropping presentation event: {}", e);
        }
    }
}

impl PresentationSink for ChannelSink {
    fn display(&self, text: &str) {
        self.emit(PresentationEvent::Display(text.to_string()));
    }

    fn speak(&self, text: &str) {
        self.emit(PresentationEvent::CancelSpeech);
        self.emit(PresentationEvent::Speak(text.to_string()));
    }

    fn status(&self, text: &str) {
        self.emit(PresentationEvent::Status(text.to_string()));
    }
}

/// Sink that prints to the terminal
#[derive(Debug, Clone)]
pub struct TerminalSink {
    speak_responses: bool,
}

impl TerminalSink {
    pub fn new(speak_responses: bool) -> Self {
        Self { speak_responses }
    }
}

impl PresentationSink for TerminalSink {
    fn display(&self, text: &str) {
        println!("\n{}\n", text);
    }

    fn speak(&self, text: &str) {
        if self.speak_responses {
            println!("  (voice) {}", text);
        }
    }

    fn status(&self, text: &str) {
        println!("[{}]", text);
    }
}
