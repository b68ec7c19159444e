use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Role name used on the wire to the inference backend
    pub fn wire_name(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "model",
        }
    }

    /// Parse a wire role name; anything that is not a model reply is the user
    pub fn from_wire(name: &str) -> Self {
        match name {
            "model" | "assistant" => Role::Assistant,
            _ => Role::User,
        }
    }
}

/// How a user utterance was captured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UtteranceSource {
    Voice,
    Manual,
}

impl std::fmt::Display for UtteranceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UtteranceSource::Voice => write!(f, "voice"),
            UtteranceSource::Manual => write!(f, "manual"),
        }
    }
}

/// One role-tagged utterance in the replay log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    pub persona: String,
    pub timestamp: DateTime<Utc>,
    /// Set on user turns only
    pub source: Option<UtteranceSource>,
}

impl Turn {
    pub fn user(
        text: impl Into<String>,
        persona: impl Into<String>,
        source: UtteranceSource,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            text: text.into(),
            persona: persona.into(),
            timestamp: Utc::now(),
            source: Some(source),
        }
    }

    pub fn assistant(text: impl Into<String>, persona: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            text: text.into(),
            persona: persona.into(),
            timestamp: Utc::now(),
            source: None,
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

/// Display-oriented record of one completed exchange.
///
/// A failed exchange keeps an empty `response` so the timeline still shows
/// the attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub query: String,
    pub response: String,
    pub persona: String,
    pub source: UtteranceSource,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(
        query: impl Into<String>,
        response: impl Into<String>,
        persona: impl Into<String>,
        source: UtteranceSource,
    ) -> Self {
        Self {
            query: query.into(),
            response: response.into(),
            persona: persona.into(),
            source,
            timestamp: Utc::now(),
        }
    }

    /// Entry recorded for a turn whose backend call failed
    pub fn failed(
        query: impl Into<String>,
        persona: impl Into<String>,
        source: UtteranceSource,
    ) -> Self {
        Self::new(query, String::new(), persona, source)
    }

    pub fn is_failed(&self) -> bool {
        self.response.is_empty()
    }
}

/// Text delivered by an input source for one user gesture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub text: String,
    pub source: UtteranceSource,
}

impl Utterance {
    pub fn new(text: impl Into<String>, source: UtteranceSource) -> Self {
        Self {
            text: text.into(),
            source,
        }
    }

    pub fn manual(text: impl Into<String>) -> Self {
        Self::new(text, UtteranceSource::Manual)
    }

    pub fn voice(text: impl Into<String>) -> Self {
        Self::new(text, UtteranceSource::Voice)
    }
}
