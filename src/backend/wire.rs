//! JSON shapes of the `/api/process-text` exchange

use crate::session::types::{Role, Turn};
use serde::{Deserialize, Serialize};

/// Request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessTextRequest {
    #[serde(default)]
    pub user_text: String,
    #[serde(default)]
    pub persona: String,
    #[serde(default)]
    pub chat_history: Vec<ChatContent>,
}

/// One entry of `chatHistory`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatContent {
    pub role: String,
    pub parts: Vec<ChatPart>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatPart {
    pub text: String,
}

impl ChatContent {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role: role.wire_name().to_string(),
            parts: vec![ChatPart { text: text.into() }],
        }
    }

    /// All part texts joined
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .map(|part| part.text.as_str())
            .collect::<Vec<_>>()
            .join("")
    }
}

impl From<&Turn> for ChatContent {
    fn from(turn: &Turn) -> Self {
        ChatContent::new(turn.role, turn.text.clone())
    }
}

/// Success body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessTextResponse {
    pub response_text: String,
}

/// Failure body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Convert a replay context to its wire form
pub fn to_chat_history(context: &[Turn]) -> Vec<ChatContent> {
    context.iter().map(ChatContent::from).collect()
}

/// Convert wire history back to turns, dropping entries without text
pub fn from_chat_history(history: &[ChatContent], persona: &str) -> Vec<Turn> {
    history
        .iter()
        .filter_map(|content| {
            let text = content.text();
            if text.trim().is_empty() {
                return None;
            }
            let turn = match Role::from_wire(&content.role) {
                Role::Assistant => Turn::assistant(text, persona),
                Role::User => Turn::user(
                    text,
                    persona,
                    crate::session::types::UtteranceSource::Manual,
                ),
            };
            Some(turn)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::types::UtteranceSource;
    use serde_json::json;

    #[test]
    fn test_request_shape() {
        let context = vec![
            Turn::user("hi", "Motivator", UtteranceSource::Voice),
            Turn::assistant("hello", "Motivator"),
        ];
        let request = ProcessTextRequest {
            user_text: "I feel stuck".to_string(),
            persona: "Philosopher".to_string(),
            chat_history: to_chat_history(&context),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "userText": "I feel stuck",
                "persona": "Philosopher",
                "chatHistory": [
                    {"role": "user", "parts": [{"text": "hi"}]},
                    {"role": "model", "parts": [{"text": "hello"}]}
                ]
            })
        );
    }

    #[test]
    fn test_missing_fields_default() {
        let request: ProcessTextRequest = serde_json::from_value(json!({})).unwrap();
        assert!(request.user_text.is_empty());
        assert!(request.chat_history.is_empty());
    }

    #[test]
    fn test_error_body_without_details() {
        let body: ErrorResponse = serde_json::from_value(json!({"error": "AI Error"})).unwrap();
        assert_eq!(body.error, "AI Error");
        assert!(body.details.is_none());
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({"error": "AI Error"}));
    }

    #[test]
    fn test_from_chat_history_drops_empty_and_maps_roles() {
        let history = vec![
            ChatContent::new(Role::User, "question"),
            ChatContent {
                role: "model".to_string(),
                parts: vec![],
            },
            ChatContent::new(Role::Assistant, "answer"),
        ];

        let turns = from_chat_history(&history, "Philosopher");
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[1].role, Role::Assistant);
        assert_eq!(turns[1].text, "answer");
        assert!(turns.iter().all(|t| t.persona == "Philosopher"));
    }

    #[test]
    fn test_multi_part_text_joined() {
        let content = ChatContent {
            role: "user".to_string(),
            parts: vec![
                ChatPart {
                    text: "a".to_string(),
                },
                ChatPart {
                    text: "b".to_string(),
                },
            ],
        };
        assert_eq!(content.text(), "ab");
    }
}
