//! Client for a remote `/api/process-text` endpoint

use super::wire::{to_chat_history, ErrorResponse, ProcessTextRequest, ProcessTextResponse};
use super::{BackendError, BackendReply, BackendRequest, InferenceBackend};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

pub const PROCESS_TEXT_PATH: &str = "/api/process-text";

const UNKNOWN_SERVER_ERROR: &str = "Unknown server error.";

/// Backend that forwards each turn to an HTTP service
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Use a preconfigured client (timeouts, proxies)
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, PROCESS_TEXT_PATH)
    }
}

#[async_trait]
impl InferenceBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn generate(&self, request: &BackendRequest) -> Result<BackendReply, BackendError> {
        let body = ProcessTextRequest {
            user_text: request.text.clone(),
            persona: request.persona.clone(),
            chat_history: to_chat_history(&request.context),
        };

        debug!(
            "POST {} ({} context turns)",
            self.endpoint(),
            body.chat_history.len()
        );

        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|err| BackendError::transport(err.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| BackendError::transport(err.to_string()))?;

        if !status.is_success() {
            warn!("Inference service returned {}", status);
            return Err(map_error_body(status.as_u16(), &text));
        }

        let parsed: ProcessTextResponse = serde_json::from_str(&text).map_err(|err| {
            BackendError::new("Malformed response from the inference service.")
                .with_details(err.to_string())
                .with_status(status.as_u16())
        })?;

        if parsed.response_text.trim().is_empty() {
            return Err(BackendError::empty_response().with_status(status.as_u16()));
        }

        Ok(BackendReply::new(parsed.response_text))
    }
}

fn map_error_body(status: u16, body: &str) -> BackendError {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(parsed) => {
            let message = if parsed.error.trim().is_empty() {
                UNKNOWN_SERVER_ERROR.to_string()
            } else {
                parsed.error
            };
            let mut err = BackendError::new(message).with_status(status);
            err.details = parsed.details;
            err
        }
        Err(_) => BackendError::new(UNKNOWN_SERVER_ERROR)
            .with_details(body.to_string())
            .with_status(status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let backend = HttpBackend::new("http://localhost:3000/");
        assert_eq!(backend.base_url(), "http://localhost:3000");
        assert_eq!(
            backend.endpoint(),
            "http://localhost:3000/api/process-text"
        );
    }

    #[test]
    fn test_map_error_body_with_details() {
        let err = map_error_body(500, r#"{"error":"AI Error","details":"bad key"}"#);
        assert_eq!(err.message, "AI Error");
        assert_eq!(err.details.as_deref(), Some("bad key"));
        assert_eq!(err.status, Some(500));
    }

    #[test]
    fn test_map_error_body_not_json() {
        let err = map_error_body(502, "<html>Bad Gateway</html>");
        assert_eq!(err.message, UNKNOWN_SERVER_ERROR);
        assert_eq!(err.status, Some(502));
    }
}
