//! Application configuration
//!
//! Loaded from an optional TOML file, then overridden by environment
//! variables. Every section has working defaults.

use crate::backend::gemini::{DEFAULT_GEMINI_MODEL, DEFAULT_TEMPERATURE};
use crate::backend::{GeminiBackend, HttpBackend, InferenceBackend, DEFAULT_PERSONA};
use crate::history::{FileStorage, DEFAULT_HISTORY_KEY};
use crate::{InnerVoiceError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_PORT: &str = "PORT";
pub const ENV_BACKEND_URL: &str = "INNER_VOICE_BACKEND_URL";

/// Which inference backend the session talks to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Remote `/api/process-text` service
    #[default]
    Http,
    /// Gemini REST API directly
    Gemini,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,

    /// Base URL of the `/api/process-text` service
    pub url: String,

    /// Gemini API key (required for the Gemini backend)
    pub api_key: Option<String>,

    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Per-turn deadline in seconds; unset waits indefinitely
    pub request_timeout_secs: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Http,
            url: "http://localhost:3000".to_string(),
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            request_timeout_secs: None,
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Gemini backend from this configuration
    pub fn gemini(&self) -> Result<GeminiBackend> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                InnerVoiceError::Config(format!(
                    "Gemini API key missing (set {} or backend.api_key)",
                    ENV_GEMINI_API_KEY
                ))
            })?;
        Ok(GeminiBackend::new(api_key)
            .with_model(&self.model)
            .with_temperature(self.temperature))
    }

    /// Backend selected by `kind`
    pub fn build(&self) -> Result<Arc<dyn InferenceBackend>> {
        match self.kind {
            BackendKind::Http => Ok(Arc::new(HttpBackend::new(&self.url))),
            BackendKind::Gemini => Ok(Arc::new(self.gemini()?)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Directory for the history blob; platform data dir when unset
    pub dir: Option<PathBuf>,

    /// Logical key the blob is stored under
    pub key: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            dir: None,
            key: DEFAULT_HISTORY_KEY.to_string(),
        }
    }
}

impl HistoryConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("inner-voice")
        })
    }

    pub fn storage(&self) -> FileStorage {
        FileStorage::new(self.resolved_dir())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub default_persona: String,

    /// Also voice responses through the presentation sink
    pub speak_responses: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_persona: DEFAULT_PERSONA.to_string(),
            speak_responses: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| InnerVoiceError::Config(format!("Invalid server address: {}", e)))
    }
}

/// Configuration for the whole application
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub history: HistoryConfig,
    pub session: SessionConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Parse a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| InnerVoiceError::Config(format!("Invalid config: {}", e)))
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            InnerVoiceError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Load `path` if given, else defaults; then apply the environment
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.with_env_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from a variable lookup
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_GEMINI_API_KEY) {
            self.backend.api_key = Some(key);
        }
        if let Some(url) = lookup(ENV_BACKEND_URL) {
            self.backend.url = url;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.server.port = port
                .parse()
                .map_err(|_| InnerVoiceError::Config(format!("Invalid {}: {}", ENV_PORT, port)))?;
        }
        Ok(self)
    }

    pub fn with_backend_kind(mut self, kind: BackendKind) -> Self {
        self.backend.kind = kind;
        self
    }

    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.session.default_persona = persona.into();
        self
    }

    pub fn with_history_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.history.dir = Some(dir.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.server.port = port;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        // Whole seconds, rounded up so a short deadline never becomes zero
        self.backend.request_timeout_secs =
            timeout.map(|d| d.as_secs() + u64::from(d.subsec_nanos() > 0));
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.session.default_persona.trim().is_empty() {
            return Err(InnerVoiceError::Config(
                "Default persona must not be empty".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.backend.temperature) {
            return Err(InnerVoiceError::Config(format!(
                "Temperature must be within 0.0..=2.0, got {}",
                self.backend.temperature
            )));
        }

        if self.backend.request_timeout_secs == Some(0) {
            return Err(InnerVoiceError::Config(
                "Request timeout must be at least one second".to_string(),
            ));
        }

        if self.history.key.trim().is_empty() {
            return Err(InnerVoiceError::Config(
                "History key must not be empty".to_string(),
            ));
        }

        match self.backend.kind {
            BackendKind::Gemini => {
                self.backend.gemini()?;
            }
            BackendKind::Http => {
                if self.backend.url.trim().is_empty() {
                    return Err(InnerVoiceError::Config(
                        "Backend URL is required".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }
}
