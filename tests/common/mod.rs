//! Shared test backends

#![allow(dead_code)]

use async_trait::async_trait;
use inner_voice::backend::{BackendError, BackendReply, BackendRequest, InferenceBackend};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Semaphore;

/// Replies from a script and records every request it sees
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<BackendReply, BackendError>>>,
    requests: Mutex<Vec<BackendRequest>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: &str) -> Self {
        self.replies.lock().push_back(Ok(BackendReply::new(text)));
        self
    }

    pub fn fail(self, error: BackendError) -> Self {
        self.replies.lock().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<BackendRequest> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl InferenceBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &BackendRequest) -> Result<BackendReply, BackendError> {
        self.requests.lock().push(request.clone());
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::new("script exhausted")))
    }
}

/// Holds every call until the test releases it
pub struct GatedBackend {
    gate: Semaphore,
    calls: AtomicUsize,
    reply: String,
}

impl GatedBackend {
    pub fn new(reply: &str) -> Self {
        Self {
            gate: Semaphore::new(0),
            calls: AtomicUsize::new(0),
            reply: reply.to_string(),
        }
    }

    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InferenceBackend for GatedBackend {
    fn name(&self) -> &str {
        "gated"
    }

    async fn generate(&self, _request: &BackendRequest) -> Result<BackendReply, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| BackendError::transport(e.to_string()))?;
        permit.forget();
        Ok(BackendReply::new(self.reply.clone()))
    }
}

/// Never answers
pub struct HangingBackend;

#[async_trait]
impl InferenceBackend for HangingBackend {
    fn name(&self) -> &str {
        "hanging"
    }

    async fn generate(&self, _request: &BackendRequest) -> Result<BackendReply, BackendError> {
        std::future::pending::<Result<BackendReply, BackendError>>().await
    }
}
