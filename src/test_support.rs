//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc::Sender;

use crate::backend::{BackendError, ChatBackend, FeedEvent, SendReply, SendRequest};
use crate::core::state::App;

#[derive(Clone, Copy)]
enum Script {
    Accept,
    Reject,
    Fail,
}

/// A backend whose `send` answers from a fixed script and records what it got.
pub struct ScriptedBackend {
    script: Script,
    sent: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    fn new(script: Script) -> Self {
        Self {
            script,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn accepting() -> Self {
        Self::new(Script::Accept)
    }

    pub fn rejecting() -> Self {
        Self::new(Script::Reject)
    }

    pub fn failing() -> Self {
        Self::new(Script::Fail)
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn send(&self, request: SendRequest<'_>) -> Result<SendReply, BackendError> {
        self.sent.lock().unwrap().push(request.content.to_string());
        match self.script {
            Script::Accept => Ok(SendReply {
                success: true,
                channel_id: None,
            }),
            Script::Reject => Ok(SendReply {
                success: false,
                channel_id: None,
            }),
            Script::Fail => Err(BackendError::Network("connection refused".into())),
        }
    }

    async fn set_typing(&self, _channel_id: &str, _typing: bool) -> Result<(), BackendError> {
        Ok(())
    }

    async fn stream_events(
        &self,
        _channel_id: &str,
        _sender: Sender<FeedEvent>,
    ) -> Result<(), BackendError> {
        Ok(())
    }
}

/// Creates a test App bound to `test-channel`.
pub fn test_app() -> App {
    App::new(Some("test-channel".to_string()), Some("tester".to_string()))
}
