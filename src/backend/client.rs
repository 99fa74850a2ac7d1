use std::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc::Sender;

use super::types::{FeedEvent, SendReply, SendRequest};

/// Errors that can occur while talking to the backend.
#[derive(Debug)]
pub enum BackendError {
    /// Network-level failure (timeout, DNS, connection refused). Retryable.
    Network(String),
    /// Backend returned an error response.
    Api { status: u16, message: String },
    /// Failed to parse the backend's response.
    Parse(String),
    /// The receiving side of the feed went away. Not retryable.
    ChannelClosed,
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Network(msg) => write!(f, "network error: {msg}"),
            BackendError::Api { status, message } => {
                write!(f, "server error (HTTP {status}): {message}")
            }
            BackendError::Parse(msg) => write!(f, "parse error: {msg}"),
            BackendError::ChannelClosed => write!(f, "channel closed"),
        }
    }
}

impl std::error::Error for BackendError {}

#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Hand a message to the backend. `Ok(reply.success)` says whether it was
    /// accepted for processing, not whether a reply was produced.
    async fn send(&self, request: SendRequest<'_>) -> Result<SendReply, BackendError>;

    /// Fire-and-forget presence notification.
    async fn set_typing(&self, channel_id: &str, typing: bool) -> Result<(), BackendError>;

    /// Stream feed events for a channel into `sender` until the stream ends.
    async fn stream_events(
        &self,
        channel_id: &str,
        sender: Sender<FeedEvent>,
    ) -> Result<(), BackendError>;
}
