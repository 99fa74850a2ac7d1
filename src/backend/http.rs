//! JSON-over-HTTP backend with an SSE event feed.

use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, info, warn};
use tokio::sync::mpsc::Sender;

use super::client::{BackendError, ChatBackend};
use super::sse::SseDecoder;
use super::types::{FeedEvent, SendBody, SendReply, SendRequest, TypingBody};

pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

async fn api_error(response: reqwest::Response) -> BackendError {
    let status = response.status().as_u16();
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown error".to_string());
    warn!("Backend error: {} - {}", status, message);
    BackendError::Api { status, message }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn send(&self, request: SendRequest<'_>) -> Result<SendReply, BackendError> {
        let body = SendBody {
            content: request.content,
            user_id: request.user_id,
            channel_id: request.channel_id,
            client_message_id: uuid::Uuid::new_v4().to_string(),
        };
        info!(
            "Sending message: channel={:?}, len={}, id={}",
            body.channel_id,
            body.content.len(),
            body.client_message_id
        );

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let text = response
            .text()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;
        if text.trim().is_empty() {
            return Ok(SendReply {
                success: true,
                channel_id: None,
            });
        }
        serde_json::from_str(&text).map_err(|e| BackendError::Parse(e.to_string()))
    }

    async fn set_typing(&self, channel_id: &str, typing: bool) -> Result<(), BackendError> {
        debug!("Typing signal: channel={}, typing={}", channel_id, typing);
        let response = self
            .client
            .post(format!("{}/channels/{}/typing", self.base_url, channel_id))
            .json(&TypingBody { typing })
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(())
    }

    async fn stream_events(
        &self,
        channel_id: &str,
        sender: Sender<FeedEvent>,
    ) -> Result<(), BackendError> {
        info!("Opening event feed for channel {}", channel_id);
        let response = self
            .client
            .get(format!("{}/channels/{}/events", self.base_url, channel_id))
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        if sender.send(FeedEvent::Opened).await.is_err() {
            return Err(BackendError::ChannelClosed);
        }

        let mut decoder = SseDecoder::new();
        let mut stream = response.bytes_stream();
        let mut delivered = 0usize;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| BackendError::Network(e.to_string()))?;

            for raw in decoder.push(&chunk) {
                let event = match FeedEvent::decode(&raw.event, &raw.data) {
                    Ok(Some(event)) => event,
                    Ok(None) => {
                        debug!("Ignoring feed event '{}'", raw.event);
                        continue;
                    }
                    Err(e) => {
                        warn!("Malformed '{}' event skipped: {}", raw.event, e);
                        continue;
                    }
                };
                if sender.send(event).await.is_err() {
                    warn!("Feed receiver dropped");
                    return Err(BackendError::ChannelClosed);
                }
                delivered += 1;
            }
        }

        info!("Event feed ended after {} events", delivered);
        Ok(())
    }
}
