use log::debug;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::core::message::Message;
use crate::core::status::{ProcessStatus, ThreadState};

/// Everything the backend needs to accept a message.
#[derive(Debug, Clone, Copy)]
pub struct SendRequest<'a> {
    pub content: &'a str,
    pub user_id: Option<&'a str>,
    /// `None` lets the backend open a new channel.
    pub channel_id: Option<&'a str>,
}

fn accepted_by_default() -> bool {
    true
}

/// Backend answer to a send.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SendReply {
    #[serde(default = "accepted_by_default")]
    pub success: bool,
    #[serde(default)]
    pub channel_id: Option<String>,
}

/// Request body for `POST /messages`.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SendBody<'a> {
    pub content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<&'a str>,
    pub client_message_id: String,
}

/// Request body for `POST /channels/{id}/typing`.
#[derive(Serialize, Debug)]
pub(crate) struct TypingBody {
    pub typing: bool,
}

/// One decoded event from the feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// The server accepted the subscription; events follow.
    Opened,
    /// Full history; replaces the transcript.
    Snapshot(Vec<Message>),
    /// One new message, appended.
    Message(Message),
    Loading(bool),
    ThreadState(ThreadState),
    Status {
        process_status: Option<ProcessStatus>,
        input_disabled: Option<bool>,
    },
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct LoadingData {
    is_loading: bool,
}

#[derive(Deserialize, Debug)]
struct ThreadStateData {
    state: ThreadState,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct StatusData {
    #[serde(default, deserialize_with = "known_stage")]
    process_status: Option<ProcessStatus>,
    #[serde(default)]
    input_disabled: Option<bool>,
}

/// An unrecognised stage is treated as absent, so the rest of the status
/// update still applies.
fn known_stage<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<ProcessStatus>, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    if raw.is_null() {
        return Ok(None);
    }
    Ok(serde_json::from_value(raw)
        .map_err(|e| debug!("Ignoring process status: {}", e))
        .ok())
}

impl FeedEvent {
    /// Decode an SSE event by name. Unknown names yield `Ok(None)`.
    pub fn decode(event: &str, data: &str) -> Result<Option<Self>, serde_json::Error> {
        let decoded = match event {
            "message" => FeedEvent::Message(Message::from_wire(serde_json::from_str(data)?)),
            "snapshot" => {
                let entries: Vec<Value> = serde_json::from_str(data)?;
                FeedEvent::Snapshot(entries.into_iter().map(Message::from_wire).collect())
            }
            "loading" => {
                let d: LoadingData = serde_json::from_str(data)?;
                FeedEvent::Loading(d.is_loading)
            }
            "thread_state" => {
                let d: ThreadStateData = serde_json::from_str(data)?;
                FeedEvent::ThreadState(d.state)
            }
            "status" => {
                let d: StatusData = serde_json::from_str(data)?;
                FeedEvent::Status {
                    process_status: d.process_status,
                    input_disabled: d.input_disabled,
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(decoded))
    }
}
