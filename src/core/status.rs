//! # Session Status Enums
//!
//! Lifecycle values observed from the backend. Parlor reads these, it
//! never drives them.

use serde::{Deserialize, Serialize};

/// Lifecycle phase of the conversation thread.
///
/// Only `Idle` changes what the transcript shows; every other value is
/// treated the same way.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThreadState {
    Idle,
    CreatingThread,
    Connecting,
    Active,
    Waiting,
    Completed,
    Error,
    #[serde(other)]
    Unknown,
}

/// State of the connection to the event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    CreatingThread,
    Connecting,
    Reconnecting,
    Connected,
}

impl ConnectionState {
    /// The three in-progress states that block submission.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            ConnectionState::CreatingThread
                | ConnectionState::Connecting
                | ConnectionState::Reconnecting
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "offline",
            ConnectionState::CreatingThread => "creating thread",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::Connected => "live",
        }
    }
}

/// Which stage of the analysis workflow the backend is in.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessStatus {
    #[default]
    Idle,
    Requirement,
    Data,
    Analysis,
    Report,
    Done,
}

impl ProcessStatus {
    /// Input placeholder for this stage.
    pub fn placeholder(self) -> &'static str {
        match self {
            ProcessStatus::Idle => "Ask anything to start a new analysis",
            ProcessStatus::Requirement => "Describe what you want to find out",
            ProcessStatus::Data => "Enter a data source URL, or drop files on the upload card",
            ProcessStatus::Analysis => "Ask a follow-up question about the analysis",
            ProcessStatus::Report => "Request changes to the report",
            ProcessStatus::Done => "Start a new request",
        }
    }
}
