//! # Transcript Decisions
//!
//! The UI-independent half of the transcript: given the message snapshot and
//! the observed flags, decide *what* to show. The TUI decides *how*.
//!
//! ```text
//!  messages.len() == 0 && !is_loading   →  Empty(copy)
//!  otherwise                            →  List { rows, composing: is_loading }
//! ```
//!
//! The composing row is never part of `rows`; it is a flag the view renders
//! after the last real row.

use crate::core::message::{Message, Origin};
use crate::core::status::ThreadState;

/// Copy shown when there is nothing to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyCopy {
    /// Thread is idle: invite the user to start.
    NewChat,
    /// A channel is open but has no history.
    NoHistory,
    /// No channel selected yet.
    SelectSession,
}

impl EmptyCopy {
    pub fn title(self) -> &'static str {
        match self {
            EmptyCopy::NewChat => "Start a new chat",
            EmptyCopy::NoHistory => "No conversation history",
            EmptyCopy::SelectSession => "Select a session",
        }
    }

    pub fn hint(self) -> &'static str {
        match self {
            EmptyCopy::NewChat => "Type a message below to start chatting.",
            EmptyCopy::NoHistory => "Try typing a message below.",
            EmptyCopy::SelectSession => {
                "Pass --channel to open an existing session, or send a message to start a new one."
            }
        }
    }
}

/// Which edge a row hugs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl From<Origin> for Side {
    fn from(origin: Origin) -> Self {
        match origin {
            Origin::Human => Side::Right,
            Origin::Ai => Side::Left,
        }
    }
}

/// How a row's content is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowContent<'a> {
    /// Formatted text (markdown).
    Formatted,
    /// Handed to the structured dispatcher under this tag.
    Structured(&'a str),
}

/// Render plan for one message.
#[derive(Debug, Clone, PartialEq)]
pub struct Row<'a> {
    /// Position in the input sequence.
    pub index: usize,
    pub message: &'a Message,
    pub side: Side,
    pub content: RowContent<'a>,
    pub progress: Option<String>,
}

impl<'a> Row<'a> {
    pub fn new(index: usize, message: &'a Message) -> Self {
        let content = match message.component() {
            Some(tag) => RowContent::Structured(tag),
            None => RowContent::Formatted,
        };
        Self {
            index,
            message,
            side: Side::from(message.origin),
            content,
            progress: message.progress_label(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptView<'a> {
    Empty(EmptyCopy),
    List { rows: Vec<Row<'a>>, composing: bool },
}

/// Decide between the empty state and the list.
pub fn plan<'a>(
    messages: &'a [Message],
    is_loading: bool,
    thread_state: Option<ThreadState>,
    channel_id: Option<&str>,
) -> TranscriptView<'a> {
    if messages.is_empty() && !is_loading {
        let copy = if thread_state == Some(ThreadState::Idle) {
            EmptyCopy::NewChat
        } else if channel_id.is_some() {
            EmptyCopy::NoHistory
        } else {
            EmptyCopy::SelectSession
        };
        return TranscriptView::Empty(copy);
    }

    let rows = messages
        .iter()
        .enumerate()
        .map(|(index, message)| Row::new(index, message))
        .collect();

    TranscriptView::List {
        rows,
        composing: is_loading,
    }
}
