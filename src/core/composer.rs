//! # Composer
//!
//! Draft text and the submit protocol, independent of any widget.
//!
//! Submitting is a two-phase transition:
//!
//! ```text
//!  begin_submit()  → draft cleared now, Submission handed to the sender
//!  send finishes   → accepted: nothing
//!                    rejected / failed: restore(text) puts it back
//! ```
//!
//! The composer never queues or serializes sends; every submission is
//! independent.

use std::time::{Duration, Instant};

use crate::core::status::ConnectionState;

/// Minimum spacing between repeated "typing" signals during continuous edits.
pub const TYPING_REFIRE: Duration = Duration::from_secs(3);

/// Fire-and-forget presence notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Typing,
    StoppedTyping,
}

/// External conditions that can block input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Gate {
    pub disabled: bool,
    pub connection: ConnectionState,
}

impl Gate {
    pub fn blocks_submit(&self) -> bool {
        self.disabled || self.connection.is_busy()
    }
}

/// Text taken out of the draft and on its way to the sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub text: String,
}

#[derive(Debug, Default)]
pub struct Composer {
    draft: String,
    last_typing: Option<Instant>,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Direct access for the editing widget. Call [`Composer::edited`] after.
    pub fn draft_mut(&mut self) -> &mut String {
        &mut self.draft
    }

    /// Record an edit and decide whether to signal "typing".
    ///
    /// Fires on the empty → non-empty transition and then at most once per
    /// [`TYPING_REFIRE`] while edits continue.
    pub fn edited(&mut self, disabled: bool, now: Instant) -> Option<Presence> {
        if self.draft.is_empty() {
            self.last_typing = None;
            return None;
        }
        if disabled {
            return None;
        }
        let due = self
            .last_typing
            .is_none_or(|last| now.saturating_duration_since(last) >= TYPING_REFIRE);
        if due {
            self.last_typing = Some(now);
            Some(Presence::Typing)
        } else {
            None
        }
    }

    /// Focus left the input.
    pub fn blur(&mut self) -> Presence {
        self.last_typing = None;
        Presence::StoppedTyping
    }

    /// Phase one: take the trimmed draft if submission is allowed.
    ///
    /// Returns `None` (and leaves the draft alone) when the trimmed text is
    /// empty or the gate blocks. Otherwise the draft is cleared before the
    /// caller sends anything.
    pub fn begin_submit(&mut self, gate: Gate) -> Option<Submission> {
        let text = self.draft.trim();
        if text.is_empty() || gate.blocks_submit() {
            return None;
        }
        let text = text.to_string();
        self.draft.clear();
        self.last_typing = None;
        Some(Submission { text })
    }

    /// Phase two, failure branch: give the user their text back.
    ///
    /// If something new was typed while the send was in flight, the restored
    /// text goes first, separated by a newline.
    pub fn restore(&mut self, text: &str) {
        if self.draft.is_empty() {
            self.draft = text.to_string();
        } else {
            self.draft = format!("{text}\n{}", self.draft);
        }
    }
}
