//! # Scroll Follow
//!
//! Decides whether the transcript should chase new content.
//!
//! Two inputs drive it:
//! - **Scroll events** (user action): recompute the intent from the live
//!   position. Within `threshold` rows of the bottom counts as following.
//! - **Content changes** (new rows, loading toggled, height changed): when
//!   following, ask the view to jump to the bottom. When scrolled away, do
//!   nothing. Message arrival never changes the intent itself.
//!
//! Seeing the same content twice produces no action, so re-rendering an
//! unchanged transcript never moves the view.

/// Default distance from the bottom (in rows) still treated as "at bottom".
pub const DEFAULT_THRESHOLD: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollIntent {
    Following,
    ScrolledAway,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAction {
    Stay,
    ToBottom,
}

/// Summary of rendered content, compared between frames to detect change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContentMark {
    pub rows: usize,
    pub composing: bool,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct ScrollFollow {
    threshold: u16,
    intent: ScrollIntent,
    last_mark: Option<ContentMark>,
}

impl Default for ScrollFollow {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl ScrollFollow {
    pub fn new(threshold: u16) -> Self {
        Self {
            threshold,
            intent: ScrollIntent::Following,
            last_mark: None,
        }
    }

    pub fn intent(&self) -> ScrollIntent {
        self.intent
    }

    pub fn is_following(&self) -> bool {
        self.intent == ScrollIntent::Following
    }

    /// Recompute intent after the user scrolled.
    pub fn on_scroll(&mut self, offset: u16, viewport_height: u16, content_height: u16) {
        let distance = content_height.saturating_sub(offset.saturating_add(viewport_height));
        self.intent = if distance > self.threshold {
            ScrollIntent::ScrolledAway
        } else {
            ScrollIntent::Following
        };
    }

    /// Explicit "jump to latest" from the user.
    pub fn follow(&mut self) {
        self.intent = ScrollIntent::Following;
    }

    /// Report the content rendered this frame.
    pub fn on_content(&mut self, mark: ContentMark) -> ScrollAction {
        if self.last_mark == Some(mark) {
            return ScrollAction::Stay;
        }
        self.last_mark = Some(mark);
        match self.intent {
            ScrollIntent::Following => ScrollAction::ToBottom,
            ScrollIntent::ScrolledAway => ScrollAction::Stay,
        }
    }

    /// Forget the last content mark so the next render is treated as new
    /// content. The intent is kept.
    pub fn forget_content(&mut self) {
        self.last_mark = None;
    }
}
