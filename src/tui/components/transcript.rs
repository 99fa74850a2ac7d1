//! # Transcript Component
//!
//! Scrollable view of the conversation, or the empty state when there is
//! nothing to show.
//!
//! ## Architecture
//!
//! `Transcript` is a transient component (created each frame) that wraps
//! `&'a mut TranscriptState` (persistent) and a [`TranscriptView`] planned
//! by the core (props). Rows are measured through a [`LayoutCache`] and only
//! the rows near the viewport are drawn.
//!
//! ## Follow-the-bottom
//!
//! Scroll events update [`ScrollFollow`]'s intent. Each render reports a
//! [`ContentMark`]; when the content changed and the intent is `Following`,
//! the view jumps to the very bottom, below the composing row. When the user
//! has scrolled away, nothing moves and the status bar shows "↓ New".
//!
//! ## Window
//!
//! Heights are tracked in `u32`, but the scroll view addresses rows with
//! `u16`. When the transcript is taller than that, only the newest rows that
//! fit are scrollable: the window is anchored to the tail, so the latest
//! message and the composing row are always reachable.

use ratatui::Frame;
use ratatui::layout::{Position, Rect, Size};
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::core::scroll::{ContentMark, ScrollAction, ScrollFollow};
use crate::core::transcript::TranscriptView;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::composing::{self, ComposingIndicator};
use crate::tui::components::empty_state::EmptyState;
use crate::tui::components::message::MessageBubble;
use crate::tui::components::structured::StructuredRegistry;
use crate::tui::event::TuiEvent;

/// Tallest content the scroll view can address.
const MAX_WINDOW_HEIGHT: u32 = u16::MAX as u32;

fn to_window(y: u32) -> u16 {
    u16::try_from(y).unwrap_or(u16::MAX)
}

/// Scroll, selection and layout state for the transcript.
/// Lives in `TuiState` across frames.
pub struct TranscriptState {
    /// Offset relative to `window_top`.
    pub scroll_state: ScrollViewState,
    pub layout: LayoutCache,
    pub follow: ScrollFollow,
    /// Row driven by the keyboard in cursor mode (or clicked).
    pub selected: Option<usize>,
    pub hovered: Option<usize>,
    /// Content below the viewport while scrolled away.
    pub has_unseen: bool,
    pub viewport_height: u16,
    /// Height of the scrollable window, composing row included.
    pub content_height: u16,
    /// First row inside the window.
    pub window_start: usize,
    /// Content-space y of `window_start`.
    pub window_top: u32,
}

impl TranscriptState {
    pub fn new(scroll_threshold: u16) -> Self {
        Self {
            scroll_state: ScrollViewState::default(),
            layout: LayoutCache::new(),
            follow: ScrollFollow::new(scroll_threshold),
            selected: None,
            hovered: None,
            has_unseen: false,
            viewport_height: 0,
            content_height: 0,
            window_start: 0,
            window_top: 0,
        }
    }

    /// Forget layout and selection; the message sequence was replaced.
    /// Where the user has scrolled to is kept.
    pub fn reset(&mut self) {
        self.layout.invalidate();
        self.follow.forget_content();
        self.selected = None;
        self.hovered = None;
    }

    /// Content-space y of the top of the viewport.
    pub fn absolute_offset(&self) -> u32 {
        self.window_top + u32::from(self.scroll_state.offset().y)
    }

    fn max_offset(&self) -> u16 {
        self.content_height.saturating_sub(self.viewport_height)
    }

    fn scroll_to_end(&mut self) {
        self.scroll_state.set_offset(Position {
            x: 0,
            y: self.max_offset(),
        });
    }

    fn clamp_scroll(&mut self) {
        let max_y = self.max_offset();
        let current = self.scroll_state.offset();
        if current.y > max_y {
            self.scroll_state.set_offset(Position { x: current.x, y: max_y });
        }
    }

    fn report_scroll(&mut self) {
        self.clamp_scroll();
        self.follow.on_scroll(
            self.scroll_state.offset().y,
            self.viewport_height,
            self.content_height,
        );
    }

    /// Move the window to start at `start`, keeping the viewport where it
    /// is in content space.
    fn move_window(&mut self, start: usize, top: u32) {
        if top == self.window_top {
            self.window_start = start;
            return;
        }
        let absolute = self.absolute_offset();
        self.window_start = start;
        self.window_top = top;
        self.scroll_state.set_offset(Position {
            x: 0,
            y: to_window(absolute.saturating_sub(top)),
        });
    }

    /// Move the selection up one row, starting from the last row. Rows
    /// before the window cannot be selected.
    pub fn select_prev(&mut self, row_count: usize) {
        if row_count == 0 {
            return;
        }
        self.selected = Some(match self.selected {
            Some(i) => i.saturating_sub(1).max(self.window_start).min(row_count - 1),
            None => row_count - 1,
        });
        self.scroll_to_selected();
    }

    pub fn select_next(&mut self, row_count: usize) {
        if let Some(i) = self.selected
            && i + 1 < row_count
        {
            self.selected = Some(i + 1);
            self.scroll_to_selected();
        }
    }

    /// Scroll so the selected row is fully visible (top-aligned if taller
    /// than the viewport).
    pub fn scroll_to_selected(&mut self) {
        let Some(idx) = self.selected.filter(|&i| i >= self.window_start) else {
            return;
        };
        let Some(&bottom) = self.layout.prefix_heights.get(idx) else {
            return;
        };
        let top = self.layout.row_top(idx).saturating_sub(self.window_top);
        let bottom = bottom.saturating_sub(self.window_top);
        let offset = u32::from(self.scroll_state.offset().y);
        let viewport = u32::from(self.viewport_height);

        if top < offset {
            self.scroll_state.set_offset(Position { x: 0, y: to_window(top) });
        } else if bottom > offset + viewport {
            let y = bottom.saturating_sub(viewport).min(top);
            self.scroll_state.set_offset(Position { x: 0, y: to_window(y) });
        }
        self.report_scroll();
    }
}

impl EventHandler for TranscriptState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::ScrollUp => self.scroll_state.scroll_up(),
            TuiEvent::ScrollDown => self.scroll_state.scroll_down(),
            TuiEvent::ScrollPageUp => self.scroll_state.scroll_page_up(),
            TuiEvent::ScrollPageDown => self.scroll_state.scroll_page_down(),
            TuiEvent::ScrollToBottom => {
                self.follow.follow();
                self.scroll_to_end();
                return None;
            }
            _ => return None,
        }
        self.report_scroll();
        None
    }
}

pub struct Transcript<'a> {
    pub state: &'a mut TranscriptState,
    pub view: &'a TranscriptView<'a>,
    pub registry: &'a StructuredRegistry,
    pub time_format: &'a str,
    pub spinner_frame: usize,
}

impl Component for Transcript<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let (rows, composing) = match self.view {
            TranscriptView::Empty(copy) => {
                EmptyState { copy: *copy }.render(frame, area);
                self.state.has_unseen = false;
                self.state.viewport_height = area.height;
                self.state.content_height = 0;
                self.state.move_window(0, 0);
                return;
            }
            TranscriptView::List { rows, composing } => (rows, *composing),
        };

        // 1px right for the scrollbar.
        let content_width = area.width.saturating_sub(1);

        let layout = &mut self.state.layout;
        let reusable = layout.reusable_count(rows.len(), content_width);
        layout.heights.truncate(reusable);
        for row in rows.iter().skip(layout.heights.len()) {
            let bubble = MessageBubble::new(row, self.registry, self.time_format);
            layout.heights.push(bubble.height(content_width));
        }
        layout.rebuild_prefix_heights();
        layout.update_metadata(rows.len(), content_width);

        let rows_height = layout.total();
        let composing_height = if composing { composing::HEIGHT } else { 0 };
        let full_height = rows_height + u32::from(composing_height);
        let (window_start, window_top) = layout.tail_window(full_height);
        self.state.move_window(window_start, window_top);
        let window_height = to_window(full_height - window_top);

        let resized = self.state.viewport_height != area.height;
        self.state.viewport_height = area.height;
        self.state.content_height = window_height;

        let mark = ContentMark {
            rows: rows.len(),
            composing,
            height: full_height,
        };
        match self.state.follow.on_content(mark) {
            ScrollAction::ToBottom => self.state.scroll_to_end(),
            ScrollAction::Stay if resized && self.state.follow.is_following() => {
                self.state.scroll_to_end()
            }
            ScrollAction::Stay => self.state.clamp_scroll(),
        }

        let visible = self
            .state
            .layout
            .visible_range(self.state.absolute_offset(), area.height);

        let mut scroll_view = ScrollView::new(Size::new(content_width, window_height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Automatic)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        for i in visible.start.max(window_start)..visible.end {
            let row = &rows[i];
            let mut bubble = MessageBubble::new(row, self.registry, self.time_format);
            bubble.selected = self.state.selected == Some(i);
            bubble.hovered = self.state.hovered == Some(i);
            let rect = Rect::new(
                0,
                to_window(self.state.layout.row_top(i) - window_top),
                content_width,
                self.state.layout.heights[i],
            );
            scroll_view.render_widget(bubble, rect);
        }

        if composing {
            let rect = Rect::new(
                0,
                to_window(rows_height - window_top),
                content_width,
                composing_height,
            );
            scroll_view.render_widget(
                ComposingIndicator {
                    frame: self.spinner_frame,
                },
                rect,
            );
        }

        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);

        let offset = self.state.scroll_state.offset().y;
        self.state.has_unseen = !self.state.follow.is_following()
            && offset.saturating_add(area.height) < window_height;
    }
}

/// Cached row heights for one content width.
pub struct LayoutCache {
    pub heights: Vec<u16>,
    /// Running sums: `prefix_heights[i]` is the bottom edge of row `i`.
    pub prefix_heights: Vec<u32>,
    row_count: usize,
    content_width: u16,
    stale: bool,
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutCache {
    pub fn new() -> Self {
        Self {
            heights: Vec::new(),
            prefix_heights: Vec::new(),
            row_count: 0,
            content_width: 0,
            stale: false,
        }
    }

    /// Drop every cached height on the next render.
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    /// How many leading heights are still valid. Messages never change once
    /// delivered, so only a new width, a shrunk sequence, or an explicit
    /// invalidation throws heights away.
    pub fn reusable_count(&self, row_count: usize, content_width: u16) -> usize {
        if self.stale || self.content_width != content_width || row_count < self.row_count {
            return 0;
        }
        self.heights.len().min(row_count)
    }

    pub fn update_metadata(&mut self, row_count: usize, content_width: u16) {
        self.row_count = row_count;
        self.content_width = content_width;
        self.stale = false;
    }

    pub fn rebuild_prefix_heights(&mut self) {
        self.prefix_heights = self
            .heights
            .iter()
            .scan(0u32, |acc, &h| {
                *acc += u32::from(h);
                Some(*acc)
            })
            .collect();
    }

    pub fn total(&self) -> u32 {
        self.prefix_heights.last().copied().unwrap_or(0)
    }

    pub fn row_top(&self, index: usize) -> u32 {
        match index {
            0 => 0,
            i => self.prefix_heights.get(i - 1).copied().unwrap_or_else(|| self.total()),
        }
    }

    /// First row, and its top, of the newest rows that fit in the scroll
    /// view. `full_height` includes anything drawn below the last row.
    pub fn tail_window(&self, full_height: u32) -> (usize, u32) {
        if full_height <= MAX_WINDOW_HEIGHT {
            return (0, 0);
        }
        let min_top = full_height - MAX_WINDOW_HEIGHT;
        // Rows ending before `min_top` fall out, and so does the row that
        // straddles it.
        let start = (self.prefix_heights.partition_point(|&end| end < min_top) + 1)
            .min(self.prefix_heights.len());
        (start, self.row_top(start))
    }

    /// Rows intersecting the viewport, padded by half a viewport each way.
    pub fn visible_range(&self, scroll_offset: u32, viewport_height: u16) -> std::ops::Range<usize> {
        let buffer = u32::from(viewport_height / 2);
        let start_y = scroll_offset.saturating_sub(buffer);
        let end_y = scroll_offset + u32::from(viewport_height) + buffer;

        let start = self.prefix_heights.partition_point(|&end| end <= start_y);
        let end = self
            .prefix_heights
            .partition_point(|&end| end < end_y)
            .saturating_add(1)
            .min(self.prefix_heights.len());

        start..end.max(start)
    }

    /// Row at content-space `y`, if any.
    pub fn row_at(&self, y: u32) -> Option<usize> {
        let index = self.prefix_heights.partition_point(|&end| end <= y);
        (index < self.prefix_heights.len()).then_some(index)
    }
}
