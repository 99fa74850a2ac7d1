//! # InputBox Component
//!
//! Multi-line editor wrapped around a [`Composer`].
//!
//! ## Responsibilities
//!
//! - Editing (insert, paste, backspace, delete, cursor movement)
//! - Submission (Enter), with the draft cleared before anything is sent
//! - Presence: "typing" while editing, "stopped typing" on blur and submit
//! - Placeholder and disabled look, both props from the application state
//!
//! ## State Management
//!
//! The draft lives in the `Composer`. The cursor is a byte offset into it;
//! the line geometry is recomputed from the last rendered width.

mod layout;

use std::time::Instant;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState};

use crate::core::composer::{Composer, Gate, Presence, Submission};
use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

use layout::{
    MAX_VISIBLE_LINES, VERTICAL_OVERHEAD, inner_width, locate, next_char_boundary,
    offset_at_column, prev_char_boundary, visual_lines,
};

/// High-level events emitted by the InputBox.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Submit(Submission),
    Presence(Presence),
    /// Draft or cursor changed without anything to report upstream.
    Edited,
}

/// # Props
///
/// - `gate`: whether input is disabled and the connection state
/// - `placeholder`: hint shown while the draft is empty
pub struct InputBox {
    composer: Composer,
    /// Byte offset into the draft.
    cursor: usize,
    scroll_offset: u16,
    last_width: u16,
    pub gate: Gate,
    pub placeholder: &'static str,
}

impl Default for InputBox {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBox {
    const DEFAULT_WIDTH: u16 = 80;

    pub fn new() -> Self {
        Self {
            composer: Composer::new(),
            cursor: 0,
            scroll_offset: 0,
            last_width: Self::DEFAULT_WIDTH,
            gate: Gate::default(),
            placeholder: "",
        }
    }

    pub fn draft(&self) -> &str {
        self.composer.draft()
    }

    /// Put failed text back. The cursor lands at the end of the draft.
    pub fn restore(&mut self, text: &str) {
        self.composer.restore(text);
        self.cursor = self.composer.draft().len();
    }

    /// Input focus moved elsewhere.
    pub fn blur(&mut self) -> Presence {
        self.composer.blur()
    }

    /// Box height for the current draft at `area_width`, borders included.
    pub fn calculate_height(&self, area_width: u16) -> u16 {
        let lines = visual_lines(self.draft(), inner_width(area_width)).len() as u16;
        lines.clamp(1, MAX_VISIBLE_LINES) + VERTICAL_OVERHEAD
    }

    fn edited(&mut self) -> InputEvent {
        match self.composer.edited(self.gate.disabled, Instant::now()) {
            Some(presence) => InputEvent::Presence(presence),
            None => InputEvent::Edited,
        }
    }

    fn insert(&mut self, text: &str) -> InputEvent {
        self.composer.draft_mut().insert_str(self.cursor, text);
        self.cursor += text.len();
        self.edited()
    }

    fn move_to(&mut self, pos: usize) -> Option<InputEvent> {
        (pos != self.cursor).then(|| {
            self.cursor = pos;
            InputEvent::Edited
        })
    }

    fn move_vertically(&mut self, down: bool) -> Option<InputEvent> {
        let text = self.composer.draft();
        let lines = visual_lines(text, inner_width(self.last_width));
        let (index, column) = locate(text, &lines, self.cursor);
        let target = if down {
            lines.get(index + 1)?
        } else {
            lines.get(index.checked_sub(1)?)?
        };
        let pos = offset_at_column(text, *target, column);
        self.move_to(pos)
    }
}

/// Smallest change to `offset` that keeps `cursor_line` in view.
fn scroll_for_cursor(offset: u16, cursor_line: u16, total_lines: u16) -> u16 {
    if total_lines <= MAX_VISIBLE_LINES {
        0
    } else if cursor_line < offset {
        cursor_line
    } else if cursor_line >= offset + MAX_VISIBLE_LINES {
        cursor_line + 1 - MAX_VISIBLE_LINES
    } else {
        offset
    }
}

impl Component for InputBox {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        self.last_width = area.width;
        let width = inner_width(area.width);
        let text = self.composer.draft();
        let lines = visual_lines(text, width);
        let (cursor_line, cursor_column) = locate(text, &lines, self.cursor);
        let total = lines.len() as u16;
        self.scroll_offset = scroll_for_cursor(self.scroll_offset, cursor_line as u16, total);

        let disabled = self.gate.disabled;
        let border = if disabled {
            Style::default().fg(Color::DarkGray)
        } else if self.gate.blocks_submit() {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::Magenta)
        };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border)
            .padding(Padding::horizontal(1))
            .title(if disabled { " Input disabled " } else { " Message " });

        let content: Vec<Line> = if text.is_empty() {
            vec![Line::from(Span::styled(
                self.placeholder,
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            ))]
        } else {
            lines
                .iter()
                .skip(self.scroll_offset as usize)
                .take(MAX_VISIBLE_LINES as usize)
                .map(|line| Line::raw(&text[line.start..line.end]))
                .collect()
        };
        let style = if disabled {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };
        let inner = block.inner(area);
        frame.render_widget(Paragraph::new(content).style(style).block(block), area);

        if total > MAX_VISIBLE_LINES {
            let mut scrollbar = ScrollbarState::default()
                .content_length((total - MAX_VISIBLE_LINES) as usize)
                .position(self.scroll_offset as usize);
            let track = Rect {
                x: area.right().saturating_sub(1),
                y: area.y + 1,
                width: 1,
                height: area.height.saturating_sub(2),
            };
            frame.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight),
                track,
                &mut scrollbar,
            );
        }

        if !disabled && inner.width > 0 {
            let x = inner.x + cursor_column.min(inner.width - 1);
            let y = inner.y + (cursor_line as u16).saturating_sub(self.scroll_offset);
            frame.set_cursor_position((x, y));
        }
    }
}

impl EventHandler for InputBox {
    type Event = InputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        if self.gate.disabled {
            return None;
        }
        let text = self.composer.draft();
        match event {
            TuiEvent::InputChar(c) => Some(self.insert(c.encode_utf8(&mut [0; 4]))),
            TuiEvent::Paste(pasted) => {
                let normalized = pasted.replace("\r\n", "\n").replace('\r', "\n");
                Some(self.insert(&normalized))
            }
            TuiEvent::Backspace => {
                if self.cursor == 0 {
                    return None;
                }
                let prev = prev_char_boundary(text, self.cursor);
                self.composer.draft_mut().drain(prev..self.cursor);
                self.cursor = prev;
                Some(self.edited())
            }
            TuiEvent::Delete => {
                if self.cursor >= text.len() {
                    return None;
                }
                let next = next_char_boundary(text, self.cursor);
                self.composer.draft_mut().drain(self.cursor..next);
                Some(self.edited())
            }
            TuiEvent::CursorLeft if self.cursor > 0 => {
                let prev = prev_char_boundary(text, self.cursor);
                self.move_to(prev)
            }
            TuiEvent::CursorRight if self.cursor < text.len() => {
                let next = next_char_boundary(text, self.cursor);
                self.move_to(next)
            }
            TuiEvent::CursorHome => {
                let start = text[..self.cursor].rfind('\n').map_or(0, |i| i + 1);
                self.move_to(start)
            }
            TuiEvent::CursorEnd => {
                let end = text[self.cursor..]
                    .find('\n')
                    .map_or(text.len(), |i| self.cursor + i);
                self.move_to(end)
            }
            TuiEvent::CursorUp => self.move_vertically(false),
            TuiEvent::CursorDown => self.move_vertically(true),
            TuiEvent::Submit => {
                let submission = self.composer.begin_submit(self.gate)?;
                self.cursor = 0;
                self.scroll_offset = 0;
                Some(InputEvent::Submit(submission))
            }
            _ => None,
        }
    }
}
