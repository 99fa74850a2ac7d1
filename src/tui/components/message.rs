use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Text};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Widget, Wrap};

use crate::core::message::Origin;
use crate::core::transcript::{Row, RowContent, Side};
use crate::tui::components::structured::{RowFocus, StructuredRegistry};
use crate::tui::markdown;

/// Bubbles never take more than this share of the transcript width.
pub const MAX_WIDTH_PERCENT: u16 = 75;
/// Blank rows below each bubble.
pub const ROW_GAP: u16 = 1;

const PAD_H: u16 = 1;
/// Border (1 + 1) plus horizontal padding.
const HORIZONTAL_OVERHEAD: u16 = 2 + PAD_H * 2;
const VERTICAL_OVERHEAD: u16 = 2;
/// Narrowest bubble worth drawing.
const MIN_WIDTH: u16 = 12;

pub fn accent(side: Side) -> Color {
    match side {
        Side::Right => Color::Magenta,
        Side::Left => Color::Green,
    }
}

fn origin_label(origin: Origin) -> &'static str {
    match origin {
        Origin::Human => "You",
        Origin::Ai => "AI",
    }
}

enum Body<'a> {
    Formatted(Text<'static>),
    Structured {
        tag: &'a str,
        registry: &'a StructuredRegistry,
    },
}

/// One transcript row: a bordered bubble hugging its side of the row.
///
/// Header carries the origin and, when known, the local time. AI messages
/// that are part of a sequence get an `i/n` label under the content.
pub struct MessageBubble<'a> {
    row: &'a Row<'a>,
    body: Body<'a>,
    header: String,
    pub selected: bool,
    pub hovered: bool,
}

impl<'a> MessageBubble<'a> {
    pub fn new(row: &'a Row<'a>, registry: &'a StructuredRegistry, time_format: &str) -> Self {
        let body = match row.content {
            RowContent::Structured(tag) => Body::Structured { tag, registry },
            RowContent::Formatted => {
                Body::Formatted(markdown::render(&row.message.body.joined(), Color::Reset))
            }
        };
        let header = match row.message.time_label(time_format) {
            Some(time) => format!(" {} · {} ", origin_label(row.message.origin), time),
            None => format!(" {} ", origin_label(row.message.origin)),
        };
        Self {
            row,
            body,
            header,
            selected: false,
            hovered: false,
        }
    }

    fn width(&self, row_width: u16) -> u16 {
        let max = (row_width as u32 * MAX_WIDTH_PERCENT as u32 / 100) as u16;
        let max = max.max(MIN_WIDTH).min(row_width);
        let wanted = match &self.body {
            Body::Formatted(text) => text.width() as u16 + HORIZONTAL_OVERHEAD,
            Body::Structured { .. } => max,
        };
        let header = unicode_width::UnicodeWidthStr::width(self.header.as_str()) as u16 + 2;
        let progress = self.row.progress.as_ref().map_or(0, |p| p.len() as u16) + HORIZONTAL_OVERHEAD;
        wanted.max(header).max(progress).clamp(MIN_WIDTH.min(max), max)
    }

    fn body_lines(&self, inner_width: u16) -> u16 {
        if inner_width == 0 {
            return 1;
        }
        let lines = match &self.body {
            Body::Formatted(text) => Paragraph::new(text.clone())
                .wrap(Wrap { trim: false })
                .line_count(inner_width) as u16,
            Body::Structured { tag, registry } => {
                registry.height(tag, self.row.message, inner_width)
            }
        };
        lines.max(1)
    }

    /// Rows this bubble occupies at `row_width`, including the gap below.
    pub fn height(&self, row_width: u16) -> u16 {
        let inner = self.width(row_width).saturating_sub(HORIZONTAL_OVERHEAD);
        let progress = u16::from(self.row.progress.is_some());
        self.body_lines(inner) + progress + VERTICAL_OVERHEAD + ROW_GAP
    }
}

impl Widget for MessageBubble<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = self.width(area.width);
        let x = match self.row.side {
            Side::Left => area.x,
            Side::Right => area.right().saturating_sub(width),
        };
        let bubble = Rect::new(x, area.y, width, area.height.saturating_sub(ROW_GAP));

        let color = accent(self.row.side);
        let border = if self.selected {
            Style::default().fg(Color::Cyan)
        } else if self.hovered {
            Style::default().fg(color)
        } else {
            Style::default().fg(color).add_modifier(Modifier::DIM)
        };
        let title_alignment = match self.row.side {
            Side::Left => Alignment::Left,
            Side::Right => Alignment::Right,
        };

        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border)
            .title(Line::styled(self.header.clone(), border.remove_modifier(Modifier::DIM)))
            .title_alignment(title_alignment)
            .padding(Padding::horizontal(PAD_H));
        let mut inner = block.inner(bubble);
        block.render(bubble, buf);

        if let Some(progress) = &self.row.progress
            && inner.height > 0
        {
            let label_area = Rect::new(inner.x, inner.bottom() - 1, inner.width, 1);
            Paragraph::new(progress.as_str())
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Right)
                .render(label_area, buf);
            inner.height -= 1;
        }

        match self.body {
            Body::Formatted(text) => {
                Paragraph::new(text)
                    .wrap(Wrap { trim: false })
                    .render(inner, buf);
            }
            Body::Structured { tag, registry } => registry.render(
                tag,
                self.row.message,
                RowFocus {
                    row: self.row.index,
                    selected: self.selected,
                },
                inner,
                buf,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Message;
    use crate::tui::components::structured::test_util::buffer_text;

    fn draw(message: &Message, width: u16) -> (u16, String) {
        let registry = StructuredRegistry::with_builtins();
        let row = Row::new(0, message);
        let bubble = MessageBubble::new(&row, &registry, "%H:%M");
        let height = bubble.height(width);
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        bubble.render(area, &mut buf);
        (height, buffer_text(&buf))
    }

    #[test]
    fn single_line_height_includes_borders_and_gap() {
        let (height, _) = draw(&Message::human("hello"), 80);
        assert_eq!(height, 1 + VERTICAL_OVERHEAD + ROW_GAP);
    }

    #[test]
    fn human_hugs_right_and_ai_hugs_left() {
        let (_, human) = draw(&Message::human("hi"), 60);
        let first = human.lines().next().unwrap();
        assert!(first.starts_with(' '), "human bubble should not start at column 0");
        assert!(first.trim_end().ends_with('╮'));

        let (_, ai) = draw(&Message::ai("hi"), 60);
        assert!(ai.lines().next().unwrap().starts_with('╭'));
    }

    #[test]
    fn width_is_capped() {
        let long = "word ".repeat(100);
        let registry = StructuredRegistry::empty();
        let message = Message::ai(long);
        let row = Row::new(0, &message);
        let bubble = MessageBubble::new(&row, &registry, "%H:%M");
        assert_eq!(bubble.width(100), 75);
    }

    #[test]
    fn progress_label_adds_a_line() {
        let plain = Message::ai("step");
        let stepped = Message::ai("step").with_sequence(Some(2), Some(5));
        let (plain_height, _) = draw(&plain, 60);
        let (stepped_height, text) = draw(&stepped, 60);
        assert_eq!(stepped_height, plain_height + 1);
        assert!(text.contains("2/5"));
    }

    #[test]
    fn header_names_origin() {
        let (_, text) = draw(&Message::ai("hi"), 60);
        assert!(text.contains("AI"));
        let (_, text) = draw(&Message::human("hi"), 60);
        assert!(text.contains("You"));
    }

    #[test]
    fn malformed_content_renders_empty() {
        let message: Message =
            serde_json::from_str(r#"{"type":"ai","content":{"weird":true}}"#).unwrap();
        let (height, text) = draw(&message, 60);
        assert_eq!(height, 1 + VERTICAL_OVERHEAD + ROW_GAP);
        assert!(!text.contains("weird"));
    }

    #[test]
    fn structured_row_uses_registry() {
        let message = Message::ai("").with_component("timeline");
        let (_, text) = draw(&message, 60);
        assert!(text.contains("unsupported component: timeline"));
    }
}
