use std::collections::HashMap;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget, Wrap};
use serde_json::Value;

use super::{RowFocus, StructuredCallbacks, StructuredRenderer};
use crate::core::action::option_text;
use crate::core::message::Message;
use crate::tui::event::TuiEvent;

pub(super) const TAG: &str = "menu";

const HINT: &str = "1-9 or ↑/↓ + Enter to choose";

/// Numbered choice list. Choosing sends the option through
/// `on_option_selected` with its raw JSON value.
pub struct MenuRenderer {
    /// Highlighted option per transcript row.
    highlighted: HashMap<usize, usize>,
}

struct MenuContent {
    prompt: Option<String>,
    options: Vec<Value>,
}

impl MenuContent {
    fn of(message: &Message) -> Self {
        let from_payload = message
            .payload
            .as_ref()
            .and_then(|p| p.get("options"))
            .and_then(Value::as_array)
            .filter(|options| !options.is_empty());

        match from_payload {
            Some(options) => Self {
                prompt: Some(message.body.joined()).filter(|p| !p.trim().is_empty()),
                options: options.clone(),
            },
            None => Self {
                prompt: None,
                options: message
                    .body
                    .blocks()
                    .into_iter()
                    .filter(|b| !b.trim().is_empty())
                    .map(|b| Value::String(b.to_string()))
                    .collect(),
            },
        }
    }

    fn paragraph(&self, highlighted: Option<usize>, focus: RowFocus) -> Paragraph<'static> {
        let mut lines = Vec::new();
        if let Some(prompt) = &self.prompt {
            lines.extend(prompt.lines().map(|l| Line::from(l.to_owned())));
        }
        for (i, option) in self.options.iter().enumerate() {
            let is_current = focus.selected && highlighted == Some(i);
            let marker = if is_current { "› " } else { "  " };
            let style = if is_current {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Green)
            };
            let number = if i < 9 {
                format!("{}. ", i + 1)
            } else {
                "   ".to_string()
            };
            lines.push(Line::from(vec![
                Span::styled(marker, style),
                Span::styled(number, Style::default().fg(Color::DarkGray)),
                Span::styled(option_text(option), style),
            ]));
        }
        let hint_style = if focus.selected {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM)
        };
        lines.push(Line::from(Span::styled(HINT, hint_style)));
        Paragraph::new(lines).wrap(Wrap { trim: false })
    }
}

impl MenuRenderer {
    pub fn new() -> Self {
        Self {
            highlighted: HashMap::new(),
        }
    }

    fn choose(&self, content: &MenuContent, index: usize, callbacks: &mut StructuredCallbacks<'_>) -> bool {
        match content.options.get(index) {
            Some(option) => {
                log::info!("Menu option {} chosen", index + 1);
                (callbacks.on_option_selected)(option.clone());
                true
            }
            None => false,
        }
    }
}

impl StructuredRenderer for MenuRenderer {
    fn height(&self, message: &Message, width: u16) -> u16 {
        let content = MenuContent::of(message);
        let focus = RowFocus {
            row: 0,
            selected: false,
        };
        (content.paragraph(None, focus).line_count(width.max(1)) as u16).max(1)
    }

    fn render(&self, message: &Message, focus: RowFocus, area: Rect, buf: &mut Buffer) {
        let content = MenuContent::of(message);
        let highlighted = self.highlighted.get(&focus.row).copied().or(Some(0));
        content.paragraph(highlighted, focus).render(area, buf);
    }

    fn handle_event(
        &mut self,
        message: &Message,
        focus: RowFocus,
        event: &TuiEvent,
        callbacks: &mut StructuredCallbacks<'_>,
    ) -> bool {
        let content = MenuContent::of(message);
        let len = content.options.len();
        if len == 0 {
            return false;
        }
        let current = self.highlighted.get(&focus.row).copied().unwrap_or(0);

        match event {
            TuiEvent::InputChar(c @ '1'..='9') => {
                let index = (*c as usize) - ('1' as usize);
                self.choose(&content, index, callbacks)
            }
            TuiEvent::Submit => self.choose(&content, current, callbacks),
            TuiEvent::CursorUp if current > 0 => {
                self.highlighted.insert(focus.row, current - 1);
                true
            }
            TuiEvent::CursorDown if current + 1 < len => {
                self.highlighted.insert(focus.row, current + 1);
                true
            }
            _ => false,
        }
    }

    fn transcript_replaced(&mut self, _messages: &[Message]) {
        self.highlighted.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::{Recorded, buffer_text};
    use super::*;
    use serde_json::json;

    fn payload_menu() -> Message {
        Message::ai("Pick a dataset")
            .with_component(TAG)
            .with_payload(json!({
                "options": ["sales", {"label": "inventory", "value": "inv"}]
            }))
    }

    fn selected() -> RowFocus {
        RowFocus {
            row: 0,
            selected: true,
        }
    }

    #[test]
    fn options_come_from_payload_then_blocks() {
        let content = MenuContent::of(&payload_menu());
        assert_eq!(content.prompt.as_deref(), Some("Pick a dataset"));
        assert_eq!(content.options.len(), 2);

        let from_blocks = Message::ai("")
            .with_blocks(vec!["yes".into(), "no".into()])
            .with_component(TAG);
        let content = MenuContent::of(&from_blocks);
        assert_eq!(content.prompt, None);
        assert_eq!(content.options, vec![json!("yes"), json!("no")]);
    }

    #[test]
    fn digit_selects_raw_option_value() {
        let mut menu = MenuRenderer::new();
        let mut recorded = Recorded::default();
        let message = payload_menu();

        assert!(recorded.drive(&mut menu, &message, &TuiEvent::InputChar('2')));
        assert_eq!(
            recorded.options,
            vec![json!({"label": "inventory", "value": "inv"})]
        );

        assert!(!recorded.drive(&mut menu, &message, &TuiEvent::InputChar('7')));
        assert_eq!(recorded.options.len(), 1);
    }

    #[test]
    fn arrows_then_enter_select_highlighted() {
        let mut menu = MenuRenderer::new();
        let mut recorded = Recorded::default();
        let message = payload_menu();

        assert!(!recorded.drive(&mut menu, &message, &TuiEvent::CursorUp));
        assert!(recorded.drive(&mut menu, &message, &TuiEvent::CursorDown));
        assert!(!recorded.drive(&mut menu, &message, &TuiEvent::CursorDown));
        assert!(recorded.drive(&mut menu, &message, &TuiEvent::Submit));
        assert_eq!(recorded.options.len(), 1);
        assert_eq!(recorded.options[0]["value"], "inv");
    }

    #[test]
    fn replaced_transcript_forgets_highlights() {
        let mut menu = MenuRenderer::new();
        let mut recorded = Recorded::default();
        let message = payload_menu();
        recorded.drive(&mut menu, &message, &TuiEvent::CursorDown);

        menu.transcript_replaced(std::slice::from_ref(&message));
        recorded.drive(&mut menu, &message, &TuiEvent::Submit);
        assert_eq!(recorded.options, vec![json!("sales")]);
    }

    #[test]
    fn renders_numbered_options_and_hint() {
        let menu = MenuRenderer::new();
        let message = payload_menu();
        let height = menu.height(&message, 40);
        assert_eq!(height, 4);

        let area = Rect::new(0, 0, 40, height);
        let mut buf = Buffer::empty(area);
        menu.render(&message, selected(), area, &mut buf);
        let text = buffer_text(&buf);
        assert!(text.contains("Pick a dataset"));
        assert!(text.contains("› 1. sales"));
        assert!(text.contains("2. inventory"));
        assert!(text.contains(HINT));
    }
}
