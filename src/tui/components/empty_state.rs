//! # Empty State
//!
//! Shown instead of the transcript when there are no messages and nothing
//! is loading. The copy comes from [`EmptyCopy`].

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};

use crate::core::transcript::EmptyCopy;
use crate::tui::component::Component;

pub struct EmptyState {
    pub copy: EmptyCopy,
}

impl Component for EmptyState {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let lines = vec![
            Line::from(Span::styled(
                self.copy.title(),
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::default(),
            Line::from(Span::styled(
                self.copy.hint(),
                Style::default().fg(Color::DarkGray),
            )),
        ];
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        let height = (paragraph.line_count(area.width.max(1)) as u16).min(area.height);

        let [centered] = Layout::vertical([Constraint::Length(height)])
            .flex(Flex::Center)
            .areas(area);
        frame.render_widget(paragraph, centered);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn rendered(copy: EmptyCopy) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 9)).unwrap();
        terminal
            .draw(|f| EmptyState { copy }.render(f, f.area()))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn shows_title_and_hint() {
        let text = rendered(EmptyCopy::NewChat);
        assert!(text.contains(EmptyCopy::NewChat.title()));
        assert!(text.contains("Type a message below"));
    }

    #[test]
    fn each_copy_is_distinct() {
        assert!(rendered(EmptyCopy::NoHistory).contains("No conversation history"));
        assert!(rendered(EmptyCopy::SelectSession).contains("Select a session"));
    }
}
