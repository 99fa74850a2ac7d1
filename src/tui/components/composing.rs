use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget};

use super::message::{ROW_GAP, accent};
use crate::core::transcript::Side;

const FRAMES: [&str; 4] = ["·  ", "·· ", "···", " ··"];

/// Rows reserved for the indicator, including its gap.
pub const HEIGHT: u16 = 1 + ROW_GAP;

/// "AI is composing" row shown after the last message while loading.
pub struct ComposingIndicator {
    pub frame: usize,
}

impl Widget for ComposingIndicator {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let color = accent(Side::Left);
        let dots = FRAMES[self.frame % FRAMES.len()];
        let line = Line::from(vec![
            Span::styled(" AI ", Style::default().fg(color).add_modifier(Modifier::BOLD)),
            Span::styled(format!("is composing {dots}"), Style::default().fg(Color::DarkGray)),
        ]);
        Paragraph::new(line).render(Rect { height: 1, ..area }, buf);
    }
}
