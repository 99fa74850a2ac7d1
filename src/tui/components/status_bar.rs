//! # StatusBar Component
//!
//! One line at the top: channel and connection on the left; the current
//! notice, or the "↓ New" marker, on the right.
//!
//! Stateless. Everything it shows is passed in as props:
//!
//! ```rust,ignore
//! StatusBar {
//!     channel_id: app.channel_id.as_deref(),
//!     connection: app.connection,
//!     notice: app.notice.as_ref(),
//!     has_unseen: tui.transcript.has_unseen,
//!     upload_count: app.uploaded_files.len(),
//!     sending: app.in_flight_sends,
//! }
//! .render(frame, area);
//! ```

use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::core::notice::{Notice, NoticeLevel};
use crate::core::status::ConnectionState;
use crate::tui::component::Component;

pub struct StatusBar<'a> {
    pub channel_id: Option<&'a str>,
    pub connection: ConnectionState,
    pub notice: Option<&'a Notice>,
    pub has_unseen: bool,
    pub upload_count: usize,
    pub sending: usize,
}

fn connection_color(state: ConnectionState) -> Color {
    match state {
        ConnectionState::Connected => Color::Green,
        ConnectionState::Disconnected => Color::DarkGray,
        _ => Color::Yellow,
    }
}

impl StatusBar<'_> {
    fn left(&self) -> Line<'static> {
        let dim = Style::default().fg(Color::DarkGray);
        let mut spans = vec![Span::styled(
            "Parlor",
            Style::default().add_modifier(Modifier::BOLD),
        )];
        match self.channel_id {
            Some(id) => spans.push(Span::raw(format!(" #{id}"))),
            None => spans.push(Span::styled(" (no channel)", dim)),
        }
        spans.push(Span::styled(" · ", dim));
        spans.push(Span::styled(
            self.connection.label(),
            Style::default().fg(connection_color(self.connection)),
        ));
        if self.sending > 0 {
            spans.push(Span::styled(" · sending…", dim));
        }
        if self.upload_count > 0 {
            let noun = if self.upload_count == 1 { "file" } else { "files" };
            spans.push(Span::styled(format!(" · {} {noun}", self.upload_count), dim));
        }
        Line::from(spans)
    }

    fn right(&self) -> Line<'static> {
        if let Some(notice) = self.notice {
            let color = match notice.level {
                NoticeLevel::Error => Color::Red,
                NoticeLevel::Info => Color::Cyan,
            };
            return Line::from(Span::styled(notice.text.clone(), Style::default().fg(color)));
        }
        if self.has_unseen {
            return Line::from(Span::styled(
                "↓ New (Ctrl+End)",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ));
        }
        Line::default()
    }
}

impl Component for StatusBar<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(Paragraph::new(self.left()), area);
        frame.render_widget(Paragraph::new(self.right()).alignment(Alignment::Right), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn bar() -> StatusBar<'static> {
        StatusBar {
            channel_id: Some("sales"),
            connection: ConnectionState::Connected,
            notice: None,
            has_unseen: false,
            upload_count: 0,
            sending: 0,
        }
    }

    fn rendered(mut bar: StatusBar<'_>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 1)).unwrap();
        terminal.draw(|f| bar.render(f, f.area())).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn shows_channel_and_connection() {
        let text = rendered(bar());
        assert!(text.contains("#sales"));
        assert!(text.contains("live"));
    }

    #[test]
    fn notice_wins_over_new_marker() {
        let notice = Notice::error("Message could not be sent.");
        let text = rendered(StatusBar {
            notice: Some(&notice),
            has_unseen: true,
            ..bar()
        });
        assert!(text.contains("Message could not be sent."));
        assert!(!text.contains("↓ New"));
    }

    #[test]
    fn new_marker_when_scrolled_away() {
        let text = rendered(StatusBar {
            has_unseen: true,
            ..bar()
        });
        assert!(text.contains("↓ New"));
    }

    #[test]
    fn upload_count_is_pluralised() {
        let text = rendered(StatusBar {
            upload_count: 2,
            ..bar()
        });
        assert!(text.contains("2 files"));
    }
}
