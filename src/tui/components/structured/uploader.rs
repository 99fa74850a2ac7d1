use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget, Wrap};

use super::{RowFocus, StructuredCallbacks, StructuredRenderer};
use crate::core::message::Message;
use crate::core::notice::Notice;
use crate::core::upload::{self, ALLOWED_EXTENSIONS, UploadList};
use crate::tui::event::TuiEvent;

pub(super) const TAG: &str = upload::CARD_TAG;

const DEFAULT_PROMPT: &str = "Upload your data files";

/// Upload card. Pasted (or dropped) paths are validated and listed. The list
/// only goes anywhere when the user presses `s` on the card.
pub struct UploaderRenderer {
    files: UploadList,
}

impl UploaderRenderer {
    pub fn new() -> Self {
        Self {
            files: UploadList::new(),
        }
    }

    fn card(&self, message: &Message, focus: RowFocus) -> Paragraph<'static> {
        let prompt = message.body.joined();
        let prompt = if prompt.trim().is_empty() {
            DEFAULT_PROMPT.to_string()
        } else {
            prompt
        };
        let dim = Style::default().fg(Color::DarkGray);

        let mut lines: Vec<Line<'static>> = prompt
            .lines()
            .map(|l| Line::styled(l.to_owned(), Style::default().add_modifier(Modifier::BOLD)))
            .collect();
        let accepted = ALLOWED_EXTENSIONS
            .iter()
            .map(|ext| format!(".{ext}"))
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(Line::styled(format!("Accepted: {accepted} · under 10 MB"), dim));

        if self.files.is_empty() {
            lines.push(Line::styled("No files yet", dim.add_modifier(Modifier::ITALIC)));
        }
        for file in self.files.files() {
            lines.push(Line::from(vec![
                Span::styled("▪ ", Style::default().fg(Color::Green)),
                Span::raw(file.name.clone()),
                Span::styled(format!("  {}", file.size_label()), dim),
            ]));
        }

        let hint = if self.files.is_empty() {
            "Paste or drop file paths"
        } else {
            "Paste or drop file paths · d removes the last file · s sends"
        };
        let hint_style = if focus.selected {
            dim
        } else {
            dim.add_modifier(Modifier::DIM)
        };
        lines.push(Line::styled(hint, hint_style));

        Paragraph::new(lines).wrap(Wrap { trim: false })
    }

    fn accept_paths(&mut self, pasted: &str, callbacks: &mut StructuredCallbacks<'_>) -> bool {
        let paths = upload::split_pasted_paths(pasted);
        if paths.is_empty() {
            return false;
        }
        let mut changed = false;
        for path in paths {
            match upload::inspect(&path) {
                Ok(file) => {
                    log::info!("Accepted upload {} ({} bytes)", file.name, file.size_bytes);
                    self.files.add(file);
                    changed = true;
                }
                Err(e) => {
                    log::warn!("Rejected upload {}: {}", path.display(), e);
                    (callbacks.on_notice)(Notice::error(e.to_string()));
                }
            }
        }
        if changed {
            (callbacks.on_uploaded_files_changed)(self.files.files().to_vec());
        }
        true
    }
}

impl StructuredRenderer for UploaderRenderer {
    fn height(&self, message: &Message, width: u16) -> u16 {
        let focus = RowFocus {
            row: 0,
            selected: false,
        };
        (self.card(message, focus).line_count(width.max(1)) as u16).max(1)
    }

    fn render(&self, message: &Message, focus: RowFocus, area: Rect, buf: &mut Buffer) {
        self.card(message, focus).render(area, buf);
    }

    fn handle_event(
        &mut self,
        _message: &Message,
        _focus: RowFocus,
        event: &TuiEvent,
        callbacks: &mut StructuredCallbacks<'_>,
    ) -> bool {
        match event {
            TuiEvent::Paste(text) => self.accept_paths(text, callbacks),
            TuiEvent::InputChar('d') => {
                if let Some(removed) = self.files.remove_last() {
                    log::info!("Removed upload {}", removed.name);
                    (callbacks.on_uploaded_files_changed)(self.files.files().to_vec());
                }
                true
            }
            TuiEvent::InputChar('s') => {
                if self.files.is_empty() {
                    (callbacks.on_notice)(Notice::info("Add files before sending"));
                } else {
                    (callbacks.on_files_submitted)(self.files.files().to_vec());
                }
                true
            }
            _ => false,
        }
    }

    fn transcript_replaced(&mut self, messages: &[Message]) {
        if !messages.iter().any(|m| m.component() == Some(TAG)) {
            self.files = UploadList::new();
        }
    }
}
