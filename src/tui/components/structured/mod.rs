//! # Structured Components
//!
//! Messages that carry a `component_type` are not markdown: they are handed
//! to a renderer registered under that tag. Renderers size themselves, draw
//! into the row's inner area, and handle keys or pastes while their row is
//! selected, reporting back only through [`StructuredCallbacks`].
//!
//! An unknown tag gets an inert placeholder; the rest of the transcript is
//! unaffected.

mod menu;
mod uploader;

use std::collections::HashMap;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Paragraph, Widget, Wrap};
use serde_json::Value;

use crate::core::message::Message;
use crate::core::notice::Notice;
use crate::core::upload::UploadedFile;
use crate::tui::event::TuiEvent;

pub use menu::MenuRenderer;
pub use uploader::UploaderRenderer;

/// Where a renderer is being drawn or driven from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowFocus {
    /// Index of the message in the transcript.
    pub row: usize,
    /// Whether the row is selected (receives events).
    pub selected: bool,
}

/// The outward contracts a structured renderer may invoke.
pub struct StructuredCallbacks<'a> {
    pub on_option_selected: &'a mut dyn FnMut(Value),
    pub on_uploaded_files_changed: &'a mut dyn FnMut(Vec<UploadedFile>),
    /// The user asked to send the listed files.
    pub on_files_submitted: &'a mut dyn FnMut(Vec<UploadedFile>),
    pub on_notice: &'a mut dyn FnMut(Notice),
}

pub trait StructuredRenderer {
    /// Rows needed to draw `message` in `width` columns.
    fn height(&self, message: &Message, width: u16) -> u16;

    fn render(&self, message: &Message, focus: RowFocus, area: Rect, buf: &mut Buffer);

    /// Returns `true` if the event was consumed. Renderers whose height can
    /// change after an event must also return `true` so layout is redone.
    fn handle_event(
        &mut self,
        message: &Message,
        focus: RowFocus,
        event: &TuiEvent,
        callbacks: &mut StructuredCallbacks<'_>,
    ) -> bool;

    /// The transcript was replaced by `messages`. Per-row state from the old
    /// transcript no longer applies.
    fn transcript_replaced(&mut self, _messages: &[Message]) {}
}

pub struct StructuredRegistry {
    renderers: HashMap<String, Box<dyn StructuredRenderer>>,
}

impl Default for StructuredRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl StructuredRegistry {
    pub fn empty() -> Self {
        Self {
            renderers: HashMap::new(),
        }
    }

    /// Registry with `menu` and `file_upload`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(menu::TAG, Box::new(MenuRenderer::new()));
        registry.register(uploader::TAG, Box::new(UploaderRenderer::new()));
        registry
    }

    pub fn register(&mut self, tag: impl Into<String>, renderer: Box<dyn StructuredRenderer>) {
        self.renderers.insert(tag.into(), renderer);
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.renderers.contains_key(tag)
    }

    pub fn height(&self, tag: &str, message: &Message, width: u16) -> u16 {
        match self.renderers.get(tag) {
            Some(renderer) => renderer.height(message, width),
            None => Placeholder { tag }.height(width),
        }
    }

    pub fn render(&self, tag: &str, message: &Message, focus: RowFocus, area: Rect, buf: &mut Buffer) {
        match self.renderers.get(tag) {
            Some(renderer) => renderer.render(message, focus, area, buf),
            None => Placeholder { tag }.render(area, buf),
        }
    }

    pub fn transcript_replaced(&mut self, messages: &[Message]) {
        for renderer in self.renderers.values_mut() {
            renderer.transcript_replaced(messages);
        }
    }

    pub fn handle_event(
        &mut self,
        tag: &str,
        message: &Message,
        focus: RowFocus,
        event: &TuiEvent,
        callbacks: &mut StructuredCallbacks<'_>,
    ) -> bool {
        match self.renderers.get_mut(tag) {
            Some(renderer) => renderer.handle_event(message, focus, event, callbacks),
            None => false,
        }
    }
}

/// Inert row for tags nobody registered.
struct Placeholder<'a> {
    tag: &'a str,
}

impl Placeholder<'_> {
    fn paragraph(&self) -> Paragraph<'static> {
        Paragraph::new(format!("unsupported component: {}", self.tag))
            .style(
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )
            .wrap(Wrap { trim: false })
    }

    fn height(&self, width: u16) -> u16 {
        (self.paragraph().line_count(width.max(1)) as u16).max(1)
    }
}

impl Widget for Placeholder<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.paragraph().render(area, buf);
    }
}
