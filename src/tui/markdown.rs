//! Message body → styled ratatui `Text`.
//!
//! Walks `pulldown_cmark` events and emits `Line`/`Span` values. Fenced code
//! is highlighted with syntect. Raw HTML is never interpreted: it is shown
//! verbatim in a dim style.

use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

static SYNTAXES: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEMES: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const CODE_THEME: &str = "base16-ocean.dark";

fn frame_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn literal_html_style() -> Style {
    Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::DIM)
}

/// Render `source` as markdown in `fg`.
pub fn render(source: &str, fg: Color) -> Text<'static> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut out = Builder::new(fg);
    for event in Parser::new_ext(source, options) {
        out.event(event);
    }
    out.finish()
}

enum Code {
    Off,
    Plain,
    Highlighted(Box<HighlightLines<'static>>),
}

struct Builder {
    lines: Vec<Line<'static>>,
    fg: Color,
    inline: Vec<Style>,
    gutters: Vec<Span<'static>>,
    /// `None` for bullets, `Some(next_number)` for ordered lists.
    lists: Vec<Option<u64>>,
    code: Code,
    pending_link: Option<String>,
    gap: bool,
}

impl Builder {
    fn new(fg: Color) -> Self {
        Self {
            lines: Vec::new(),
            fg,
            inline: Vec::new(),
            gutters: Vec::new(),
            lists: Vec::new(),
            code: Code::Off,
            pending_link: None,
            gap: false,
        }
    }

    fn finish(self) -> Text<'static> {
        Text::from(self.lines)
    }

    fn current(&self) -> Style {
        self.inline
            .last()
            .copied()
            .unwrap_or_else(|| Style::default().fg(self.fg))
    }

    fn nest(&mut self, overlay: Style) {
        self.inline.push(self.current().patch(overlay));
    }

    fn unnest(&mut self) {
        self.inline.pop();
    }

    fn new_line(&mut self, mut line: Line<'static>) {
        for gutter in self.gutters.iter().rev() {
            line.spans.insert(0, gutter.clone());
        }
        self.lines.push(line);
    }

    fn append(&mut self, span: Span<'static>) {
        match self.lines.last_mut() {
            Some(line) => line.push_span(span),
            None => self.new_line(Line::from(span)),
        }
    }

    fn open_block(&mut self) {
        if self.gap {
            self.new_line(Line::default());
            self.gap = false;
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(text),
            Event::Code(code) => self.append(Span::styled(
                code.to_string(),
                Style::default().fg(Color::White).bg(Color::DarkGray),
            )),
            Event::Html(html) => self.html_block(html),
            Event::InlineHtml(html) => self.append(Span::styled(html.to_string(), literal_html_style())),
            Event::SoftBreak => self.append(Span::raw(" ")),
            Event::HardBreak => self.new_line(Line::default()),
            Event::Rule => {
                self.open_block();
                self.new_line(Line::from(Span::styled("─".repeat(32), frame_style())));
                self.gap = true;
            }
            Event::TaskListMarker(done) => {
                self.append(Span::raw(if done { "[x] " } else { "[ ] " }));
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                self.open_block();
                self.new_line(Line::default());
            }
            Tag::Heading { level, .. } => {
                self.open_block();
                let style = heading(self.fg, level);
                self.new_line(Line::from(Span::styled(
                    format!("{} ", "#".repeat(level as usize)),
                    style,
                )));
                self.nest(style);
            }
            Tag::BlockQuote(_) => {
                self.open_block();
                self.gutters.push(Span::styled("▌ ", frame_style()));
                self.nest(Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM));
            }
            Tag::CodeBlock(kind) => self.start_code(kind),
            Tag::HtmlBlock => self.open_block(),
            Tag::List(first) => {
                if self.lists.is_empty() {
                    self.open_block();
                }
                self.lists.push(first);
            }
            Tag::Item => {
                self.new_line(Line::default());
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{indent}{n}. ");
                        *n += 1;
                        marker
                    }
                    Some(None) => format!("{indent}• "),
                    None => return,
                };
                self.append(Span::styled(marker, frame_style()));
            }
            Tag::Emphasis => self.nest(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.nest(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => self.nest(Style::default().add_modifier(Modifier::CROSSED_OUT)),
            Tag::Link { dest_url, .. } => {
                self.pending_link = Some(dest_url.to_string());
                self.nest(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::UNDERLINED),
                );
            }
            _ => {}
        }
    }

    fn start_code(&mut self, kind: CodeBlockKind<'_>) {
        if !self.lines.is_empty() {
            self.new_line(Line::default());
        }
        let lang = match &kind {
            CodeBlockKind::Fenced(lang) => lang.split_whitespace().next().unwrap_or(""),
            CodeBlockKind::Indented => "",
        };

        let mut top = vec![Span::styled("┌─", frame_style())];
        if !lang.is_empty() {
            top.push(Span::styled(
                format!(" {lang} "),
                frame_style().add_modifier(Modifier::BOLD),
            ));
        }
        self.new_line(Line::from(top));
        self.gutters.push(Span::styled("│ ", frame_style()));

        let highlighter = (!lang.is_empty())
            .then(|| SYNTAXES.find_syntax_by_token(lang))
            .flatten()
            .zip(THEMES.themes.get(CODE_THEME))
            .map(|(syntax, theme)| HighlightLines::new(syntax, theme));
        self.code = match highlighter {
            Some(h) => Code::Highlighted(Box::new(h)),
            None => Code::Plain,
        };
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph | TagEnd::HtmlBlock => self.gap = true,
            TagEnd::Heading(_) => {
                self.unnest();
                self.gap = true;
            }
            TagEnd::BlockQuote(_) => {
                self.gutters.pop();
                self.unnest();
                self.gap = true;
            }
            TagEnd::CodeBlock => {
                self.code = Code::Off;
                self.gutters.pop();
                self.new_line(Line::from(Span::styled("└─", frame_style())));
                self.gap = true;
            }
            TagEnd::List(_) => {
                self.lists.pop();
                self.gap = true;
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => self.unnest(),
            TagEnd::Link => {
                self.unnest();
                if let Some(url) = self.pending_link.take() {
                    self.append(Span::styled(format!(" <{url}>"), frame_style()));
                }
            }
            _ => {}
        }
    }

    fn html_block(&mut self, html: CowStr<'_>) {
        for line in html.lines() {
            self.new_line(Line::from(Span::styled(line.to_owned(), literal_html_style())));
        }
    }

    fn text(&mut self, text: CowStr<'_>) {
        // Tabs render as zero-width in ratatui.
        let text = text.replace('\t', "    ");

        match std::mem::replace(&mut self.code, Code::Off) {
            Code::Highlighted(mut highlighter) => {
                for source_line in LinesWithEndings::from(&text) {
                    let Ok(ranges) = highlighter.highlight_line(source_line, &SYNTAXES) else {
                        self.new_line(Line::from(source_line.trim_end_matches('\n').to_owned()));
                        continue;
                    };
                    let spans: Vec<Span<'static>> = ranges
                        .into_iter()
                        .map(|(style, piece)| {
                            let fg = style.foreground;
                            Span::styled(
                                piece.trim_end_matches('\n').to_owned(),
                                Style::default().fg(Color::Rgb(fg.r, fg.g, fg.b)),
                            )
                        })
                        .filter(|span| !span.content.is_empty())
                        .collect();
                    self.new_line(Line::from(spans));
                }
                self.code = Code::Highlighted(highlighter);
            }
            Code::Plain => {
                for source_line in text.lines() {
                    self.new_line(Line::from(Span::styled(
                        source_line.to_owned(),
                        Style::default().fg(Color::White),
                    )));
                }
                self.code = Code::Plain;
            }
            Code::Off => {
                let style = self.current();
                self.append(Span::styled(text, style));
            }
        }
    }
}

fn heading(fg: Color, level: HeadingLevel) -> Style {
    let base = Style::default().fg(fg).add_modifier(Modifier::BOLD);
    match level {
        HeadingLevel::H1 => base.add_modifier(Modifier::UNDERLINED),
        HeadingLevel::H2 => base,
        _ => base.add_modifier(Modifier::ITALIC),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &Text<'_>) -> Vec<String> {
        text.lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn heading_body_carries_heading_style() {
        let text = render("## Results", Color::Green);
        let line = &text.lines[0];
        let body = line.spans.iter().find(|s| s.content == "Results").unwrap();
        assert!(body.style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(body.style.fg, Some(Color::Green));
    }

    #[test]
    fn emphasis_nests() {
        let text = render("a ***both*** b", Color::Green);
        let span = text.lines[0]
            .spans
            .iter()
            .find(|s| s.content == "both")
            .unwrap();
        assert!(span.style.add_modifier.contains(Modifier::BOLD));
        assert!(span.style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn fenced_code_is_framed() {
        let lines = plain(&render("```\nx = 1\n```", Color::Green));
        assert!(lines[0].starts_with('┌'));
        assert_eq!(lines[1], "│ x = 1");
        assert!(lines.last().unwrap().starts_with('└'));
    }

    #[test]
    fn highlighted_code_keeps_text() {
        let lines = plain(&render("```rust\nfn main() {}\n```", Color::Green));
        assert!(lines[0].contains("rust"));
        assert!(lines.iter().any(|l| l.contains("fn main() {}")));
    }

    #[test]
    fn html_is_shown_literally() {
        let lines = plain(&render("<script>alert(1)</script>", Color::Green));
        assert!(lines.iter().any(|l| l.contains("<script>alert(1)</script>")));

        let text = render("click <b>here</b>", Color::Green);
        let tag = text.lines[0].spans.iter().find(|s| s.content == "<b>").unwrap();
        assert_eq!(tag.style, literal_html_style());
    }

    #[test]
    fn ordered_list_numbers_from_start() {
        let lines = plain(&render("3. c\n4. d", Color::Green));
        assert!(lines.iter().any(|l| l.starts_with("3. c")));
        assert!(lines.iter().any(|l| l.starts_with("4. d")));
    }

    #[test]
    fn link_destination_follows_text() {
        let lines = plain(&render("[docs](https://example.com)", Color::Green));
        assert_eq!(lines[0], "docs <https://example.com>");
    }

    #[test]
    fn tabs_become_spaces() {
        let lines = plain(&render("```\n\tx\n```", Color::Green));
        assert!(lines.iter().all(|l| !l.contains('\t')));
        assert!(lines.iter().any(|l| l.contains("    x")));
    }
}
