//! Wrapped-line geometry for the draft.
//!
//! The draft is split into visual lines, each a byte range into the draft.
//! Cursor placement and vertical movement work on those ranges, so the
//! cursor stays a plain byte offset into the `Composer`'s text.

use unicode_width::UnicodeWidthStr;

/// Border (2) + padding (2).
pub(super) const HORIZONTAL_OVERHEAD: u16 = 4;
/// Top + bottom borders.
pub(super) const VERTICAL_OVERHEAD: u16 = 2;
/// Visible content lines before the box scrolls internally.
pub(super) const MAX_VISIBLE_LINES: u16 = 5;

pub(super) fn inner_width(area_width: u16) -> u16 {
    area_width.saturating_sub(HORIZONTAL_OVERHEAD)
}

/// One row of wrapped text: `text[start..end]`, trailing separator spaces
/// excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct VisualLine {
    pub start: usize,
    pub end: usize,
}

fn wrap_options(width: u16) -> textwrap::Options<'static> {
    textwrap::Options::new(width.max(1) as usize)
        .break_words(true)
        .word_separator(textwrap::WordSeparator::AsciiSpace)
}

/// Split `text` into visual lines at `width` columns. Always returns at
/// least one line.
pub(super) fn visual_lines(text: &str, width: u16) -> Vec<VisualLine> {
    let mut lines = Vec::new();
    let mut logical_start = 0;

    for logical in text.split('\n') {
        if logical.is_empty() {
            lines.push(VisualLine {
                start: logical_start,
                end: logical_start,
            });
        } else {
            let mut search_from = 0;
            for segment in textwrap::wrap(logical, wrap_options(width)) {
                let offset = logical[search_from..]
                    .find(segment.as_ref())
                    .map_or(search_from, |i| search_from + i);
                let end = offset + segment.len();
                lines.push(VisualLine {
                    start: logical_start + offset,
                    end: logical_start + end,
                });
                search_from = end;
            }
        }
        logical_start += logical.len() + 1;
    }

    lines
}

/// Visual line index and display column of byte offset `pos`.
pub(super) fn locate(text: &str, lines: &[VisualLine], pos: usize) -> (usize, u16) {
    let index = lines
        .iter()
        .rposition(|line| line.start <= pos)
        .unwrap_or(0);
    let start = lines.get(index).map_or(0, |line| line.start);
    let column = text.get(start..pos).map_or(0, |s| s.width());
    (index, column as u16)
}

/// Byte offset on `line` closest to display `column` without passing it.
pub(super) fn offset_at_column(text: &str, line: VisualLine, column: u16) -> usize {
    let mut width = 0usize;
    for (i, c) in text[line.start..line.end].char_indices() {
        let next = width + unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if next > column as usize {
            return line.start + i;
        }
        width = next;
    }
    line.end
}

pub(super) fn prev_char_boundary(text: &str, pos: usize) -> usize {
    text[..pos]
        .char_indices()
        .next_back()
        .map_or(0, |(i, _)| i)
}

pub(super) fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .chars()
        .next()
        .map_or(text.len(), |c| pos + c.len_utf8())
}
