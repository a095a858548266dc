//! Pure wrapping utilities and dimensional constants for the InputBox.
//!
//! Text is hard-wrapped by display width (`unicode-width`), so every display
//! row maps to an exact byte range of the buffer and cursor math stays exact
//! for wide characters.

use unicode_width::UnicodeWidthChar;

/// Border (2) + padding (2) consumed horizontally by the bordered block
pub(super) const HORIZONTAL_OVERHEAD: u16 = 4;
/// Top + bottom borders consumed vertically
pub(super) const VERTICAL_OVERHEAD: u16 = 2;
/// Maximum visible content lines before internal scrolling kicks in
pub(super) const MAX_VISIBLE_LINES: u16 = 4;
/// Offset from area edge to content (border + left padding)
pub(super) const CONTENT_OFFSET: u16 = 2;

/// One display row: the byte range `start..end` of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Row {
    pub start: usize,
    pub end: usize,
}

/// Inner content width after subtracting border/padding overhead.
/// Returns 0 if the area is too narrow.
pub(super) fn inner_width(content_width: u16) -> u16 {
    content_width.saturating_sub(HORIZONTAL_OVERHEAD)
}

pub(super) fn char_width(c: char) -> usize {
    c.width().unwrap_or(0)
}

/// Split `text` into display rows at most `width` columns wide. Newlines end
/// a row and are not part of any row. Always returns at least one row.
pub(super) fn layout_rows(text: &str, width: u16) -> Vec<Row> {
    let width = usize::from(width.max(1));
    let mut rows = Vec::new();
    let mut start = 0;
    let mut used = 0;

    for (i, c) in text.char_indices() {
        if c == '\n' {
            rows.push(Row { start, end: i });
            start = i + 1;
            used = 0;
            continue;
        }
        let w = char_width(c);
        if used + w > width && used > 0 {
            rows.push(Row { start, end: i });
            start = i;
            used = 0;
        }
        used += w;
    }
    rows.push(Row {
        start,
        end: text.len(),
    });
    rows
}

pub(super) fn wrap_line_count(text: &str, width: u16) -> u16 {
    layout_rows(text, width).len() as u16
}

/// Row index and display column of byte offset `pos`. At a soft wrap the
/// cursor belongs to the start of the following row.
pub(super) fn locate(text: &str, rows: &[Row], pos: usize) -> (usize, usize) {
    let row = rows
        .iter()
        .rposition(|r| r.start <= pos)
        .unwrap_or(0);
    let r = rows[row];
    let col = text[r.start..pos.min(r.end).max(r.start)]
        .chars()
        .map(char_width)
        .sum();
    (row, col)
}

/// Byte offset in `row` closest to display column `col` without passing it.
pub(super) fn offset_at_column(text: &str, row: Row, col: usize) -> usize {
    let mut used = 0;
    for (i, c) in text[row.start..row.end].char_indices() {
        let w = char_width(c);
        if used + w > col {
            return row.start + i;
        }
        used += w;
    }
    row.end
}

/// Byte offset of the previous character boundary before `pos` in `text`.
pub(super) fn prev_char_boundary(text: &str, pos: usize) -> usize {
    text[..pos]
        .char_indices()
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Byte offset of the next character boundary after `pos` in `text`.
pub(super) fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .char_indices()
        .nth(1)
        .map(|(i, _)| pos + i)
        .unwrap_or(text.len())
}
