//! Cursor position tracking and navigation for the InputBox.
//!
//! `CursorState` owns the cursor byte offset, scroll offset, and cached width.
//! All navigation methods accept `buffer: &str` explicitly; the text data is
//! owned by `InputBox`.

use super::text_wrap::{
    CONTENT_OFFSET, MAX_VISIBLE_LINES, inner_width, layout_rows, locate, offset_at_column,
};
use ratatui::layout::Rect;

/// Cursor and scroll state, separated from the text buffer.
pub(super) struct CursorState {
    /// Cursor position as byte offset in buffer (0..=buffer.len())
    pub pos: usize,
    /// First visible row (0 when content fits in viewport)
    pub scroll_offset: u16,
    /// Cached content width from last render (used for cursor movement)
    pub last_content_width: u16,
}

impl CursorState {
    const DEFAULT_WIDTH: u16 = 80;

    pub fn new() -> Self {
        Self {
            pos: 0,
            scroll_offset: 0,
            last_content_width: Self::DEFAULT_WIDTH,
        }
    }

    /// Reset cursor to start (used after Submit clears the buffer).
    pub fn reset(&mut self) {
        self.pos = 0;
        self.scroll_offset = 0;
    }

    /// Move the cursor one display row up or down, keeping its column where
    /// the target row is long enough.
    ///
    /// Returns `true` if cursor moved, `false` if already at boundary.
    pub fn move_vertically(&mut self, buffer: &str, direction: i16) -> bool {
        let rows = layout_rows(buffer, inner_width(self.last_content_width));
        let (row, col) = locate(buffer, &rows, self.pos);

        let target = if direction < 0 {
            match row.checked_sub(1) {
                Some(t) => t,
                None => return false,
            }
        } else {
            if row + 1 >= rows.len() {
                return false;
            }
            row + 1
        };

        self.pos = offset_at_column(buffer, rows[target], col);
        true
    }

    /// Update scroll offset to keep cursor visible within the viewport.
    pub fn update_scroll_offset(&mut self, buffer: &str, content_width: u16) {
        let rows = layout_rows(buffer, inner_width(content_width));
        if rows.len() as u16 <= MAX_VISIBLE_LINES {
            self.scroll_offset = 0;
            return;
        }

        let (row, _) = locate(buffer, &rows, self.pos);
        let row = row as u16;
        if row < self.scroll_offset {
            self.scroll_offset = row;
        } else if row >= self.scroll_offset + MAX_VISIBLE_LINES {
            self.scroll_offset = row.saturating_sub(MAX_VISIBLE_LINES - 1);
        }
    }

    /// Screen position (column, row) of the cursor inside `area`.
    pub fn screen_pos(&self, buffer: &str, area: Rect) -> (u16, u16) {
        let rows = layout_rows(buffer, inner_width(area.width));
        let (row, col) = locate(buffer, &rows, self.pos);
        let visible_row = (row as u16).saturating_sub(self.scroll_offset);
        (
            area.x + CONTENT_OFFSET + col as u16,
            area.y + 1 + visible_row,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_down_keeps_column() {
        let mut cursor = CursorState::new();
        let buffer = "hello\nworld";
        cursor.pos = 2;
        assert!(cursor.move_vertically(buffer, 1));
        assert_eq!(cursor.pos, 8);
        assert!(!cursor.move_vertically(buffer, 1));
        assert!(cursor.move_vertically(buffer, -1));
        assert_eq!(cursor.pos, 2);
        assert!(!cursor.move_vertically(buffer, -1));
    }

    #[test]
    fn scroll_follows_cursor() {
        let mut cursor = CursorState::new();
        let buffer = "1\n2\n3\n4\n5\n6";
        cursor.pos = buffer.len();
        cursor.update_scroll_offset(buffer, 40);
        assert_eq!(cursor.scroll_offset, 2);

        cursor.pos = 0;
        cursor.update_scroll_offset(buffer, 40);
        assert_eq!(cursor.scroll_offset, 0);
    }

    #[test]
    fn screen_pos_accounts_for_border_and_padding() {
        let mut cursor = CursorState::new();
        cursor.pos = 3;
        let area = Rect::new(10, 20, 40, 3);
        assert_eq!(cursor.screen_pos("abc", area), (15, 21));
    }
}
