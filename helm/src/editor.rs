//! Line editor: the session's input buffer and cursor operations.
//!
//! The buffer is a `Vec<char>` so that cursor movement and editing work in
//! Unicode characters rather than bytes.  [`LineEditor::pos`] is always a
//! valid char index (`0..=len`).

// ── LineEditor ────────────────────────────────────────────────────────────────

/// Editable input line with a cursor.
#[derive(Debug, Clone, Default)]
pub struct LineEditor {
    buffer: Vec<char>,
    /// Cursor position (0 = before first char, `len()` = after last).
    pub pos: usize,
    /// Cached UTF-8 form of `buffer`, rebuilt lazily when `dirty`.
    cached_text: String,
    dirty: bool,
}

impl LineEditor {
    pub fn new() -> LineEditor {
        LineEditor::default()
    }

    // ── Buffer access ─────────────────────────────────────────────────────────

    /// Current content.  Rebuilds the backing `String` only when the buffer
    /// changed since the last call, so repeat calls between edits are free.
    pub fn text_ref(&mut self) -> &str {
        if self.dirty {
            self.cached_text.clear();
            self.cached_text.extend(self.buffer.iter());
            self.dirty = false;
        }
        &self.cached_text
    }

    /// Current content as an owned `String`.
    pub fn text(&mut self) -> String {
        self.text_ref().to_owned()
    }

    /// Number of characters in the buffer.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Consume the buffer contents, leaving the editor empty.
    pub fn take_line(&mut self) -> String {
        let line = self.text_ref().to_owned();
        self.clear();
        line
    }

    /// Empty the buffer and reset the cursor.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.pos = 0;
        self.cached_text.clear();
        self.dirty = false;
    }

    /// Replace the entire buffer with `text`, cursor at the end.
    pub fn set_text(&mut self, text: &str) {
        self.buffer = text.chars().collect();
        self.pos = self.buffer.len();
        self.dirty = true;
    }

    // ── Editing ───────────────────────────────────────────────────────────────

    /// Insert `ch` at the cursor, advancing the cursor.
    pub fn insert_char(&mut self, ch: char) {
        self.buffer.insert(self.pos, ch);
        self.pos += 1;
        self.dirty = true;
    }

    /// Insert `s` at the cursor, advancing past it.
    pub fn insert_str(&mut self, s: &str) {
        for ch in s.chars() {
            self.insert_char(ch);
        }
    }

    /// Delete the character before the cursor (backspace).
    /// Returns `true` if a character was deleted.
    pub fn delete_before(&mut self) -> bool {
        if self.pos == 0 {
            return false;
        }
        self.pos -= 1;
        self.buffer.remove(self.pos);
        self.dirty = true;
        true
    }

    /// Delete the character under the cursor (forward delete).
    /// Returns `true` if a character was deleted.
    pub fn delete_at(&mut self) -> bool {
        if self.pos >= self.buffer.len() {
            return false;
        }
        self.buffer.remove(self.pos);
        self.dirty = true;
        true
    }

    // ── Cursor movement ───────────────────────────────────────────────────────

    /// Move the cursor left by up to `n` characters.
    pub fn move_left(&mut self, n: usize) {
        self.pos = self.pos.saturating_sub(n);
    }

    /// Move the cursor right by up to `n` characters.
    pub fn move_right(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.buffer.len());
    }

    pub fn move_home(&mut self) {
        self.pos = 0;
    }

    pub fn move_end(&mut self) {
        self.pos = self.buffer.len();
    }

    /// Move the cursor to an absolute position, clamped to `[0, len]`.
    pub fn move_to(&mut self, pos: usize) {
        self.pos = pos.min(self.buffer.len());
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_builds_text() {
        let mut ed = LineEditor::new();
        ed.insert_str("print 1.");
        assert_eq!(ed.text(), "print 1.");
        assert_eq!(ed.pos, 8);
    }

    #[test]
    fn insert_at_middle() {
        let mut ed = LineEditor::new();
        ed.insert_str("st x.");
        ed.move_home();
        ed.insert_char('s');
        ed.insert_char('e');
        assert_eq!(ed.text(), "sest x.");
        assert_eq!(ed.pos, 2);
    }

    #[test]
    fn delete_before_cursor() {
        let mut ed = LineEditor::new();
        ed.insert_str("wait 10.");
        assert!(ed.delete_before());
        assert_eq!(ed.text(), "wait 10");
        assert_eq!(ed.pos, 7);
    }

    #[test]
    fn delete_before_at_start_returns_false() {
        let mut ed = LineEditor::new();
        ed.insert_str("hi");
        ed.move_home();
        assert!(!ed.delete_before());
    }

    #[test]
    fn delete_at_cursor() {
        let mut ed = LineEditor::new();
        ed.insert_str("stage.");
        ed.move_home();
        assert!(ed.delete_at());
        assert_eq!(ed.text(), "tage.");
        assert_eq!(ed.pos, 0);
    }

    #[test]
    fn delete_at_end_returns_false() {
        let mut ed = LineEditor::new();
        ed.insert_str("hi");
        assert!(!ed.delete_at());
    }

    #[test]
    fn movement_is_clamped() {
        let mut ed = LineEditor::new();
        ed.insert_str("abc");
        ed.move_left(100);
        assert_eq!(ed.pos, 0);
        ed.move_right(100);
        assert_eq!(ed.pos, 3);
        ed.move_to(1);
        assert_eq!(ed.pos, 1);
        ed.move_to(99);
        assert_eq!(ed.pos, 3);
    }

    #[test]
    fn take_line_resets() {
        let mut ed = LineEditor::new();
        ed.insert_str("print 1.");
        let line = ed.take_line();
        assert_eq!(line, "print 1.");
        assert!(ed.is_empty());
        assert_eq!(ed.pos, 0);
    }

    #[test]
    fn set_text_places_cursor_at_end() {
        let mut ed = LineEditor::new();
        ed.set_text("toggle brakes.");
        assert_eq!(ed.pos, 14);
        assert_eq!(ed.text(), "toggle brakes.");
    }

    #[test]
    fn unicode_counts_chars_not_bytes() {
        let mut ed = LineEditor::new();
        ed.insert_str("set café to 1.");
        assert_eq!(ed.len(), 14);
        ed.move_to(8);
        ed.delete_before();
        assert_eq!(ed.text(), "set caf to 1.");
        assert_eq!(ed.pos, 7);
    }
}
