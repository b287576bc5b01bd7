//! Command history: ordered submissions with a recall cursor.
//!
//! Entries are stored oldest first and never expire; only an explicit
//! session reset clears them.  The cursor normally sits one past the
//! newest entry (the live editing line) and recall moves it by a signed
//! delta, clamped so it always lands on a stored entry.

// ── CommandHistory ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct CommandHistory {
    entries: Vec<String>,
    /// `entries.len()` = at the live editing line; less = that entry.
    cursor: usize,
}

impl CommandHistory {
    pub fn new() -> CommandHistory {
        CommandHistory::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ── Recording ─────────────────────────────────────────────────────────────

    /// Record `line` as the most recent submission.
    ///
    /// A line identical to the immediately preceding entry is not stored
    /// again; non-adjacent repeats are.  Either way the cursor returns to
    /// the live editing line.
    pub fn record(&mut self, line: &str) {
        if self.entries.last().map(String::as_str) != Some(line) {
            self.entries.push(line.to_owned());
        }
        self.cursor = self.entries.len();
    }

    // ── Recall ────────────────────────────────────────────────────────────────

    /// Move the cursor by `delta` (negative = older, positive = newer) and
    /// return the entry it lands on.  The cursor is clamped to the stored
    /// range, so stepping past either end re-yields the boundary entry.
    /// `None` only when the history is empty.
    pub fn recall(&mut self, delta: i32) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        let target = self.cursor as i64 + delta as i64;
        let last = self.entries.len() as i64 - 1;
        self.cursor = target.clamp(0, last) as usize;
        self.entries.get(self.cursor).map(String::as_str)
    }

    /// Forget all entries and return the cursor to the live line.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_adds_entry() {
        let mut h = CommandHistory::new();
        h.record("print 1.");
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn adjacent_duplicates_collapse() {
        let mut h = CommandHistory::new();
        h.record("stage.");
        h.record("stage.");
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn interleaved_duplicates_are_kept() {
        let mut h = CommandHistory::new();
        h.record("stage.");
        h.record("print alt.");
        h.record("stage.");
        assert_eq!(h.len(), 3);
    }

    #[test]
    fn empty_line_is_recorded_once() {
        let mut h = CommandHistory::new();
        h.record("");
        h.record("");
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn recall_walks_back_from_newest() {
        let mut h = CommandHistory::new();
        h.record("one.");
        h.record("two.");
        h.record("three.");
        assert_eq!(h.recall(-1), Some("three."));
        assert_eq!(h.recall(-1), Some("two."));
        assert_eq!(h.recall(-1), Some("one."));
    }

    #[test]
    fn recall_clamps_at_both_ends() {
        let mut h = CommandHistory::new();
        h.record("one.");
        h.record("two.");
        assert_eq!(h.recall(-100), Some("one."));
        assert_eq!(h.recall(-1), Some("one."));
        assert_eq!(h.recall(1), Some("two."));
        assert_eq!(h.recall(1), Some("two."));
    }

    #[test]
    fn recall_of_empty_history_is_none() {
        let mut h = CommandHistory::new();
        assert_eq!(h.recall(-1), None);
    }

    #[test]
    fn record_resets_the_cursor() {
        let mut h = CommandHistory::new();
        h.record("one.");
        h.record("two.");
        assert_eq!(h.recall(-2), Some("one."));
        h.record("three.");
        // Back at the live line; one step up is the newest entry.
        assert_eq!(h.recall(-1), Some("three."));
    }

    #[test]
    fn deduped_record_still_resets_the_cursor() {
        let mut h = CommandHistory::new();
        h.record("one.");
        h.record("two.");
        h.recall(-2);
        h.record("two.");
        assert_eq!(h.len(), 2);
        assert_eq!(h.recall(-1), Some("two."));
    }

    #[test]
    fn clear_forgets_everything() {
        let mut h = CommandHistory::new();
        h.record("one.");
        h.clear();
        assert!(h.is_empty());
        assert_eq!(h.recall(-1), None);
    }
}
