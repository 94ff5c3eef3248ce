//! The prompt — a single editable line for `:` commands and searches.
//!
//! Entering prompt mode saves the mode that was active; `<Enter>` submits
//! the line and restores it, `<Esc>` aborts, and backspace on an empty line
//! also aborts. The leading character (`:`, `/`, `?`) selects what the
//! submission means and is rendered by the UI, not stored in the line.

use crate::mode::ModeId;

/// The prompt state while prompt mode is active.
#[derive(Debug, Clone)]
pub struct Prompt {
    /// `:` for commands, `/` and `?` for searches.
    leader: char,
    /// The line being edited, without the leader.
    line: String,
    /// Cursor position within the line (char offset).
    cursor: usize,
    /// The mode to restore on submit or abort.
    saved_mode: ModeId,
}

impl Prompt {
    /// Open a prompt with a leader and preset text. The cursor starts at the
    /// end of the preset.
    #[must_use]
    pub fn new(leader: char, preset: &str, saved_mode: ModeId) -> Self {
        Self {
            leader,
            line: preset.to_string(),
            cursor: preset.chars().count(),
            saved_mode,
        }
    }

    /// The prompt leader (`:`, `/`, `?`).
    #[inline]
    #[must_use]
    pub const fn leader(&self) -> char {
        self.leader
    }

    /// The current line text.
    #[inline]
    #[must_use]
    pub fn line(&self) -> &str {
        &self.line
    }

    /// Cursor position within the line (char offset).
    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// The mode to restore when the prompt closes.
    #[inline]
    #[must_use]
    pub const fn saved_mode(&self) -> ModeId {
        self.saved_mode
    }

    /// True when the line is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.line.is_empty()
    }

    /// Insert a character at the cursor.
    pub fn insert_char(&mut self, ch: char) {
        let at = self.byte_of(self.cursor);
        self.line.insert(at, ch);
        self.cursor += 1;
    }

    /// Delete the character before the cursor. Returns `false` at the start
    /// of the line — the caller aborts the prompt when the line is empty.
    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        let at = self.byte_of(self.cursor);
        self.line.remove(at);
        true
    }

    /// Delete the character at the cursor. Returns `false` at the end.
    pub fn delete(&mut self) -> bool {
        if self.cursor >= self.line.chars().count() {
            return false;
        }
        let at = self.byte_of(self.cursor);
        self.line.remove(at);
        true
    }

    /// Move the cursor one char left.
    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Move the cursor one char right.
    pub fn move_right(&mut self) {
        let len = self.line.chars().count();
        if self.cursor < len {
            self.cursor += 1;
        }
    }

    /// Move the cursor to the start of the line.
    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    /// Move the cursor to the end of the line.
    pub fn move_end(&mut self) {
        self.cursor = self.line.chars().count();
    }

    /// Take the line out, consuming the prompt's content.
    #[must_use]
    pub fn take_line(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.line)
    }

    fn byte_of(&self, char_idx: usize) -> usize {
        self.line
            .char_indices()
            .nth(char_idx)
            .map_or(self.line.len(), |(i, _)| i)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
