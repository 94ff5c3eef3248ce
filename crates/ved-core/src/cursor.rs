//! A single cursor: position, sticky column, selection.
//!
//! The cursor tracks a position in a buffer, a sticky column for vertical
//! movement, an optional selection anchor, and the most recently cleared
//! selection (restorable with `gv`). It is a plain value type — the buffer
//! is passed into the few methods that need bounds.
//!
//! # Sticky column
//!
//! When moving vertically, the cursor remembers the column it was at. If it
//! moves through a short line and then reaches a long line again, it snaps
//! back to the remembered column. Horizontal movement resets the sticky
//! column.
//!
//! # Selection
//!
//! `anchor` is the fixed end of a selection; the cursor position is the
//! moving head. The selection covers both endpoints (visual mode is
//! inclusive); [`Cursor::selection`] returns the half-open equivalent.

use crate::buffer::Buffer;
use crate::position::{Position, Range};

/// A cursor in a text buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    /// Current position.
    pos: Position,

    /// Remembered column for vertical movement.
    sticky_col: usize,

    /// Selection anchor — the "other end", staying put while the cursor
    /// moves.
    anchor: Option<Position>,

    /// The most recently cleared selection, as (anchor, head).
    saved: Option<(Position, Position)>,
}

impl Cursor {
    /// Create a cursor at the origin.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pos: Position::ZERO,
            sticky_col: 0,
            anchor: None,
            saved: None,
        }
    }

    /// Create a cursor at a specific position.
    #[must_use]
    pub const fn at(pos: Position) -> Self {
        Self {
            pos,
            sticky_col: pos.col,
            anchor: None,
            saved: None,
        }
    }

    // -- Accessors ----------------------------------------------------------

    /// Current position.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> Position {
        self.pos
    }

    /// Current line.
    #[inline]
    #[must_use]
    pub const fn line(&self) -> usize {
        self.pos.line
    }

    /// Current column.
    #[inline]
    #[must_use]
    pub const fn col(&self) -> usize {
        self.pos.col
    }

    /// The sticky column.
    #[inline]
    #[must_use]
    pub const fn sticky_col(&self) -> usize {
        self.sticky_col
    }

    /// The selection anchor, if a selection is active.
    #[inline]
    #[must_use]
    pub const fn anchor(&self) -> Option<Position> {
        self.anchor
    }

    /// True if a selection is active.
    #[inline]
    #[must_use]
    pub const fn has_selection(&self) -> bool {
        self.anchor.is_some()
    }

    /// The selected range as half-open `[min, past-max-char)` — both
    /// endpoints of the selection are covered. `None` without a selection.
    #[must_use]
    pub fn selection(&self, buf: &Buffer) -> Option<Range> {
        let anchor = self.anchor?;
        let ordered = Range::ordered(anchor, self.pos);
        Some(Range::new(ordered.start, buf.char_next(ordered.end)))
    }

    // -- Positioning ----------------------------------------------------------

    /// Move to an exact position, clamped to the buffer. Resets the sticky
    /// column. The selection anchor is unaffected.
    pub fn set_position(&mut self, pos: Position, buf: &Buffer, past_end: bool) {
        self.pos = clamp(pos, buf, past_end);
        self.sticky_col = self.pos.col;
    }

    /// Move to a position keeping the sticky column — for vertical motions.
    pub fn set_position_vertical(&mut self, pos: Position, buf: &Buffer, past_end: bool) {
        self.pos = clamp(pos, buf, past_end);
    }

    /// Ensure the cursor (and anchor) are within buffer bounds. Call after
    /// buffer mutations.
    pub fn clamp(&mut self, buf: &Buffer, past_end: bool) {
        self.pos = clamp(self.pos, buf, past_end);
        if let Some(anchor) = &mut self.anchor {
            *anchor = clamp(*anchor, buf, past_end);
        }
    }

    // -- Selection control ----------------------------------------------------

    /// Anchor a selection at the current position.
    pub fn selection_start(&mut self) {
        self.anchor = Some(self.pos);
    }

    /// Set the selection to an explicit range. The anchor lands on the first
    /// character, the cursor on the last.
    pub fn selection_set(&mut self, range: Range, buf: &Buffer) {
        self.anchor = Some(range.start);
        let last = if range.is_empty() {
            range.start
        } else {
            buf.char_prev(range.end)
        };
        self.pos = clamp(last, buf, false);
        self.sticky_col = self.pos.col;
    }

    /// Swap anchor and head — move the cursor to the other end.
    pub fn selection_swap(&mut self) {
        if let Some(anchor) = self.anchor {
            self.anchor = Some(self.pos);
            self.pos = anchor;
            self.sticky_col = self.pos.col;
        }
    }

    /// Clear the selection, saving it for [`Cursor::selection_restore`].
    pub fn selection_clear(&mut self) {
        if let Some(anchor) = self.anchor.take() {
            self.saved = Some((anchor, self.pos));
        }
    }

    /// Restore the most recently cleared selection. Returns `true` when
    /// there was one.
    pub fn selection_restore(&mut self, buf: &Buffer) -> bool {
        let Some((anchor, head)) = self.saved else {
            return false;
        };
        self.anchor = Some(clamp(anchor, buf, false));
        self.pos = clamp(head, buf, false);
        self.sticky_col = self.pos.col;
        true
    }

    /// The saved selection, if any.
    #[must_use]
    pub const fn saved_selection(&self) -> Option<(Position, Position)> {
        self.saved
    }

    /// Record a selection as the saved one without it being live.
    pub(crate) fn set_saved_selection(&mut self, anchor: Position, head: Position) {
        self.saved = Some((anchor, head));
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Maximum valid column for a line: on-a-character in normal-like modes,
/// one-past in insert-like modes.
fn max_col_for_line(buf: &Buffer, line: usize, past_end: bool) -> usize {
    let content_len = buf.line_content_len(line).unwrap_or(0);
    if past_end {
        content_len
    } else {
        content_len.saturating_sub(1)
    }
}

/// Clamp a position to valid buffer bounds.
fn clamp(pos: Position, buf: &Buffer, past_end: bool) -> Position {
    if buf.is_empty() {
        return Position::ZERO;
    }
    let line = pos.line.min(buf.line_count().saturating_sub(1));
    let col = pos.col.min(max_col_for_line(buf, line, past_end));
    Position::new(line, col)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn p(line: usize, col: usize) -> Position {
        Position::new(line, col)
    }

    fn buf() -> Buffer {
        Buffer::from_text("hello\nworld\nhi\n\ngoodbye")
    }

    // -- Construction -------------------------------------------------------

    #[test]
    fn new_at_origin() {
        let c = Cursor::new();
        assert_eq!(c.position(), Position::ZERO);
        assert!(!c.has_selection());
        assert!(c.saved_selection().is_none());
    }

    #[test]
    fn at_sets_sticky() {
        let c = Cursor::at(p(3, 7));
        assert_eq!(c.position(), p(3, 7));
        assert_eq!(c.sticky_col(), 7);
    }

    // -- Positioning --------------------------------------------------------

    #[test]
    fn set_position_clamps_normal() {
        let buf = buf();
        let mut c = Cursor::new();
        c.set_position(p(100, 100), &buf, false);
        assert_eq!(c.position(), p(4, 6)); // "goodbye", last char
    }

    #[test]
    fn set_position_past_end() {
        let buf = buf();
        let mut c = Cursor::new();
        c.set_position(p(0, 100), &buf, true);
        assert_eq!(c.position(), p(0, 5));
    }

    #[test]
    fn set_position_resets_sticky() {
        let buf = buf();
        let mut c = Cursor::at(p(0, 4));
        c.set_position(p(1, 2), &buf, false);
        assert_eq!(c.sticky_col(), 2);
    }

    #[test]
    fn vertical_keeps_sticky() {
        let buf = buf();
        let mut c = Cursor::at(p(0, 4));
        // Through the short line "hi"...
        c.set_position_vertical(p(2, 4), &buf, false);
        assert_eq!(c.position(), p(2, 1));
        assert_eq!(c.sticky_col(), 4);
        // ...and back out to a long one.
        c.set_position_vertical(p(4, 4), &buf, false);
        assert_eq!(c.position(), p(4, 4));
    }

    #[test]
    fn clamp_after_shrink() {
        let mut b = Buffer::from_text("hello world");
        let mut c = Cursor::at(p(0, 10));
        b.delete(Range::new(p(0, 5), p(0, 11)));
        c.clamp(&b, false);
        assert_eq!(c.col(), 4);
    }

    #[test]
    fn clamp_empty_buffer() {
        let b = Buffer::new();
        let mut c = Cursor::at(p(10, 10));
        c.clamp(&b, false);
        assert_eq!(c.position(), Position::ZERO);
    }

    #[test]
    fn clamp_also_clamps_anchor() {
        let mut b = Buffer::from_text("hello\nworld");
        let mut c = Cursor::at(p(1, 4));
        c.selection_start();
        b.delete(Range::new(p(0, 3), p(1, 5)));
        c.clamp(&b, false);
        assert_eq!(c.position(), p(0, 2));
        assert_eq!(c.anchor(), Some(p(0, 2)));
    }

    // -- Selection ----------------------------------------------------------

    #[test]
    fn selection_covers_both_ends() {
        let b = Buffer::from_text("hello");
        let mut c = Cursor::at(p(0, 1));
        c.selection_start();
        c.set_position(p(0, 3), &b, false);
        // Chars 1..=3 selected → half-open [1, 4).
        assert_eq!(c.selection(&b), Some(Range::new(p(0, 1), p(0, 4))));
    }

    #[test]
    fn selection_backwards_is_ordered() {
        let b = Buffer::from_text("hello");
        let mut c = Cursor::at(p(0, 3));
        c.selection_start();
        c.set_position(p(0, 1), &b, false);
        assert_eq!(c.selection(&b), Some(Range::new(p(0, 1), p(0, 4))));
    }

    #[test]
    fn selection_single_char() {
        let b = Buffer::from_text("hello");
        let mut c = Cursor::at(p(0, 2));
        c.selection_start();
        assert_eq!(c.selection(&b), Some(Range::new(p(0, 2), p(0, 3))));
    }

    #[test]
    fn selection_none_without_anchor() {
        let b = Buffer::from_text("x");
        assert_eq!(Cursor::new().selection(&b), None);
    }

    #[test]
    fn selection_set_lands_on_last_char() {
        let b = Buffer::from_text("hello world");
        let mut c = Cursor::new();
        c.selection_set(Range::new(p(0, 6), p(0, 11)), &b);
        assert_eq!(c.anchor(), Some(p(0, 6)));
        assert_eq!(c.position(), p(0, 10));
        assert_eq!(c.selection(&b), Some(Range::new(p(0, 6), p(0, 11))));
    }

    #[test]
    fn selection_swap_flips_ends() {
        let b = Buffer::from_text("hello");
        let mut c = Cursor::at(p(0, 1));
        c.selection_start();
        c.set_position(p(0, 3), &b, false);
        c.selection_swap();
        assert_eq!(c.position(), p(0, 1));
        assert_eq!(c.anchor(), Some(p(0, 3)));
        // The covered range is unchanged.
        assert_eq!(c.selection(&b), Some(Range::new(p(0, 1), p(0, 4))));
    }

    #[test]
    fn clear_saves_and_restore_brings_back() {
        let b = Buffer::from_text("hello");
        let mut c = Cursor::at(p(0, 1));
        c.selection_start();
        c.set_position(p(0, 3), &b, false);

        c.selection_clear();
        assert!(!c.has_selection());
        assert_eq!(c.saved_selection(), Some((p(0, 1), p(0, 3))));

        assert!(c.selection_restore(&b));
        assert_eq!(c.selection(&b), Some(Range::new(p(0, 1), p(0, 4))));
        assert_eq!(c.position(), p(0, 3));
    }

    #[test]
    fn restore_without_saved_is_false() {
        let b = Buffer::from_text("x");
        let mut c = Cursor::new();
        assert!(!c.selection_restore(&b));
    }

    #[test]
    fn clear_without_selection_keeps_saved() {
        let b = Buffer::from_text("hello");
        let mut c = Cursor::at(p(0, 1));
        c.selection_start();
        c.selection_clear();
        let saved = c.saved_selection();
        // A second clear with no live selection must not wipe the slot.
        c.selection_clear();
        assert_eq!(c.saved_selection(), saved);
        assert!(c.selection_restore(&b));
    }
}
