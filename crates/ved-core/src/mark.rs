//! Marks — named positions that track through edits.
//!
//! A mark remembers a position in the buffer. Unlike a raw [`Position`],
//! marks *migrate*: when text is inserted or deleted before a mark, the mark
//! shifts so it keeps naming the same character. A mark inside a deleted
//! range becomes invalid (unset).
//!
//! Ids are `a`–`z` for user marks plus `<` and `>` for the start and end of
//! the last selection. The store is notified of every buffer mutation via
//! [`MarkStore::adjust_insert`] and [`MarkStore::adjust_delete`].

use crate::position::{Position, Range};

// ---------------------------------------------------------------------------
// MarkId
// ---------------------------------------------------------------------------

/// A mark name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkId {
    /// `a`–`z`.
    Named(char),
    /// `<` — start of the last selection.
    SelectionStart,
    /// `>` — end of the last selection.
    SelectionEnd,
}

impl MarkId {
    /// Parse a mark id from its key character.
    #[must_use]
    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            'a'..='z' => Some(Self::Named(ch)),
            '<' => Some(Self::SelectionStart),
            '>' => Some(Self::SelectionEnd),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// MarkStore
// ---------------------------------------------------------------------------

/// All marks of a buffer.
#[derive(Debug, Default)]
pub struct MarkStore {
    named: [Option<Position>; 26],
    selection_start: Option<Position>,
    selection_end: Option<Position>,
}

impl MarkStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a mark. Setting reuses the id, replacing any previous position.
    pub fn set(&mut self, id: MarkId, pos: Position) {
        *self.slot(id) = Some(pos);
    }

    /// The position of a mark, or `None` if unset or invalidated.
    #[must_use]
    pub fn get(&self, id: MarkId) -> Option<Position> {
        match id {
            MarkId::Named(ch) => self.named[(ch as u8 - b'a') as usize],
            MarkId::SelectionStart => self.selection_start,
            MarkId::SelectionEnd => self.selection_end,
        }
    }

    fn slot(&mut self, id: MarkId) -> &mut Option<Position> {
        match id {
            MarkId::Named(ch) => &mut self.named[(ch as u8 - b'a') as usize],
            MarkId::SelectionStart => &mut self.selection_start,
            MarkId::SelectionEnd => &mut self.selection_end,
        }
    }

    fn for_each(&mut self, mut f: impl FnMut(Position) -> Option<Position>) {
        for slot in self
            .named
            .iter_mut()
            .chain([&mut self.selection_start, &mut self.selection_end])
        {
            if let Some(pos) = *slot {
                *slot = f(pos);
            }
        }
    }

    /// Shift marks for an insertion of text spanning `[at, end)`.
    ///
    /// `end` is the position just past the inserted text (see the insert's
    /// recorded extent). Marks at or after `at` move with the text.
    pub fn adjust_insert(&mut self, at: Position, end: Position) {
        self.for_each(|mark| Some(shift_insert(mark, at, end)));
    }

    /// Shift marks for a deletion of `range`. Marks inside the range become
    /// invalid; marks after it shift back.
    pub fn adjust_delete(&mut self, range: Range) {
        self.for_each(|mark| shift_delete(mark, range));
    }
}

// ---------------------------------------------------------------------------
// Position migration
// ---------------------------------------------------------------------------

/// Where `pos` lands after text spanning `[at, end)` was inserted.
/// Positions before `at` stay; positions at or after it move with the text.
pub(crate) fn shift_insert(pos: Position, at: Position, end: Position) -> Position {
    if pos < at {
        return pos;
    }
    let line_delta = end.line - at.line;
    if pos.line == at.line {
        // Same line as the insertion point: the column shifts onto the end
        // of the inserted text.
        Position::new(end.line, end.col + (pos.col - at.col))
    } else {
        Position::new(pos.line + line_delta, pos.col)
    }
}

/// Where `pos` lands after `range` was deleted. `None` when the position was
/// inside the deleted text.
pub(crate) fn shift_delete(pos: Position, range: Range) -> Option<Position> {
    if pos < range.start {
        return Some(pos);
    }
    if pos < range.end {
        return None;
    }
    let line_delta = range.end.line - range.start.line;
    if pos.line == range.end.line {
        Some(Position::new(
            range.start.line,
            range.start.col + (pos.col - range.end.col),
        ))
    } else {
        Some(Position::new(pos.line - line_delta, pos.col))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
