//! Undo history — snapshot-delimited, chronologically navigable.
//!
//! Records every buffer mutation as a reversible [`Edit`] grouped into
//! transactions. A transaction is the atomic unit of undo/redo:
//!
//! - **Normal mode**: each operator execution is exactly one transaction.
//! - **Insert mode**: everything from entering insert to leaving it.
//!
//! Each committed transaction is timestamped, which supports chronological
//! navigation (`earlier`/`later` with a count) in addition to the plain
//! undo/redo pair. On a linear chain the two differ only in counting; both
//! return the cursor position to restore.
//!
//! # Usage
//!
//! ```text
//! history.begin(cursor_position);
//! // perform edits on the buffer, recording each one:
//! history.record_insert(pos, text);
//! history.record_delete(pos, deleted_text);
//! // finalize:
//! history.commit(cursor_position);
//! ```
//!
//! Empty transactions (no edits between begin and commit) are silently
//! discarded — they don't clutter the undo stack.

use std::time::SystemTime;

use crate::buffer::Buffer;
use crate::position::{Position, Range};

// ---------------------------------------------------------------------------
// Edit
// ---------------------------------------------------------------------------

/// A single reversible buffer edit.
///
/// Records the position and text involved, which is enough to reconstruct
/// both the forward and reverse operations.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Edit {
    /// Text was inserted at `pos`. Undo = delete it. Redo = insert it.
    Insert { pos: Position, text: String },

    /// Text was deleted starting at `pos`. Undo = insert it back. Redo =
    /// delete it again.
    Delete { pos: Position, text: String },
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A group of edits that undo/redo as one atomic unit.
///
/// Tracks cursor positions so that undo restores the cursor to where it was
/// before the transaction and redo to where it was after, plus the wall-clock
/// time the transaction was committed.
#[derive(Debug, Clone)]
struct Transaction {
    edits: Vec<Edit>,
    cursor_before: Position,
    cursor_after: Position,
    committed_at: SystemTime,
}

impl Transaction {
    /// Apply this transaction's edits in reverse to undo them.
    fn undo(&self, buf: &mut Buffer) {
        for edit in self.edits.iter().rev() {
            match edit {
                Edit::Insert { pos, text } => {
                    let end = end_after_insert(*pos, text);
                    buf.delete(Range::new(*pos, end));
                }
                Edit::Delete { pos, text } => {
                    buf.insert(*pos, text);
                }
            }
        }
    }

    /// Re-apply this transaction's edits in forward order.
    fn redo(&self, buf: &mut Buffer) {
        for edit in &self.edits {
            match edit {
                Edit::Insert { pos, text } => {
                    buf.insert(*pos, text);
                }
                Edit::Delete { pos, text } => {
                    let end = end_after_insert(*pos, text);
                    buf.delete(Range::new(*pos, end));
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// Undo history for a buffer.
///
/// Maintains two stacks: transactions that can be undone and transactions
/// that can be redone. New edits clear the redo stack (any new edit after an
/// undo discards the forward history, keeping the chain linear).
#[derive(Debug)]
pub struct History {
    undo_stack: Vec<Transaction>,
    redo_stack: Vec<Transaction>,
    pending: Option<Transaction>,
}

impl History {
    /// Create an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            pending: None,
        }
    }

    /// Start a new transaction. `cursor` is the cursor position before any
    /// edits in this transaction.
    ///
    /// If a previous transaction was still pending, it is auto-committed
    /// first.
    pub fn begin(&mut self, cursor: Position) {
        if self.pending.is_some() {
            self.commit(cursor);
        }
        self.pending = Some(Transaction {
            edits: Vec::new(),
            cursor_before: cursor,
            cursor_after: cursor,
            committed_at: SystemTime::now(),
        });
    }

    /// True if a transaction is currently open.
    #[must_use]
    pub const fn in_transaction(&self) -> bool {
        self.pending.is_some()
    }

    /// True if the open transaction has recorded edits.
    #[must_use]
    pub fn pending_has_edits(&self) -> bool {
        self.pending.as_ref().is_some_and(|t| !t.edits.is_empty())
    }

    /// Record that text was inserted at `pos`. Call after performing the
    /// insert on the buffer. Does nothing if no transaction is pending.
    pub fn record_insert(&mut self, pos: Position, text: &str) {
        if let Some(txn) = &mut self.pending {
            txn.edits.push(Edit::Insert {
                pos,
                text: text.to_string(),
            });
        }
    }

    /// Record that text was deleted starting at `pos`. `text` is the content
    /// that was removed — capture it from the buffer before deletion.
    /// Does nothing if no transaction is pending.
    pub fn record_delete(&mut self, pos: Position, text: &str) {
        if let Some(txn) = &mut self.pending {
            txn.edits.push(Edit::Delete {
                pos,
                text: text.to_string(),
            });
        }
    }

    /// Finalize the current transaction. `cursor` is the cursor position
    /// after all edits in this transaction.
    ///
    /// Empty transactions are silently discarded. New transactions clear the
    /// redo stack.
    pub fn commit(&mut self, cursor: Position) {
        if let Some(mut txn) = self.pending.take() {
            if txn.edits.is_empty() {
                return;
            }
            txn.cursor_after = cursor;
            txn.committed_at = SystemTime::now();
            self.redo_stack.clear();
            self.undo_stack.push(txn);
        }
    }

    /// Undo the last transaction. Returns the cursor position to restore, or
    /// `None` if there's nothing to undo.
    pub fn undo(&mut self, buf: &mut Buffer) -> Option<Position> {
        // Auto-commit any pending transaction so it can be undone.
        if let Some(txn) = self.pending.take() {
            if !txn.edits.is_empty() {
                self.redo_stack.clear();
                self.undo_stack.push(txn);
            }
        }

        let txn = self.undo_stack.pop()?;
        txn.undo(buf);
        let cursor = txn.cursor_before;
        self.redo_stack.push(txn);
        Some(cursor)
    }

    /// Redo the last undone transaction. Returns the cursor position to
    /// restore, or `None` if there's nothing to redo.
    pub fn redo(&mut self, buf: &mut Buffer) -> Option<Position> {
        let txn = self.redo_stack.pop()?;
        txn.redo(buf);
        let cursor = txn.cursor_after;
        self.undo_stack.push(txn);
        Some(cursor)
    }

    /// Move `count` states earlier in time. Returns the cursor position of
    /// the state reached, or `None` if the history is already at the oldest
    /// state.
    pub fn earlier(&mut self, buf: &mut Buffer, count: usize) -> Option<Position> {
        let mut result = None;
        for _ in 0..count.max(1) {
            match self.undo(buf) {
                Some(pos) => result = Some(pos),
                None => break,
            }
        }
        result
    }

    /// Move `count` states later in time. Returns the cursor position of the
    /// state reached, or `None` if the history is already at the newest
    /// state.
    pub fn later(&mut self, buf: &mut Buffer, count: usize) -> Option<Position> {
        let mut result = None;
        for _ in 0..count.max(1) {
            match self.redo(buf) {
                Some(pos) => result = Some(pos),
                None => break,
            }
        }
        result
    }

    /// The commit time of the state that `undo` would revert, if any.
    #[must_use]
    pub fn last_commit_time(&self) -> Option<SystemTime> {
        self.undo_stack.last().map(|t| t.committed_at)
    }

    /// True if there are transactions that can be undone.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
            || self.pending.as_ref().is_some_and(|t| !t.edits.is_empty())
    }

    /// True if there are transactions that can be redone.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of transactions on the undo stack.
    #[must_use]
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of transactions on the redo stack.
    #[must_use]
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Compute the position at the end of `text` if inserted at `start`.
///
/// Tracks newlines to determine the final line and column. Handles `\n`,
/// `\r\n`, and `\r` line endings.
pub(crate) fn end_after_insert(start: Position, text: &str) -> Position {
    let mut line = start.line;
    let mut col = start.col;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\n' => {
                line += 1;
                col = 0;
            }
            '\r' => {
                line += 1;
                col = 0;
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            _ => {
                col += 1;
            }
        }
    }

    Position::new(line, col)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
