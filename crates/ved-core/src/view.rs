//! The view — an ordered set of cursors over a buffer, plus scroll state.
//!
//! A view always holds at least one cursor; one of them is the *primary*.
//! The set keeps two invariants after every bulk operation:
//!
//! - cursors are ordered by position, and
//! - no two cursors overlap — cursors on the same position, or whose
//!   selections touch, merge into one (the primary survives a merge).
//!
//! The multi-cursor operations of the editor live here: aligning cursors on
//! a column, selecting the word under every cursor, and growing the set by
//! searching for the next literal occurrence of the primary selection.
//!
//! The view also tracks the scroll anchor (`top_line`, `left_col`) and the
//! dimensions the UI last reported, which the scroll/slide/redraw-at
//! operations manipulate.

use crate::buffer::Buffer;
use crate::cursor::Cursor;
use crate::position::{Position, Range};

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

/// A window onto the text: cursors, primary, scroll anchor, dimensions.
#[derive(Debug)]
pub struct View {
    cursors: Vec<Cursor>,
    primary: usize,

    /// First visible buffer line.
    top_line: usize,
    /// Horizontal scroll offset in columns.
    left_col: usize,
    /// Text area width, supplied by the UI.
    width: u16,
    /// Text area height, supplied by the UI.
    height: u16,
}

impl View {
    /// Create a view with a single cursor at the origin.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cursors: vec![Cursor::new()],
            primary: 0,
            top_line: 0,
            left_col: 0,
            width: 80,
            height: 24,
        }
    }

    // -- Accessors ----------------------------------------------------------

    /// All cursors, ordered by position.
    #[must_use]
    pub fn cursors(&self) -> &[Cursor] {
        &self.cursors
    }

    /// Mutable access to the cursors. Callers must re-establish the
    /// invariants with [`View::normalize`] after edits.
    pub(crate) fn cursors_mut(&mut self) -> &mut Vec<Cursor> {
        &mut self.cursors
    }

    /// Number of cursors (always at least 1).
    #[must_use]
    pub fn cursor_count(&self) -> usize {
        self.cursors.len()
    }

    /// The primary cursor.
    #[must_use]
    pub fn primary(&self) -> &Cursor {
        &self.cursors[self.primary]
    }

    /// The primary cursor, mutably.
    pub fn primary_mut(&mut self) -> &mut Cursor {
        &mut self.cursors[self.primary]
    }

    /// Index of the primary cursor.
    #[must_use]
    pub const fn primary_index(&self) -> usize {
        self.primary
    }

    pub(crate) fn set_primary(&mut self, index: usize) {
        debug_assert!(index < self.cursors.len());
        self.primary = index;
    }

    /// Replace the whole cursor set. The list must be non-empty; callers
    /// run [`View::normalize`] afterwards.
    pub(crate) fn set_cursors(&mut self, cursors: Vec<Cursor>, primary: usize) {
        debug_assert!(!cursors.is_empty());
        debug_assert!(primary < cursors.len());
        self.cursors = cursors;
        self.primary = primary;
    }

    /// First visible line.
    #[inline]
    #[must_use]
    pub const fn top_line(&self) -> usize {
        self.top_line
    }

    /// Horizontal scroll offset.
    #[inline]
    #[must_use]
    pub const fn left_col(&self) -> usize {
        self.left_col
    }

    /// Text area width.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Text area height.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Record the dimensions the UI is drawing with.
    pub fn set_dimensions(&mut self, width: u16, height: u16) {
        self.width = width.max(1);
        self.height = height.max(1);
    }

    // -- Cursor set operations ----------------------------------------------

    /// Create a cursor at the primary's position. Returns `None` when a
    /// cursor already sits there (which is always, for the primary itself) —
    /// use [`View::cursor_new_at`] with a distinct position.
    pub fn cursor_new(&mut self) -> Option<usize> {
        self.cursor_new_at(self.primary().position())
    }

    /// Create a cursor at a position, keeping order. Returns the new index,
    /// or `None` if a cursor already sits on that position.
    pub fn cursor_new_at(&mut self, pos: Position) -> Option<usize> {
        if self.cursors.iter().any(|c| c.position() == pos) {
            return None;
        }
        let idx = self
            .cursors
            .partition_point(|c| c.position() < pos);
        self.cursors.insert(idx, Cursor::at(pos));
        if idx <= self.primary {
            // The primary shifted right by the insertion.
            self.primary += 1;
        }
        Some(idx)
    }

    /// Remove a cursor. The last cursor is never removed. Removing the
    /// primary promotes the next cursor (wrapping to the first).
    pub fn cursor_dispose(&mut self, index: usize) {
        if self.cursors.len() <= 1 || index >= self.cursors.len() {
            return;
        }
        self.cursors.remove(index);
        if self.primary > index {
            self.primary -= 1;
        } else if self.primary == index && self.primary >= self.cursors.len() {
            self.primary = 0;
        }
    }

    /// `<Esc>`-style collapse: with several cursors, drop all but the
    /// primary; with one, clear its selection (saving it).
    pub fn cursors_clear(&mut self) {
        if self.cursors.len() > 1 {
            let primary = self.cursors[self.primary].clone();
            self.cursors = vec![primary];
            self.primary = 0;
        } else {
            self.cursors[0].selection_clear();
        }
    }

    /// Move every cursor to the leftmost column any of them is on,
    /// clamping on short lines. Pure navigation — no text changes.
    pub fn cursors_align(&mut self, buf: &Buffer) {
        let min_col = self
            .cursors
            .iter()
            .map(Cursor::col)
            .min()
            .unwrap_or(0);
        for cursor in &mut self.cursors {
            let line = cursor.line();
            cursor.set_position(Position::new(line, min_col), buf, false);
        }
        self.normalize(buf, false);
    }

    /// For every cursor without a selection that sits on a word, select that
    /// word. Returns `true` when at least one cursor now has a selection.
    pub fn cursors_select_word(&mut self, buf: &Buffer) -> bool {
        for cursor in &mut self.cursors {
            if cursor.has_selection() {
                continue;
            }
            if let Some(range) =
                crate::textobject::range(crate::textobject::TextObjectKind::WordInner, buf, cursor.position())
            {
                if buf.char_at(range.start).is_some_and(|ch| ch.is_alphanumeric() || ch == '_') {
                    cursor.selection_set(range, buf);
                }
            }
        }
        self.cursors.iter().any(Cursor::has_selection)
    }

    /// Search forward past the primary selection for the next literal
    /// occurrence of its text; put a new cursor (which becomes primary)
    /// with that selection. The search is case-sensitive and does not wrap.
    /// No-op without a selection or a match.
    pub fn cursors_select_next(&mut self, buf: &Buffer) -> bool {
        let Some(sel) = self.primary().selection(buf) else {
            return false;
        };
        let text = buf.slice_string(sel);
        if text.is_empty() {
            return false;
        }
        let Some(from) = buf.pos_to_char_idx(sel.end) else {
            return false;
        };
        let Some((start, end)) = find_literal(buf, &text, from) else {
            return false;
        };

        let range = Range::new(
            buf.char_idx_to_pos(start).unwrap_or(Position::ZERO),
            buf.char_idx_to_pos(end).unwrap_or(Position::ZERO),
        );
        let Some(idx) = self.cursor_new_at(range.start) else {
            return false;
        };
        self.cursors[idx].selection_set(range, buf);
        self.primary = idx;
        true
    }

    /// [`View::cursors_select_next`], then dispose the cursor that was
    /// primary before.
    pub fn cursors_select_skip(&mut self, buf: &Buffer) -> bool {
        let old = self.primary;
        if !self.cursors_select_next(buf) {
            return false;
        }
        self.cursor_dispose(old);
        true
    }

    // -- Invariant maintenance ----------------------------------------------

    /// Re-establish order and the non-overlap invariant: clamp, sort, merge.
    /// The primary survives merging.
    pub fn normalize(&mut self, buf: &Buffer, past_end: bool) {
        for cursor in &mut self.cursors {
            cursor.clamp(buf, past_end);
        }

        let primary = self.primary;
        let mut indexed: Vec<(usize, Cursor)> = self.cursors.drain(..).enumerate().collect();
        indexed.sort_by(|(ai, a), (bi, b)| {
            a.position().cmp(&b.position()).then(ai.cmp(bi))
        });

        let mut out: Vec<Cursor> = Vec::with_capacity(indexed.len());
        let mut new_primary = 0;
        for (orig, cursor) in indexed {
            if let Some(last) = out.last_mut() {
                if cursors_touch(last, &cursor, buf) {
                    merge_into(last, &cursor, buf);
                    if orig == primary {
                        new_primary = out.len() - 1;
                    }
                    continue;
                }
            }
            if orig == primary {
                new_primary = out.len();
            }
            out.push(cursor);
        }

        self.cursors = out;
        self.primary = new_primary;
    }

    // -- Scrolling ----------------------------------------------------------

    /// Adjust the scroll anchor so the primary cursor is visible.
    pub fn ensure_visible(&mut self, buf: &Buffer) {
        let h = self.height as usize;
        let w = self.width as usize;
        let line = self.primary().line();
        let col = self.primary().col();

        if line < self.top_line {
            self.top_line = line;
        }
        if h > 0 && line >= self.top_line + h {
            self.top_line = line - h + 1;
        }
        if col < self.left_col {
            self.left_col = col;
        }
        if w > 0 && col >= self.left_col + w {
            self.left_col = col - w + 1;
        }
        let _ = buf;
    }

    /// Scroll content and cursor together by `n` lines.
    pub fn scroll_down(&mut self, buf: &Buffer, n: usize) {
        let last = buf.last_line();
        self.top_line = (self.top_line + n).min(last);
        let pos = self.primary().position();
        let target = Position::new((pos.line + n).min(last), pos.col);
        self.primary_mut().set_position_vertical(target, buf, false);
        self.ensure_visible(buf);
    }

    /// Scroll content and cursor together by `n` lines, upward.
    pub fn scroll_up(&mut self, buf: &Buffer, n: usize) {
        self.top_line = self.top_line.saturating_sub(n);
        let pos = self.primary().position();
        let target = Position::new(pos.line.saturating_sub(n), pos.col);
        self.primary_mut().set_position_vertical(target, buf, false);
        self.ensure_visible(buf);
    }

    /// Slide the window content without moving the cursor, except to keep it
    /// inside the window.
    pub fn slide_down(&mut self, buf: &Buffer, n: usize) {
        self.top_line = (self.top_line + n).min(buf.last_line());
        self.keep_cursor_in_window(buf);
    }

    /// Slide the window content upward.
    pub fn slide_up(&mut self, buf: &Buffer, n: usize) {
        self.top_line = self.top_line.saturating_sub(n);
        self.keep_cursor_in_window(buf);
    }

    fn keep_cursor_in_window(&mut self, buf: &Buffer) {
        let h = (self.height as usize).max(1);
        let line = self.primary().line();
        let clamped = line.clamp(self.top_line, self.top_line + h - 1);
        if clamped != line {
            let col = self.primary().col();
            self.primary_mut()
                .set_position_vertical(Position::new(clamped, col), buf, false);
        }
    }

    /// Redraw with the cursor line at the top of the window.
    pub fn redraw_top(&mut self) {
        self.top_line = self.primary().line();
    }

    /// Redraw with the cursor line centered.
    pub fn redraw_center(&mut self) {
        let half = (self.height as usize) / 2;
        self.top_line = self.primary().line().saturating_sub(half);
    }

    /// Redraw with the cursor line at the bottom of the window.
    pub fn redraw_bottom(&mut self) {
        let h = (self.height as usize).max(1);
        self.top_line = self.primary().line().saturating_sub(h - 1);
    }
}

impl Default for View {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// True when two cursors (in position order) must merge: same position, or
/// touching/overlapping selections, or one's selection covers the other.
fn cursors_touch(a: &Cursor, b: &Cursor, buf: &Buffer) -> bool {
    if a.position() == b.position() {
        return true;
    }
    match (a.selection(buf), b.selection(buf)) {
        (Some(ra), Some(rb)) => ra.touches(rb),
        (Some(ra), None) => ra.contains(b.position()),
        (None, Some(rb)) => rb.contains(a.position()),
        (None, None) => false,
    }
}

/// Merge `b` into `a`: selections union, position from the union's head end.
fn merge_into(a: &mut Cursor, b: &Cursor, buf: &Buffer) {
    match (a.selection(buf), b.selection(buf)) {
        (Some(ra), Some(rb)) => a.selection_set(ra.union(rb), buf),
        (None, Some(rb)) => a.selection_set(rb, buf),
        _ => {}
    }
}

/// Find the next literal occurrence of `text` at or after char index `from`.
/// Returns `(start, end)` char indices. Case-sensitive, no wrapping.
fn find_literal(buf: &Buffer, text: &str, from: usize) -> Option<(usize, usize)> {
    let rope = buf.rope();
    let total = rope.len_chars();
    let needle: Vec<char> = text.chars().collect();
    if needle.is_empty() || from >= total {
        return None;
    }

    let mut start = from;
    while start + needle.len() <= total {
        let mut matched = true;
        for (i, &ch) in needle.iter().enumerate() {
            if rope.char(start + i) != ch {
                matched = false;
                break;
            }
        }
        if matched {
            return Some((start, start + needle.len()));
        }
        start += 1;
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
