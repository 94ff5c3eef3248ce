//! Text buffer — the text model the editing core drives.
//!
//! A `Buffer` wraps a [`ropey::Rope`] with coordinate conversion between
//! `Position` (line, col) and rope char indices, editing operations, the
//! navigation primitives the motion library consumes, and file metadata.
//!
//! # Design choices
//!
//! - **ropey** provides O(log n) insert/delete at any position, efficient
//!   line indexing, and battle-tested Unicode handling. We build a clean API
//!   on top rather than reimplementing text data structures.
//!
//! - **Columns are char offsets**, not byte offsets. Column 3 of `"café"` is
//!   `'é'`, not a byte in the middle of its UTF-8 encoding. Byte offsets
//!   never leak into the public API, so an edit can never split a code point.
//!
//! - **Line endings are detected on load** and preserved on save. The
//!   `line_ending` field records the dominant style for use when saving or
//!   inserting new lines.
//!
//! - **No undo/redo here.** Edit history is a separate concern ([`crate::history`])
//!   that wraps buffer operations with transaction tracking.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ropey::{Rope, RopeSlice};

use crate::position::{Position, Range};

// ---------------------------------------------------------------------------
// Line ending detection
// ---------------------------------------------------------------------------

/// Line ending style of a file.
///
/// Detected on load by scanning for the first occurrence. Defaults to `Lf`
/// for new buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineEnding {
    /// `\n` — Unix.
    Lf,
    /// `\r\n` — Windows, DOS.
    CrLf,
    /// `\r` — Classic Mac. Rare but handled.
    Cr,
}

impl LineEnding {
    /// The string representation of this line ending.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
            Self::Cr => "\r",
        }
    }

    /// Detect the dominant line ending in a string by finding the first
    /// occurrence. Returns `Lf` if no line endings are found.
    #[must_use]
    pub fn detect(text: &str) -> Self {
        for (i, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                if i > 0 && text.as_bytes()[i - 1] == b'\r' {
                    return Self::CrLf;
                }
                return Self::Lf;
            }
            if byte == b'\r' {
                if text.as_bytes().get(i + 1) == Some(&b'\n') {
                    return Self::CrLf;
                }
                return Self::Cr;
            }
        }
        Self::Lf
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lf => f.write_str("LF"),
            Self::CrLf => f.write_str("CRLF"),
            Self::Cr => f.write_str("CR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Buffer
// ---------------------------------------------------------------------------

/// A text buffer backed by a rope.
///
/// Tracks the text content, the file path (if backed by a file), whether the
/// content has been modified since the last save, and the line ending style.
///
/// # Coordinate system
///
/// All positions are 0-indexed `(line, col)` pairs counting chars. Use
/// [`pos_to_char_idx`](Self::pos_to_char_idx) and
/// [`char_idx_to_pos`](Self::char_idx_to_pos) for conversion to rope-native
/// char indices.
pub struct Buffer {
    rope: Rope,
    path: Option<PathBuf>,
    modified: bool,
    line_ending: LineEnding,
}

impl Buffer {
    // -- Construction -------------------------------------------------------

    /// Create an empty buffer with no file path.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rope: Rope::new(),
            path: None,
            modified: false,
            line_ending: LineEnding::Lf,
        }
    }

    /// Create a buffer from a string.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self {
            line_ending: LineEnding::detect(text),
            rope: Rope::from_str(text),
            path: None,
            modified: false,
        }
    }

    /// Load a buffer from a file. Detects line endings from the content.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid UTF-8.
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        let line_ending = LineEnding::detect(&text);
        Ok(Self {
            rope: Rope::from_str(&text),
            path: Some(path.to_path_buf()),
            modified: false,
            line_ending,
        })
    }

    // -- Text access --------------------------------------------------------

    /// The underlying rope. Prefer the typed accessors below; this is
    /// available when you need direct rope operations.
    #[inline]
    #[must_use]
    pub const fn rope(&self) -> &Rope {
        &self.rope
    }

    /// Total number of lines. An empty buffer has 1 line (the empty line); a
    /// buffer ending with `\n` has a trailing empty line.
    #[inline]
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Total character count (Unicode scalar values, not bytes).
    #[inline]
    #[must_use]
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Total byte count.
    #[inline]
    #[must_use]
    pub fn len_bytes(&self) -> usize {
        self.rope.len_bytes()
    }

    /// True when the buffer contains no text.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Get a line by 0-indexed line number, including its trailing line
    /// ending. Returns `None` if `line >= line_count()`.
    #[inline]
    #[must_use]
    pub fn line(&self, line: usize) -> Option<RopeSlice<'_>> {
        if line < self.rope.len_lines() {
            Some(self.rope.line(line))
        } else {
            None
        }
    }

    /// Number of chars in a line **including** the trailing line ending.
    #[inline]
    #[must_use]
    pub fn line_len(&self, line: usize) -> Option<usize> {
        self.line(line).map(|l| l.len_chars())
    }

    /// Number of chars in a line **excluding** any trailing line ending.
    /// This is the content length — the range of valid normal-mode cursor
    /// columns is `0..content_len`, insert mode also allows `content_len`.
    ///
    /// Returns `None` if the line doesn't exist.
    #[must_use]
    pub fn line_content_len(&self, line: usize) -> Option<usize> {
        self.line(line).map(|rope_line| {
            let total = rope_line.len_chars();
            if total == 0 {
                return 0;
            }
            let last = rope_line.char(total - 1);
            if last == '\n' {
                if total >= 2 && rope_line.char(total - 2) == '\r' {
                    total - 2
                } else {
                    total - 1
                }
            } else if last == '\r' {
                total - 1
            } else {
                total
            }
        })
    }

    /// Get the character at a position. Returns `None` out of bounds or at
    /// the end-of-buffer position.
    #[must_use]
    pub fn char_at(&self, pos: Position) -> Option<char> {
        let idx = self.pos_to_char_idx(pos)?;
        if idx < self.rope.len_chars() {
            Some(self.rope.char(idx))
        } else {
            None
        }
    }

    /// Get a slice of text for the given range. Returns `None` if either
    /// endpoint is out of bounds.
    #[must_use]
    pub fn slice(&self, range: Range) -> Option<RopeSlice<'_>> {
        let start = self.pos_to_char_idx(range.start)?;
        let end = self.pos_to_char_idx(range.end)?;
        Some(self.rope.slice(start..end))
    }

    /// Collect the text of a range into a `String`. Out-of-bounds endpoints
    /// yield an empty string.
    #[must_use]
    pub fn slice_string(&self, range: Range) -> String {
        self.slice(range).map(|s| s.to_string()).unwrap_or_default()
    }

    /// Collect all text into a `String`. Allocates — prefer `rope()` or
    /// `slice()` for zero-copy access when possible.
    #[must_use]
    pub fn contents(&self) -> String {
        self.rope.to_string()
    }

    // -- Coordinate conversion ----------------------------------------------

    /// Convert a `Position` (line, col) to an absolute char index.
    ///
    /// Returns `None` if the line is out of bounds or the column exceeds the
    /// line's total char count (including line ending). A column exactly
    /// equal to the line's char count is valid — the position just past the
    /// last character.
    #[must_use]
    pub fn pos_to_char_idx(&self, pos: Position) -> Option<usize> {
        if pos.line >= self.rope.len_lines() {
            return None;
        }
        let line_start = self.rope.line_to_char(pos.line);
        let line_len = self.rope.line(pos.line).len_chars();
        if pos.col > line_len {
            return None;
        }
        Some(line_start + pos.col)
    }

    /// Convert an absolute char index to a `Position` (line, col).
    ///
    /// Returns `None` if `char_idx > len_chars()`. An index equal to
    /// `len_chars()` returns the position just past the last character.
    #[must_use]
    pub fn char_idx_to_pos(&self, char_idx: usize) -> Option<Position> {
        if char_idx > self.rope.len_chars() {
            return None;
        }
        let line = self.rope.char_to_line(char_idx);
        let line_start = self.rope.line_to_char(line);
        Some(Position::new(line, char_idx - line_start))
    }

    /// Clamp a position to the nearest valid content position: line clamped
    /// to the last line, column clamped to the line's content length.
    #[must_use]
    pub fn clamp_position(&self, pos: Position) -> Position {
        if self.is_empty() {
            return Position::ZERO;
        }
        let line = pos.line.min(self.line_count() - 1);
        let max_col = self.line_content_len(line).unwrap_or(0);
        Position::new(line, pos.col.min(max_col))
    }

    // -- Navigation primitives ----------------------------------------------
    //
    // These are the text-model primitives the motion library is built on.
    // They operate in text order (char_prev/char_next cross line boundaries)
    // and are total: out-of-range inputs clamp.

    /// The position just past the last character of the buffer.
    #[must_use]
    pub fn end_position(&self) -> Position {
        self.char_idx_to_pos(self.rope.len_chars())
            .unwrap_or(Position::ZERO)
    }

    /// The last line index (0 for an empty buffer).
    #[inline]
    #[must_use]
    pub fn last_line(&self) -> usize {
        self.line_count().saturating_sub(1)
    }

    /// The previous character position in text order, crossing line
    /// boundaries. At the start of the buffer, returns the input unchanged.
    #[must_use]
    pub fn char_prev(&self, pos: Position) -> Position {
        let Some(idx) = self.pos_to_char_idx(pos) else {
            return self.clamp_position(pos);
        };
        if idx == 0 {
            return pos;
        }
        let mut prev = idx - 1;
        // Step over the \n of \r\n as one boundary.
        if prev > 0 && self.rope.char(prev) == '\n' && self.rope.char(prev - 1) == '\r' {
            prev -= 1;
        }
        self.char_idx_to_pos(prev).unwrap_or(pos)
    }

    /// The next character position in text order, crossing line boundaries.
    /// At the end of the buffer, returns the input unchanged.
    #[must_use]
    pub fn char_next(&self, pos: Position) -> Position {
        let total = self.rope.len_chars();
        let Some(idx) = self.pos_to_char_idx(pos) else {
            return self.clamp_position(pos);
        };
        if idx >= total {
            return pos;
        }
        let mut next = idx + 1;
        if self.rope.char(idx) == '\r' && next < total && self.rope.char(next) == '\n' {
            next += 1;
        }
        self.char_idx_to_pos(next).unwrap_or(pos)
    }

    /// First column of the line containing `pos`.
    #[inline]
    #[must_use]
    pub fn line_begin(&self, pos: Position) -> Position {
        Position::new(pos.line.min(self.last_line()), 0)
    }

    /// First non-blank character of the line containing `pos` (or column 0
    /// on a blank line).
    #[must_use]
    pub fn line_start(&self, pos: Position) -> Position {
        let line = pos.line.min(self.last_line());
        let col = self.line(line).map_or(0, |l| {
            l.chars()
                .take_while(|ch| ch.is_whitespace() && *ch != '\n' && *ch != '\r')
                .count()
        });
        let max = self.line_content_len(line).unwrap_or(0).saturating_sub(1);
        Position::new(line, col.min(max))
    }

    /// Last non-blank character of the line containing `pos` (or column 0 on
    /// a blank line).
    #[must_use]
    pub fn line_finish(&self, pos: Position) -> Position {
        let line = pos.line.min(self.last_line());
        let content = self.line_content_len(line).unwrap_or(0);
        if content == 0 {
            return Position::new(line, 0);
        }
        let slice = self.line(line).expect("line exists");
        let mut col = content;
        while col > 0 {
            if !slice.char(col - 1).is_whitespace() {
                break;
            }
            col -= 1;
        }
        Position::new(line, col.saturating_sub(1))
    }

    /// The position just past the last content character of the line
    /// containing `pos` (exclusive end of the line's content).
    #[must_use]
    pub fn line_end(&self, pos: Position) -> Position {
        let line = pos.line.min(self.last_line());
        Position::new(line, self.line_content_len(line).unwrap_or(0))
    }

    /// Expand a range to whole lines: start moves to column 0, end moves to
    /// the start of the line after `end.line` (or to the end of the buffer
    /// when there is no such line).
    #[must_use]
    pub fn range_linewise(&self, range: Range) -> Range {
        let start = Position::new(range.start.line, 0);
        // An exclusive end at column 0 already sits at a line boundary; the
        // covered lines stop at the previous line.
        let end_line = if range.end.col == 0 && range.end.line > range.start.line {
            range.end.line - 1
        } else {
            range.end.line
        };
        let end = if end_line + 1 < self.line_count() {
            Position::new(end_line + 1, 0)
        } else {
            self.end_position()
        };
        Range::new(start, end.max(start))
    }

    // -- Editing ------------------------------------------------------------

    /// Insert text at a position.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is not a valid position in the buffer.
    pub fn insert(&mut self, pos: Position, text: &str) {
        let idx = self
            .pos_to_char_idx(pos)
            .expect("insert position out of bounds");
        self.rope.insert(idx, text);
        self.modified = true;
    }

    /// Insert a single character at a position.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is not a valid position in the buffer.
    pub fn insert_char(&mut self, pos: Position, ch: char) {
        let idx = self
            .pos_to_char_idx(pos)
            .expect("insert_char position out of bounds");
        self.rope.insert_char(idx, ch);
        self.modified = true;
    }

    /// Delete the text in a range. Empty ranges are a no-op.
    ///
    /// # Panics
    ///
    /// Panics if either endpoint is not a valid position.
    pub fn delete(&mut self, range: Range) {
        if range.is_empty() {
            return;
        }
        let start = self
            .pos_to_char_idx(range.start)
            .expect("delete range start out of bounds");
        let end = self
            .pos_to_char_idx(range.end)
            .expect("delete range end out of bounds");
        self.rope.remove(start..end);
        self.modified = true;
    }

    /// Replace the text in a range with new text, as one logical operation.
    ///
    /// # Panics
    ///
    /// Panics if either endpoint is not a valid position.
    pub fn replace(&mut self, range: Range, text: &str) {
        let start = self
            .pos_to_char_idx(range.start)
            .expect("replace range start out of bounds");
        let end = self
            .pos_to_char_idx(range.end)
            .expect("replace range end out of bounds");
        self.rope.remove(start..end);
        self.rope.insert(start, text);
        self.modified = true;
    }

    // -- Metadata -----------------------------------------------------------

    /// The file path this buffer is associated with, if any.
    #[inline]
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Set the file path for this buffer.
    #[inline]
    pub fn set_path(&mut self, path: PathBuf) {
        self.path = Some(path);
    }

    /// True if the buffer has been modified since the last save.
    #[inline]
    #[must_use]
    pub const fn is_modified(&self) -> bool {
        self.modified
    }

    /// Mark the buffer as saved. Called after a successful write to disk.
    #[inline]
    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    /// The detected (or configured) line ending style.
    #[inline]
    #[must_use]
    pub const fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    // -- File I/O -----------------------------------------------------------

    /// Save the buffer to its associated file path.
    ///
    /// # Errors
    ///
    /// Returns an error if no path is set or the write fails.
    pub fn save(&mut self) -> io::Result<()> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no file name"))?;
        self.write_to(&path)?;
        self.modified = false;
        Ok(())
    }

    /// Save the buffer to a specific path, adopting it as the buffer's path.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn save_as(&mut self, path: &Path) -> io::Result<()> {
        self.write_to(path)?;
        self.path = Some(path.to_path_buf());
        self.modified = false;
        Ok(())
    }

    fn write_to(&self, path: &Path) -> io::Result<()> {
        let mut out = io::BufWriter::new(fs::File::create(path)?);
        for chunk in self.rope.chunks() {
            io::Write::write_all(&mut out, chunk.as_bytes())?;
        }
        io::Write::flush(&mut out)
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("lines", &self.line_count())
            .field("chars", &self.len_chars())
            .field("path", &self.path)
            .field("modified", &self.modified)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
