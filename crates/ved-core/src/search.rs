//! Literal pattern search.
//!
//! Forward (`/`) and backward (`?`) search over a text buffer. Patterns are
//! literal strings matched within single lines — the regex engine is an
//! external collaborator; the core owns the last-pattern slot and the
//! `n`/`N`/`*`/`#` stepping semantics built on these functions.
//!
//! Searches wrap around the buffer ends.

use crate::buffer::Buffer;
use crate::position::Position;
use crate::word::{classify, CharClass};

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Search direction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// The opposite direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }

    /// The prompt leader character (`/` forward, `?` backward).
    #[must_use]
    pub const fn leader(self) -> char {
        match self {
            Self::Forward => '/',
            Self::Backward => '?',
        }
    }
}

// ---------------------------------------------------------------------------
// Match
// ---------------------------------------------------------------------------

/// A search match: start position and length in characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Match {
    /// Start position of the match.
    pub start: Position,
    /// Length of the match in characters.
    pub len: usize,
}

// ---------------------------------------------------------------------------
// Search functions
// ---------------------------------------------------------------------------

/// All matches of `pattern` on a line, as (char column, char length) pairs.
fn line_matches(buf: &Buffer, pattern: &str, line: usize) -> Vec<(usize, usize)> {
    let Some(slice) = buf.line(line) else {
        return Vec::new();
    };
    let content_len = buf.line_content_len(line).unwrap_or(0);
    let text: String = slice.chars().take(content_len).collect();
    let pat_chars = pattern.chars().count();

    text.match_indices(pattern)
        .map(|(byte_idx, _)| (text[..byte_idx].chars().count(), pat_chars))
        .collect()
}

/// Find the next match of `pattern` searching forward from `from`,
/// inclusive of `from` itself. Wraps around the end of the buffer.
#[must_use]
pub fn find_forward(buf: &Buffer, pattern: &str, from: Position) -> Option<Match> {
    if pattern.is_empty() || buf.is_empty() {
        return None;
    }
    let line_count = buf.line_count();

    for offset in 0..=line_count {
        let line = (from.line + offset) % line_count;
        let min_col = if offset == 0 { from.col } else { 0 };
        // On the wrapped-around revisit of the start line, take any match.
        let min_col = if offset == line_count { 0 } else { min_col };

        if let Some(&(col, len)) = line_matches(buf, pattern, line)
            .iter()
            .find(|&&(col, _)| col >= min_col)
        {
            return Some(Match { start: Position::new(line, col), len });
        }
    }
    None
}

/// Find the next match of `pattern` searching backward from `from`,
/// inclusive of `from` itself. Wraps around the start of the buffer.
#[must_use]
pub fn find_backward(buf: &Buffer, pattern: &str, from: Position) -> Option<Match> {
    if pattern.is_empty() || buf.is_empty() {
        return None;
    }
    let line_count = buf.line_count();

    for offset in 0..=line_count {
        let line = (from.line + line_count - (offset % line_count)) % line_count;
        let max_col = if offset == 0 { from.col } else { usize::MAX };
        let max_col = if offset == line_count { usize::MAX } else { max_col };

        if let Some(&(col, len)) = line_matches(buf, pattern, line)
            .iter()
            .rev()
            .find(|&&(col, _)| col <= max_col)
        {
            return Some(Match { start: Position::new(line, col), len });
        }
    }
    None
}

/// Find the next match in the given direction.
#[must_use]
pub fn find(buf: &Buffer, pattern: &str, from: Position, dir: Direction) -> Option<Match> {
    match dir {
        Direction::Forward => find_forward(buf, pattern, from),
        Direction::Backward => find_backward(buf, pattern, from),
    }
}

/// The word under (or touching) the cursor, for `*`/`#` and the word-select
/// cursor operations. Returns the run of word characters covering `pos`.
#[must_use]
pub fn word_at(buf: &Buffer, pos: Position) -> Option<String> {
    let rope = buf.rope();
    let total = rope.len_chars();
    let idx = buf.pos_to_char_idx(pos)?;
    if idx >= total || classify(rope.char(idx)) != CharClass::Word {
        return None;
    }

    let mut start = idx;
    while start > 0 && classify(rope.char(start - 1)) == CharClass::Word {
        start -= 1;
    }
    let mut end = idx + 1;
    while end < total && classify(rope.char(end)) == CharClass::Word {
        end += 1;
    }
    Some(rope.slice(start..end).to_string())
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

    // -- find_forward -------------------------------------------------------

    #[test]
    fn forward_same_line() {
        let buf = Buffer::from_text("foo bar foo");
        let m = find_forward(&buf, "foo", p(0, 1)).unwrap();
        assert_eq!(m.start, p(0, 8));
        assert_eq!(m.len, 3);
    }

    #[test]
    fn forward_inclusive_of_from() {
        let buf = Buffer::from_text("foo bar");
        let m = find_forward(&buf, "foo", p(0, 0)).unwrap();
        assert_eq!(m.start, p(0, 0));
    }

    #[test]
    fn forward_next_line() {
        let buf = Buffer::from_text("aaa\nbbb foo");
        let m = find_forward(&buf, "foo", p(0, 0)).unwrap();
        assert_eq!(m.start, p(1, 4));
    }

    #[test]
    fn forward_wraps() {
        let buf = Buffer::from_text("foo\nbar");
        let m = find_forward(&buf, "foo", p(1, 0)).unwrap();
        assert_eq!(m.start, p(0, 0));
    }

    #[test]
    fn forward_wraps_within_start_line() {
        let buf = Buffer::from_text("foo bar");
        let m = find_forward(&buf, "foo", p(0, 2)).unwrap();
        assert_eq!(m.start, p(0, 0));
    }

    #[test]
    fn forward_no_match() {
        let buf = Buffer::from_text("hello");
        assert_eq!(find_forward(&buf, "xyz", p(0, 0)), None);
    }

    #[test]
    fn forward_empty_pattern() {
        let buf = Buffer::from_text("hello");
        assert_eq!(find_forward(&buf, "", p(0, 0)), None);
    }

    #[test]
    fn forward_unicode_columns() {
        let buf = Buffer::from_text("café foo");
        let m = find_forward(&buf, "foo", p(0, 0)).unwrap();
        assert_eq!(m.start, p(0, 5));
    }

    // -- find_backward ------------------------------------------------------

    #[test]
    fn backward_same_line() {
        let buf = Buffer::from_text("foo bar foo");
        let m = find_backward(&buf, "foo", p(0, 7)).unwrap();
        assert_eq!(m.start, p(0, 0));
    }

    #[test]
    fn backward_inclusive_of_from() {
        let buf = Buffer::from_text("foo bar foo");
        let m = find_backward(&buf, "foo", p(0, 8)).unwrap();
        assert_eq!(m.start, p(0, 8));
    }

    #[test]
    fn backward_previous_line() {
        let buf = Buffer::from_text("foo aaa\nbbb");
        let m = find_backward(&buf, "foo", p(1, 2)).unwrap();
        assert_eq!(m.start, p(0, 0));
    }

    #[test]
    fn backward_wraps() {
        let buf = Buffer::from_text("aaa\nbbb foo");
        let m = find_backward(&buf, "foo", p(0, 2)).unwrap();
        assert_eq!(m.start, p(1, 4));
    }

    // -- find ----------------------------------------------------------------

    #[test]
    fn find_dispatches_direction() {
        let buf = Buffer::from_text("x foo x");
        assert!(find(&buf, "foo", p(0, 0), Direction::Forward).is_some());
        assert!(find(&buf, "foo", p(0, 6), Direction::Backward).is_some());
    }

    // -- word_at ------------------------------------------------------------

    #[test]
    fn word_at_middle() {
        let buf = Buffer::from_text("say hello now");
        assert_eq!(word_at(&buf, p(0, 6)).as_deref(), Some("hello"));
    }

    #[test]
    fn word_at_start_and_end() {
        let buf = Buffer::from_text("hello");
        assert_eq!(word_at(&buf, p(0, 0)).as_deref(), Some("hello"));
        assert_eq!(word_at(&buf, p(0, 4)).as_deref(), Some("hello"));
    }

    #[test]
    fn word_at_whitespace_is_none() {
        let buf = Buffer::from_text("a b");
        assert_eq!(word_at(&buf, p(0, 1)), None);
    }

    #[test]
    fn word_at_punctuation_is_none() {
        let buf = Buffer::from_text("a.b");
        assert_eq!(word_at(&buf, p(0, 1)), None);
    }

    #[test]
    fn word_at_underscore_run() {
        let buf = Buffer::from_text("foo_bar baz");
        assert_eq!(word_at(&buf, p(0, 3)).as_deref(), Some("foo_bar"));
    }
}
