//! Word boundary scanning — word and WORD motions.
//!
//! Provides the eight fundamental word scans:
//!
//! | Function | Key | Description |
//! |----------|-----|-------------|
//! | [`word_start_next`] | `w` | Forward to start of next word |
//! | [`word_start_prev`] | `b` | Backward to start of previous word |
//! | [`word_end_next`] | `e` | Forward to end of current/next word |
//! | [`word_end_prev`] | `ge` | Backward to end of previous word |
//! | [`longword_start_next`] | `W` | Forward to start of next WORD |
//! | [`longword_start_prev`] | `B` | Backward to start of previous WORD |
//! | [`longword_end_next`] | `E` | Forward to end of current/next WORD |
//! | [`longword_end_prev`] | `gE` | Backward to end of previous WORD |
//!
//! # Words vs WORDs
//!
//! A **word** is a run of word characters (letters, digits, underscore) or a
//! run of other non-blank characters: `hello.world` contains three words
//! (`hello`, `.`, `world`). A **WORD** is a run of non-blank characters —
//! `hello.world` is one WORD.
//!
//! An empty line is a word boundary: `w` and `b` stop at empty lines.
//!
//! When no further word exists in the scan direction, the forward scans
//! return the end-of-buffer position so that an operator over the motion
//! covers the remaining text; cursor movement clamps separately.

use crate::buffer::Buffer;
use crate::position::Position;

// ---------------------------------------------------------------------------
// Character classification
// ---------------------------------------------------------------------------

/// Character class for word boundary detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CharClass {
    /// Letters, digits, underscore.
    Word,
    /// Non-blank, non-word characters (operators, brackets, etc.).
    Punctuation,
    /// Whitespace within a line (space, tab).
    Blank,
    /// Line ending (`\n`, `\r`).
    Newline,
}

/// Classify a character for small-word scans (`w`/`b`/`e`/`ge`).
pub(crate) fn classify(ch: char) -> CharClass {
    if ch == '\n' || ch == '\r' {
        CharClass::Newline
    } else if ch.is_whitespace() {
        CharClass::Blank
    } else if ch.is_alphanumeric() || ch == '_' {
        CharClass::Word
    } else {
        CharClass::Punctuation
    }
}

/// Classify a character for WORD scans (`W`/`B`/`E`/`gE`).
/// Only blank vs non-blank matters.
pub(crate) fn classify_long(ch: char) -> CharClass {
    if ch == '\n' || ch == '\r' {
        CharClass::Newline
    } else if ch.is_whitespace() {
        CharClass::Blank
    } else {
        CharClass::Word
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// `w` — forward to the start of the next word.
#[must_use]
pub fn word_start_next(buf: &Buffer, pos: Position) -> Position {
    forward_start(buf, pos, classify)
}

/// `b` — backward to the start of the previous word.
#[must_use]
pub fn word_start_prev(buf: &Buffer, pos: Position) -> Position {
    backward_start(buf, pos, classify)
}

/// `e` — forward to the end of the current or next word.
#[must_use]
pub fn word_end_next(buf: &Buffer, pos: Position) -> Position {
    forward_end(buf, pos, classify)
}

/// `ge` — backward to the end of the previous word.
#[must_use]
pub fn word_end_prev(buf: &Buffer, pos: Position) -> Position {
    backward_end(buf, pos, classify)
}

/// `W` — forward to the start of the next WORD.
#[must_use]
pub fn longword_start_next(buf: &Buffer, pos: Position) -> Position {
    forward_start(buf, pos, classify_long)
}

/// `B` — backward to the start of the previous WORD.
#[must_use]
pub fn longword_start_prev(buf: &Buffer, pos: Position) -> Position {
    backward_start(buf, pos, classify_long)
}

/// `E` — forward to the end of the current or next WORD.
#[must_use]
pub fn longword_end_next(buf: &Buffer, pos: Position) -> Position {
    forward_end(buf, pos, classify_long)
}

/// `gE` — backward to the end of the previous WORD.
#[must_use]
pub fn longword_end_prev(buf: &Buffer, pos: Position) -> Position {
    backward_end(buf, pos, classify_long)
}

// ---------------------------------------------------------------------------
// Core algorithms
// ---------------------------------------------------------------------------

/// Forward to the start of the next word/WORD.
///
/// 1. Skip the current token (same-class chars).
/// 2. Skip whitespace/newlines, stopping at empty lines.
/// 3. Land on the first char of the next token, or the end of the buffer
///    when there is none.
fn forward_start(buf: &Buffer, pos: Position, classify_fn: fn(char) -> CharClass) -> Position {
    let rope = buf.rope();
    let total = rope.len_chars();

    let Some(start_idx) = buf.pos_to_char_idx(pos) else {
        return buf.clamp_position(pos);
    };
    if total == 0 || start_idx >= total {
        return pos;
    }

    let mut idx = start_idx;
    let start_class = classify_fn(rope.char(idx));

    // Phase 1: skip the current token (word or punctuation run).
    if matches!(start_class, CharClass::Word | CharClass::Punctuation) {
        while idx < total && classify_fn(rope.char(idx)) == start_class {
            idx += 1;
        }
    }

    // Phase 2: skip whitespace/newlines, stopping at empty lines.
    while idx < total {
        let ch = rope.char(idx);
        match classify_fn(ch) {
            CharClass::Word | CharClass::Punctuation => break,
            CharClass::Blank => idx += 1,
            CharClass::Newline => {
                idx += 1;
                // \r\n counts as one newline.
                if ch == '\r' && idx < total && rope.char(idx) == '\n' {
                    idx += 1;
                }
                // If the next char is also a newline, we hit an empty line.
                if idx < total && matches!(classify_fn(rope.char(idx)), CharClass::Newline) {
                    break;
                }
            }
        }
    }

    buf.char_idx_to_pos(idx).unwrap_or(pos)
}

/// Backward to the start of the previous word/WORD.
///
/// 1. Step back one char.
/// 2. Skip whitespace/newlines backward, stopping at empty lines.
/// 3. Skip backward through the word to its start.
fn backward_start(buf: &Buffer, pos: Position, classify_fn: fn(char) -> CharClass) -> Position {
    let rope = buf.rope();
    let total = rope.len_chars();

    let Some(start_idx) = buf.pos_to_char_idx(pos) else {
        return buf.clamp_position(pos);
    };
    if start_idx == 0 || total == 0 {
        return pos;
    }

    let mut idx = start_idx - 1;

    // Phase 1: skip whitespace/newlines backward, stopping at empty lines.
    loop {
        let class = classify_fn(rope.char(idx));
        match class {
            CharClass::Word | CharClass::Punctuation => break,
            CharClass::Newline => {
                // An empty line is a word boundary — stop at its start.
                let line = rope.char_to_line(idx);
                if buf.line_content_len(line) == Some(0) {
                    return buf.char_idx_to_pos(rope.line_to_char(line)).unwrap_or(pos);
                }
                if idx == 0 {
                    return buf.char_idx_to_pos(0).unwrap_or(pos);
                }
                idx -= 1;
            }
            CharClass::Blank => {
                if idx == 0 {
                    return buf.char_idx_to_pos(0).unwrap_or(pos);
                }
                idx -= 1;
            }
        }
    }

    // Phase 2: skip backward while same class to find the word start.
    let word_class = classify_fn(rope.char(idx));
    while idx > 0 && classify_fn(rope.char(idx - 1)) == word_class {
        idx -= 1;
    }

    buf.char_idx_to_pos(idx).unwrap_or(pos)
}

/// Forward to the end of the current or next word/WORD.
///
/// 1. Advance one char (so we move off the current word-end).
/// 2. Skip whitespace/newlines (no empty-line stop for `e`/`E`).
/// 3. Advance to the last char of the word.
fn forward_end(buf: &Buffer, pos: Position, classify_fn: fn(char) -> CharClass) -> Position {
    let rope = buf.rope();
    let total = rope.len_chars();

    let Some(start_idx) = buf.pos_to_char_idx(pos) else {
        return buf.clamp_position(pos);
    };
    let last = total.saturating_sub(1);
    if total == 0 || start_idx >= last {
        return pos;
    }

    let mut idx = start_idx + 1;

    // Phase 1: skip whitespace/newlines.
    while idx < total {
        let class = classify_fn(rope.char(idx));
        if matches!(class, CharClass::Word | CharClass::Punctuation) {
            break;
        }
        idx += 1;
    }

    if idx >= total {
        return pos; // nothing but whitespace ahead — stay put
    }

    // Phase 2: advance to the end of this word (last char of same class).
    let word_class = classify_fn(rope.char(idx));
    while idx < last && classify_fn(rope.char(idx + 1)) == word_class {
        idx += 1;
    }

    buf.char_idx_to_pos(idx).unwrap_or(pos)
}

/// Backward to the end of the previous word/WORD.
///
/// 1. Step back one char, skipping the remainder of the current token.
/// 2. Skip whitespace/newlines backward.
/// 3. Land on the last char of the previous token.
fn backward_end(buf: &Buffer, pos: Position, classify_fn: fn(char) -> CharClass) -> Position {
    let rope = buf.rope();
    let total = rope.len_chars();

    let Some(start_idx) = buf.pos_to_char_idx(pos) else {
        return buf.clamp_position(pos);
    };
    if start_idx == 0 || total == 0 {
        return pos;
    }

    let cur_class = if start_idx < total {
        classify_fn(rope.char(start_idx))
    } else {
        CharClass::Newline
    };

    let mut idx = start_idx - 1;

    // Phase 1: if still inside the token under the cursor, leave it first.
    if matches!(cur_class, CharClass::Word | CharClass::Punctuation) {
        while classify_fn(rope.char(idx)) == cur_class {
            if idx == 0 {
                return pos; // the buffer starts with this token — no previous end
            }
            idx -= 1;
        }
    }

    // Phase 2: skip whitespace/newlines backward.
    while matches!(classify_fn(rope.char(idx)), CharClass::Blank | CharClass::Newline) {
        if idx == 0 {
            return pos;
        }
        idx -= 1;
    }

    buf.char_idx_to_pos(idx).unwrap_or(pos)
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

    // -- Classification -----------------------------------------------------

    #[test]
    fn classify_chars() {
        assert_eq!(classify('a'), CharClass::Word);
        assert_eq!(classify('9'), CharClass::Word);
        assert_eq!(classify('_'), CharClass::Word);
        assert_eq!(classify('.'), CharClass::Punctuation);
        assert_eq!(classify('('), CharClass::Punctuation);
        assert_eq!(classify(' '), CharClass::Blank);
        assert_eq!(classify('\t'), CharClass::Blank);
        assert_eq!(classify('\n'), CharClass::Newline);
    }

    #[test]
    fn classify_unicode_letters_are_word() {
        assert_eq!(classify('é'), CharClass::Word);
        assert_eq!(classify('中'), CharClass::Word);
    }

    #[test]
    fn classify_long_merges_punct_into_word() {
        assert_eq!(classify_long('.'), CharClass::Word);
        assert_eq!(classify_long('a'), CharClass::Word);
        assert_eq!(classify_long(' '), CharClass::Blank);
    }

    // -- word_start_next (w) ------------------------------------------------

    #[test]
    fn w_simple_two_words() {
        let buf = Buffer::from_text("hello world");
        assert_eq!(word_start_next(&buf, p(0, 0)), p(0, 6));
    }

    #[test]
    fn w_from_middle_of_word() {
        let buf = Buffer::from_text("hello world");
        assert_eq!(word_start_next(&buf, p(0, 2)), p(0, 6));
    }

    #[test]
    fn w_punctuation_boundary() {
        let buf = Buffer::from_text("hello.world");
        assert_eq!(word_start_next(&buf, p(0, 0)), p(0, 5));
        assert_eq!(word_start_next(&buf, p(0, 5)), p(0, 6));
    }

    #[test]
    fn w_across_lines() {
        let buf = Buffer::from_text("hello\nworld");
        assert_eq!(word_start_next(&buf, p(0, 0)), p(1, 0));
    }

    #[test]
    fn w_blank_line_stop() {
        let buf = Buffer::from_text("hello\n\nworld");
        assert_eq!(word_start_next(&buf, p(0, 0)), p(1, 0));
        assert_eq!(word_start_next(&buf, p(1, 0)), p(2, 0));
    }

    #[test]
    fn w_whitespace_only_line_not_a_stop() {
        let buf = Buffer::from_text("hello\n   \nworld");
        assert_eq!(word_start_next(&buf, p(0, 0)), p(2, 0));
    }

    #[test]
    fn w_last_word_goes_to_buffer_end() {
        // Operators over `w` on the last word cover the remaining text.
        let buf = Buffer::from_text("hello world");
        assert_eq!(word_start_next(&buf, p(0, 6)), p(0, 11));
    }

    #[test]
    fn w_trailing_whitespace_goes_to_buffer_end() {
        let buf = Buffer::from_text("hello   ");
        assert_eq!(word_start_next(&buf, p(0, 0)), p(0, 8));
    }

    #[test]
    fn w_empty_buffer() {
        let buf = Buffer::new();
        assert_eq!(word_start_next(&buf, p(0, 0)), p(0, 0));
    }

    #[test]
    fn w_consecutive_punct_groups() {
        let buf = Buffer::from_text("a::b");
        assert_eq!(word_start_next(&buf, p(0, 0)), p(0, 1));
        assert_eq!(word_start_next(&buf, p(0, 1)), p(0, 3));
    }

    #[test]
    fn w_unicode_words() {
        let buf = Buffer::from_text("café naïve");
        assert_eq!(word_start_next(&buf, p(0, 0)), p(0, 5));
    }

    // -- word_start_prev (b) ------------------------------------------------

    #[test]
    fn b_simple_two_words() {
        let buf = Buffer::from_text("hello world");
        assert_eq!(word_start_prev(&buf, p(0, 6)), p(0, 0));
    }

    #[test]
    fn b_from_middle_of_word() {
        let buf = Buffer::from_text("hello world");
        assert_eq!(word_start_prev(&buf, p(0, 8)), p(0, 6));
    }

    #[test]
    fn b_punctuation_boundary() {
        let buf = Buffer::from_text("hello.world");
        assert_eq!(word_start_prev(&buf, p(0, 6)), p(0, 5));
        assert_eq!(word_start_prev(&buf, p(0, 5)), p(0, 0));
    }

    #[test]
    fn b_across_lines() {
        let buf = Buffer::from_text("hello\nworld");
        assert_eq!(word_start_prev(&buf, p(1, 0)), p(0, 0));
    }

    #[test]
    fn b_blank_line_stop() {
        let buf = Buffer::from_text("hello\n\nworld");
        assert_eq!(word_start_prev(&buf, p(2, 0)), p(1, 0));
        assert_eq!(word_start_prev(&buf, p(1, 0)), p(0, 0));
    }

    #[test]
    fn b_start_of_buffer_no_move() {
        let buf = Buffer::from_text("hello");
        assert_eq!(word_start_prev(&buf, p(0, 0)), p(0, 0));
    }

    // -- word_end_next (e) --------------------------------------------------

    #[test]
    fn e_simple_to_end_of_word() {
        let buf = Buffer::from_text("hello world");
        assert_eq!(word_end_next(&buf, p(0, 0)), p(0, 4));
    }

    #[test]
    fn e_already_at_end_goes_to_next() {
        let buf = Buffer::from_text("hello world");
        assert_eq!(word_end_next(&buf, p(0, 4)), p(0, 10));
    }

    #[test]
    fn e_across_lines() {
        let buf = Buffer::from_text("hello\nworld");
        assert_eq!(word_end_next(&buf, p(0, 4)), p(1, 4));
    }

    #[test]
    fn e_skips_blank_lines() {
        let buf = Buffer::from_text("hello\n\nworld");
        assert_eq!(word_end_next(&buf, p(0, 4)), p(2, 4));
    }

    #[test]
    fn e_end_of_buffer_no_move() {
        let buf = Buffer::from_text("hello");
        assert_eq!(word_end_next(&buf, p(0, 4)), p(0, 4));
    }

    // -- word_end_prev (ge) -------------------------------------------------

    #[test]
    fn ge_simple() {
        let buf = Buffer::from_text("hello world");
        // From inside "world" back to the 'o' of "hello".
        assert_eq!(word_end_prev(&buf, p(0, 8)), p(0, 4));
    }

    #[test]
    fn ge_from_whitespace() {
        let buf = Buffer::from_text("hello world");
        assert_eq!(word_end_prev(&buf, p(0, 5)), p(0, 4));
    }

    #[test]
    fn ge_from_word_start() {
        let buf = Buffer::from_text("hello world");
        assert_eq!(word_end_prev(&buf, p(0, 6)), p(0, 4));
    }

    #[test]
    fn ge_punctuation() {
        let buf = Buffer::from_text("hello.world");
        // From inside "world" back to the '.'.
        assert_eq!(word_end_prev(&buf, p(0, 8)), p(0, 5));
    }

    #[test]
    fn ge_first_word_no_move() {
        let buf = Buffer::from_text("hello world");
        assert_eq!(word_end_prev(&buf, p(0, 2)), p(0, 2));
    }

    #[test]
    fn ge_across_lines() {
        let buf = Buffer::from_text("hello\nworld");
        assert_eq!(word_end_prev(&buf, p(1, 2)), p(0, 4));
    }

    // -- WORD variants ------------------------------------------------------

    #[test]
    fn long_w_treats_punct_as_word() {
        let buf = Buffer::from_text("hello.world next");
        assert_eq!(longword_start_next(&buf, p(0, 0)), p(0, 12));
    }

    #[test]
    fn long_b_treats_punct_as_word() {
        let buf = Buffer::from_text("hello.world next");
        assert_eq!(longword_start_prev(&buf, p(0, 12)), p(0, 0));
    }

    #[test]
    fn long_e_treats_punct_as_word() {
        let buf = Buffer::from_text("hello.world next");
        assert_eq!(longword_end_next(&buf, p(0, 0)), p(0, 10));
    }

    #[test]
    fn long_ge_treats_punct_as_word() {
        let buf = Buffer::from_text("hello.world next");
        assert_eq!(longword_end_prev(&buf, p(0, 12)), p(0, 10));
    }

    // -- Round trips --------------------------------------------------------

    #[test]
    fn roundtrip_w_then_b() {
        let buf = Buffer::from_text("hello world foo");
        let mid = word_start_next(&buf, p(0, 0));
        assert_eq!(mid, p(0, 6));
        assert_eq!(word_start_prev(&buf, mid), p(0, 0));
    }

    #[test]
    fn indented_code_tokens() {
        let buf = Buffer::from_text("    fn main() {");
        assert_eq!(word_start_next(&buf, p(0, 4)), p(0, 7));
        assert_eq!(word_start_next(&buf, p(0, 7)), p(0, 11));
        assert_eq!(word_start_next(&buf, p(0, 11)), p(0, 14));
    }
}
