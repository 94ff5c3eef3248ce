//! Text objects — structural ranges around the cursor.
//!
//! A text object maps `(buffer, position)` to the range of the structure the
//! position sits inside. Combined with operators they form the second half of
//! the command grammar:
//!
//! ```text
//! operator + text-object = command
//! d        + iw          = delete inner word
//! c        + i"          = change inside quotes
//! y        + a(          = yank around parentheses
//! ```
//!
//! Every object comes in an *inner* and an *outer* variant; the two differ
//! only in whether delimiting characters or surrounding whitespace are
//! included. [`range`] returns `None` when the position is not inside the
//! object — the caller treats that as an invalid range and aborts the
//! pending command.
//!
//! | Inner        | Outer        | Object                                |
//! |--------------|--------------|---------------------------------------|
//! | `iw` / `iW`  | `aw` / `aW`  | word / WORD                           |
//! | `is`         | `as`         | sentence                              |
//! | `ip`         | `ap`         | paragraph                             |
//! | `i(` `i[` `i{` `i<` | `a(` `a[` `a{` `a<` | bracket blocks (nesting aware) |
//! | `i"` `i'` `` i` `` | `a"` `a'` `` a` `` | quoted strings (per line)   |
//! | `ie`         | `ae`         | the entire buffer                     |
//! | `if`         | `af`         | a C-like function body / definition   |
//! | `il`         | `al`         | the current line                      |

use crate::buffer::Buffer;
use crate::motion::sentence_starts;
use crate::position::{Position, Range};
use crate::word::{classify, classify_long, CharClass};

// ---------------------------------------------------------------------------
// TextObjectKind
// ---------------------------------------------------------------------------

/// Every text object the editor knows, inner and outer variants included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextObjectKind {
    WordInner,
    WordOuter,
    LongwordInner,
    LongwordOuter,
    SentenceInner,
    SentenceOuter,
    ParagraphInner,
    ParagraphOuter,
    ParenInner,
    ParenOuter,
    SquareInner,
    SquareOuter,
    CurlyInner,
    CurlyOuter,
    AngleInner,
    AngleOuter,
    QuoteInner,
    QuoteOuter,
    SingleQuoteInner,
    SingleQuoteOuter,
    BacktickInner,
    BacktickOuter,
    EntireInner,
    EntireOuter,
    FunctionInner,
    FunctionOuter,
    LineInner,
    LineOuter,
}

impl TextObjectKind {
    /// The matching outer variant of an inner kind (and vice versa stays).
    #[must_use]
    pub const fn outer(self) -> Self {
        use TextObjectKind::*;
        match self {
            WordInner => WordOuter,
            LongwordInner => LongwordOuter,
            SentenceInner => SentenceOuter,
            ParagraphInner => ParagraphOuter,
            ParenInner => ParenOuter,
            SquareInner => SquareOuter,
            CurlyInner => CurlyOuter,
            AngleInner => AngleOuter,
            QuoteInner => QuoteOuter,
            SingleQuoteInner => SingleQuoteOuter,
            BacktickInner => BacktickOuter,
            EntireInner => EntireOuter,
            FunctionInner => FunctionOuter,
            LineInner => LineOuter,
            other => other,
        }
    }
}

/// Compute the range of a text object at `pos`, or `None` when the position
/// is not inside one.
#[must_use]
pub fn range(kind: TextObjectKind, buf: &Buffer, pos: Position) -> Option<Range> {
    use TextObjectKind::*;
    match kind {
        WordInner => inner_word_impl(buf, pos, classify),
        WordOuter => outer_word_impl(buf, pos, classify),
        LongwordInner => inner_word_impl(buf, pos, classify_long),
        LongwordOuter => outer_word_impl(buf, pos, classify_long),
        SentenceInner => sentence(buf, pos, false),
        SentenceOuter => sentence(buf, pos, true),
        ParagraphInner => paragraph(buf, pos, false),
        ParagraphOuter => paragraph(buf, pos, true),
        ParenInner => inner_bracket(buf, pos, '(', ')'),
        ParenOuter => outer_bracket(buf, pos, '(', ')'),
        SquareInner => inner_bracket(buf, pos, '[', ']'),
        SquareOuter => outer_bracket(buf, pos, '[', ']'),
        CurlyInner => inner_bracket(buf, pos, '{', '}'),
        CurlyOuter => outer_bracket(buf, pos, '{', '}'),
        AngleInner => inner_bracket(buf, pos, '<', '>'),
        AngleOuter => outer_bracket(buf, pos, '<', '>'),
        QuoteInner => inner_quote(buf, pos, '"'),
        QuoteOuter => outer_quote(buf, pos, '"'),
        SingleQuoteInner => inner_quote(buf, pos, '\''),
        SingleQuoteOuter => outer_quote(buf, pos, '\''),
        BacktickInner => inner_quote(buf, pos, '`'),
        BacktickOuter => outer_quote(buf, pos, '`'),
        EntireInner => entire(buf, false),
        EntireOuter => entire(buf, true),
        FunctionInner => function(buf, pos, false),
        FunctionOuter => function(buf, pos, true),
        LineInner => line_object(buf, pos, false),
        LineOuter => line_object(buf, pos, true),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Convert a char index to a Position, handling end-of-buffer.
///
/// Unlike `Buffer::char_idx_to_pos`, this maps `idx >= len_chars()` to the
/// position after the last character. Needed for half-open range endpoints.
fn idx_to_pos(buf: &Buffer, idx: usize) -> Position {
    let rope = buf.rope();
    let total = rope.len_chars();
    if total == 0 {
        return Position::ZERO;
    }
    if idx >= total {
        buf.end_position()
    } else {
        buf.char_idx_to_pos(idx).unwrap_or(Position::ZERO)
    }
}

// ---------------------------------------------------------------------------
// Word objects
// ---------------------------------------------------------------------------

/// Core algorithm for inner word/WORD.
///
/// Finds the run of same-class characters around the cursor position.
/// For Word/Punctuation: the full run. For Blank: the whitespace run,
/// stopping at newlines. For Newline: just the newline character(s).
fn inner_word_impl(
    buf: &Buffer,
    pos: Position,
    classify_fn: fn(char) -> CharClass,
) -> Option<Range> {
    let rope = buf.rope();
    let total = rope.len_chars();
    let idx = buf.pos_to_char_idx(pos)?;
    if total == 0 || idx >= total {
        return None;
    }

    let ch = rope.char(idx);
    let class = classify_fn(ch);

    let (start, end) = match class {
        CharClass::Word | CharClass::Punctuation | CharClass::Blank => {
            let run_class = if class == CharClass::Blank {
                CharClass::Blank
            } else {
                class
            };
            let mut s = idx;
            while s > 0 && classify_fn(rope.char(s - 1)) == run_class {
                s -= 1;
            }
            let mut e = idx + 1;
            while e < total && classify_fn(rope.char(e)) == run_class {
                e += 1;
            }
            (s, e)
        }
        CharClass::Newline => {
            let mut e = idx + 1;
            // \r\n is one newline.
            if ch == '\r' && e < total && rope.char(e) == '\n' {
                e += 1;
            }
            (idx, e)
        }
    };

    Some(Range::new(idx_to_pos(buf, start), idx_to_pos(buf, end)))
}

/// Core algorithm for outer word/WORD.
///
/// Extends the inner word to include surrounding whitespace: trailing
/// whitespace first, leading if there is none, neither when the word is
/// tight against its neighbors.
fn outer_word_impl(
    buf: &Buffer,
    pos: Position,
    classify_fn: fn(char) -> CharClass,
) -> Option<Range> {
    let rope = buf.rope();
    let total = rope.len_chars();
    let inner = inner_word_impl(buf, pos, classify_fn)?;

    let start_idx = buf.pos_to_char_idx(inner.start)?;
    let end_idx = buf.pos_to_char_idx(inner.end).unwrap_or(total);

    let idx = buf.pos_to_char_idx(pos)?;
    let class = classify_fn(rope.char(idx));

    match class {
        CharClass::Word | CharClass::Punctuation => {
            // Trailing whitespace first.
            let mut new_end = end_idx;
            while new_end < total && classify_fn(rope.char(new_end)) == CharClass::Blank {
                new_end += 1;
            }
            if new_end > end_idx {
                return Some(Range::new(inner.start, idx_to_pos(buf, new_end)));
            }

            // No trailing whitespace — take leading whitespace instead.
            let mut new_start = start_idx;
            while new_start > 0 && classify_fn(rope.char(new_start - 1)) == CharClass::Blank {
                new_start -= 1;
            }
            if new_start < start_idx {
                return Some(Range::new(idx_to_pos(buf, new_start), inner.end));
            }

            Some(inner)
        }
        CharClass::Blank => {
            // On whitespace: include the following word.
            let mut new_end = end_idx;
            if new_end < total {
                let next_class = classify_fn(rope.char(new_end));
                if matches!(next_class, CharClass::Word | CharClass::Punctuation) {
                    while new_end < total && classify_fn(rope.char(new_end)) == next_class {
                        new_end += 1;
                    }
                }
            }
            Some(Range::new(inner.start, idx_to_pos(buf, new_end)))
        }
        CharClass::Newline => Some(inner),
    }
}

// ---------------------------------------------------------------------------
// Quote objects
// ---------------------------------------------------------------------------

/// Inner quote — text between the quotes, excluding them.
fn inner_quote(buf: &Buffer, pos: Position, quote: char) -> Option<Range> {
    let (open_col, close_col) = find_quote_pair(buf, pos, quote)?;
    let start = Position::new(pos.line, open_col + 1);
    let end = Position::new(pos.line, close_col);
    if start > end {
        return Some(Range::point(start));
    }
    Some(Range::new(start, end))
}

/// Outer quote — text including the quotes.
fn outer_quote(buf: &Buffer, pos: Position, quote: char) -> Option<Range> {
    let (open_col, close_col) = find_quote_pair(buf, pos, quote)?;
    Some(Range::new(
        Position::new(pos.line, open_col),
        Position::new(pos.line, close_col + 1),
    ))
}

/// Find the quote pair on the current line that contains (or follows) the
/// cursor.
///
/// Quotes pair left-to-right: 1st with 2nd, 3rd with 4th, and so on. If the
/// cursor is inside a pair, that pair wins; otherwise the next pair forward.
fn find_quote_pair(buf: &Buffer, pos: Position, quote: char) -> Option<(usize, usize)> {
    let line = buf.line(pos.line)?;

    let mut quotes = Vec::new();
    for (i, ch) in line.chars().enumerate() {
        if ch == '\n' || ch == '\r' {
            break;
        }
        if ch == quote {
            quotes.push(i);
        }
    }

    if quotes.len() < 2 {
        return None;
    }

    let col = pos.col;

    for pair in quotes.chunks(2) {
        if let &[open, close] = pair {
            if col >= open && col <= close {
                return Some((open, close));
            }
        }
    }

    // Cursor outside all pairs — the next pair forward.
    for pair in quotes.chunks(2) {
        if let &[open, close] = pair {
            if open > col {
                return Some((open, close));
            }
        }
    }

    None
}

// ---------------------------------------------------------------------------
// Bracket objects
// ---------------------------------------------------------------------------

/// Inner bracket — text between matching brackets, excluding them.
fn inner_bracket(buf: &Buffer, pos: Position, open: char, close: char) -> Option<Range> {
    let (open_idx, close_idx) = find_bracket_pair(buf, pos, open, close)?;
    let start = open_idx + 1;
    let end = close_idx;
    if start >= end {
        return Some(Range::point(idx_to_pos(buf, start)));
    }
    Some(Range::new(idx_to_pos(buf, start), idx_to_pos(buf, end)))
}

/// Outer bracket — text including the brackets themselves.
fn outer_bracket(buf: &Buffer, pos: Position, open: char, close: char) -> Option<Range> {
    let (open_idx, close_idx) = find_bracket_pair(buf, pos, open, close)?;
    Some(Range::new(
        idx_to_pos(buf, open_idx),
        idx_to_pos(buf, close_idx + 1),
    ))
}

/// Find the matching bracket pair containing the cursor.
///
/// Handles nesting and works across lines. Returns the char indices of the
/// opening and closing brackets.
fn find_bracket_pair(
    buf: &Buffer,
    pos: Position,
    open: char,
    close: char,
) -> Option<(usize, usize)> {
    let rope = buf.rope();
    let total = rope.len_chars();
    let cursor_idx = buf.pos_to_char_idx(pos)?;
    if total == 0 || cursor_idx >= total {
        return None;
    }

    let cursor_char = rope.char(cursor_idx);

    if cursor_char == open {
        let close_idx = find_closing(rope, cursor_idx, total, open, close)?;
        return Some((cursor_idx, close_idx));
    }

    if cursor_char == close {
        let open_idx = find_opening(rope, cursor_idx, open, close)?;
        return Some((open_idx, cursor_idx));
    }

    let open_idx = find_opening(rope, cursor_idx, open, close)?;
    let close_idx = find_closing(rope, open_idx, total, open, close)?;

    if cursor_idx > open_idx && cursor_idx < close_idx {
        Some((open_idx, close_idx))
    } else {
        None
    }
}

/// Search backward from `start` for an unmatched opening bracket.
///
/// Tracks nesting: each close bracket increases depth, each open bracket
/// decreases it. When depth reaches 0 at an open bracket, that's the match.
pub(crate) fn find_opening(
    rope: &ropey::Rope,
    start: usize,
    open: char,
    close: char,
) -> Option<usize> {
    let mut depth: usize = 0;
    let mut i = start;

    loop {
        if i == 0 {
            if rope.len_chars() > 0 && rope.char(0) == open && depth == 0 {
                return Some(0);
            }
            return None;
        }
        i -= 1;

        let ch = rope.char(i);
        if ch == close {
            depth += 1;
        } else if ch == open {
            if depth == 0 {
                return Some(i);
            }
            depth -= 1;
        }
    }
}

/// Search forward from `start` for the matching closing bracket.
///
/// Tracks nesting: each open bracket increases depth, each close bracket
/// decreases it. When depth reaches 0 at a close bracket, that's the match.
pub(crate) fn find_closing(
    rope: &ropey::Rope,
    start: usize,
    total: usize,
    open: char,
    close: char,
) -> Option<usize> {
    let mut depth: usize = 0;
    for i in (start + 1)..total {
        let ch = rope.char(i);
        if ch == open {
            depth += 1;
        } else if ch == close {
            if depth == 0 {
                return Some(i);
            }
            depth -= 1;
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Sentence & paragraph objects
// ---------------------------------------------------------------------------

/// `is` / `as` — the sentence around the cursor. Outer includes the trailing
/// spaces up to the next sentence.
fn sentence(buf: &Buffer, pos: Position, outer: bool) -> Option<Range> {
    let rope = buf.rope();
    let total = rope.len_chars();
    let idx = buf.pos_to_char_idx(pos)?;
    if total == 0 {
        return None;
    }

    let starts = sentence_starts(rope);
    let &start = starts.iter().rev().find(|&&s| s <= idx)?;

    // The sentence runs to the start of the next sentence (outer) or to the
    // end of its terminator run (inner).
    let next = starts.iter().find(|&&s| s > start).copied().unwrap_or(total);

    let end = if outer {
        next
    } else {
        // Trim trailing whitespace between the terminator and `next`.
        let mut e = next;
        while e > start && rope.char(e - 1).is_whitespace() {
            e -= 1;
        }
        e
    };

    if idx >= end && !outer {
        // Cursor sits in the inter-sentence whitespace; treat as outer tail.
        return Some(Range::new(idx_to_pos(buf, start), idx_to_pos(buf, next)));
    }
    Some(Range::new(idx_to_pos(buf, start), idx_to_pos(buf, end)))
}

/// `ip` / `ap` — the paragraph (blank-line delimited block) around the
/// cursor. Outer includes the trailing blank lines, or the leading ones when
/// the paragraph ends the buffer. On a blank line, the blank run itself is
/// the inner object.
fn paragraph(buf: &Buffer, pos: Position, outer: bool) -> Option<Range> {
    if buf.is_empty() {
        return None;
    }
    let last = buf.last_line();
    let line = pos.line.min(last);
    let blank = |l: usize| buf.line_content_len(l) == Some(0);

    let mut first = line;
    while first > 0 && blank(first - 1) == blank(line) {
        first -= 1;
    }
    let mut end = line;
    while end < last && blank(end + 1) == blank(line) {
        end += 1;
    }

    let (mut first, mut end) = (first, end);
    if outer {
        if blank(line) {
            // Blank run plus the following paragraph.
            while end < last && !blank(end + 1) {
                end += 1;
            }
        } else {
            // Paragraph plus trailing blank lines, or leading when none.
            let had_trailing = end < last && blank(end + 1);
            while end < last && blank(end + 1) {
                end += 1;
            }
            if !had_trailing {
                while first > 0 && blank(first - 1) {
                    first -= 1;
                }
            }
        }
    }

    let start = Position::new(first, 0);
    let end_pos = if end + 1 < buf.line_count() {
        Position::new(end + 1, 0)
    } else {
        buf.end_position()
    };
    Some(Range::new(start, end_pos.max(start)))
}

// ---------------------------------------------------------------------------
// Entire / function / line objects
// ---------------------------------------------------------------------------

/// `ie` / `ae` — the whole buffer. Inner excludes leading and trailing
/// blank lines.
fn entire(buf: &Buffer, outer: bool) -> Option<Range> {
    if buf.is_empty() {
        return None;
    }
    if outer {
        return Some(Range::new(Position::ZERO, buf.end_position()));
    }

    let blank = |l: usize| buf.line_content_len(l) == Some(0);
    let last = buf.last_line();

    let mut first_line = 0;
    while first_line < last && blank(first_line) {
        first_line += 1;
    }
    let mut last_line = last;
    while last_line > first_line && blank(last_line) {
        last_line -= 1;
    }
    if blank(first_line) && first_line == last_line {
        return None; // all blank
    }

    let start = Position::new(first_line, 0);
    let end = if last_line + 1 < buf.line_count() {
        Position::new(last_line + 1, 0)
    } else {
        buf.end_position()
    };
    Some(Range::new(start, end))
}

/// `if` / `af` — a C-like function: a brace block whose `{` is preceded by a
/// header (the last non-whitespace before it is `)`). Inner is the brace
/// block's interior; outer runs from the start of the header line through
/// the closing brace's line ending.
fn function(buf: &Buffer, pos: Position, outer: bool) -> Option<Range> {
    let rope = buf.rope();
    let total = rope.len_chars();
    let idx = buf.pos_to_char_idx(pos)?;
    if total == 0 {
        return None;
    }

    // Walk outward through enclosing brace blocks until one qualifies as a
    // function body.
    let mut probe = idx.min(total - 1);
    loop {
        let open = if rope.char(probe) == '{' {
            probe
        } else {
            find_opening(rope, probe, '{', '}')?
        };
        let close = find_closing(rope, open, total, '{', '}')?;

        if header_precedes(rope, open) {
            let inner_start = open + 1;
            if !outer {
                if inner_start >= close {
                    return Some(Range::point(idx_to_pos(buf, inner_start)));
                }
                return Some(Range::new(
                    idx_to_pos(buf, inner_start),
                    idx_to_pos(buf, close),
                ));
            }
            // Outer: start of the header's line through the close brace's
            // line break.
            let open_pos = idx_to_pos(buf, open);
            let header_line = header_start_line(buf, open_pos);
            let close_pos = idx_to_pos(buf, close);
            let end = if close_pos.line + 1 < buf.line_count() {
                Position::new(close_pos.line + 1, 0)
            } else {
                buf.end_position()
            };
            return Some(Range::new(Position::new(header_line, 0), end));
        }

        // Not a function block — try the next enclosing one.
        if open == 0 {
            return None;
        }
        probe = open - 1;
    }
}

/// True when the last non-whitespace character before `open` is `)` — the
/// shape of a C-like function header.
fn header_precedes(rope: &ropey::Rope, open: usize) -> bool {
    let mut i = open;
    while i > 0 {
        i -= 1;
        let ch = rope.char(i);
        if ch.is_whitespace() {
            continue;
        }
        return ch == ')';
    }
    false
}

/// The first line of the header that ends just before the brace at
/// `open_pos`: the line of the matching `(`'s line, approximated as the line
/// holding the last non-whitespace before the brace.
fn header_start_line(buf: &Buffer, open_pos: Position) -> usize {
    let rope = buf.rope();
    let Some(open_idx) = buf.pos_to_char_idx(open_pos) else {
        return open_pos.line;
    };
    let mut i = open_idx;
    while i > 0 {
        i -= 1;
        if !rope.char(i).is_whitespace() {
            return buf.char_idx_to_pos(i).map_or(open_pos.line, |p| p.line);
        }
    }
    open_pos.line
}

/// `il` / `al` — the current line. Outer includes the line break; inner runs
/// from the first to the last non-blank character.
fn line_object(buf: &Buffer, pos: Position, outer: bool) -> Option<Range> {
    if pos.line >= buf.line_count() {
        return None;
    }
    if outer {
        let start = Position::new(pos.line, 0);
        let end = if pos.line + 1 < buf.line_count() {
            Position::new(pos.line + 1, 0)
        } else {
            buf.end_position()
        };
        return Some(Range::new(start, end.max(start)));
    }

    let start = buf.line_start(pos);
    let finish = buf.line_finish(pos);
    if buf.line_content_len(pos.line) == Some(0) {
        return Some(Range::point(Position::new(pos.line, 0)));
    }
    Some(Range::new(start, Position::new(finish.line, finish.col + 1)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
