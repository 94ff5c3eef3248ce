//! The motion library.
//!
//! A motion maps `(buffer, position)` to a new position, parameterised by a
//! [`MotionKind`] and an optional argument carried in [`MotionCtx`] (the
//! to/till character, the search pattern, a resolved mark position, an
//! absolute line or column). Motions are **total**: they always return a
//! valid position, clamped to the buffer; a motion that cannot move returns
//! its input, which the dispatcher treats as "no range" when an operator is
//! pending.
//!
//! Each kind declares behavior flags:
//!
//! - `LINEWISE` — the motion's default range kind is linewise (`j`, `G`, …);
//!   otherwise charwise. The dispatcher may override per command.
//! - `INCLUSIVE` — an operator over this motion extends the range end by one
//!   character (`e`, `f`, `%`, …).
//! - `JUMP` — executing the motion pushes the previous position onto the
//!   jump list.
//! - `IDEMPOTENT` — applying the motion twice equals applying it once; a
//!   count is not applied by repetition.
//!
//! A few kinds are *meta*: `ToTillRepeat`/`ToTillReverse` resolve to the
//! remembered to/till motion, and the jump/change-list kinds walk editor
//! state. The dispatcher resolves these before calling [`target`]; `target`
//! treats them as no-ops.

use bitflags::bitflags;

use crate::buffer::Buffer;
use crate::position::{Position, TextKind};
use crate::search::{self, Direction};
use crate::textobject::{find_closing, find_opening};
use crate::word;

// ---------------------------------------------------------------------------
// MotionKind
// ---------------------------------------------------------------------------

/// Every motion the editor knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionKind {
    /// `h` — previous character, in text order.
    CharPrev,
    /// `l` — next character, in text order.
    CharNext,
    /// `b` — start of previous word.
    WordStartPrev,
    /// `w` — start of next word.
    WordStartNext,
    /// `ge` — end of previous word.
    WordEndPrev,
    /// `e` — end of next word.
    WordEndNext,
    /// `B` — start of previous WORD.
    LongwordStartPrev,
    /// `W` — start of next WORD.
    LongwordStartNext,
    /// `gE` — end of previous WORD.
    LongwordEndPrev,
    /// `E` — end of next WORD.
    LongwordEndNext,
    /// `k` — one line up, keeping the sticky column.
    LineUp,
    /// `j` — one line down, keeping the sticky column.
    LineDown,
    /// Start of the next line. Used to synthesise doubled operators (`dd`).
    LineNext,
    /// `0` — first column of the line.
    LineBegin,
    /// `^` — first non-blank of the line.
    LineStart,
    /// `g_` — last non-blank of the line.
    LineFinish,
    /// `$` — past the last content character of the line.
    LineEnd,
    /// Absolute line (from a count), first non-blank.
    Line,
    /// `|` — absolute column on the current line.
    Column,
    /// `gg` — first line.
    FileBegin,
    /// `G` — last line.
    FileEnd,
    /// `{` — previous paragraph boundary.
    ParagraphPrev,
    /// `}` — next paragraph boundary.
    ParagraphNext,
    /// `(` — previous sentence start.
    SentencePrev,
    /// `)` — next sentence start.
    SentenceNext,
    /// `%` — matching bracket under the cursor.
    BracketMatch,
    /// `f` — to the next occurrence of a character, rightwards.
    ToRight,
    /// `F` — to the previous occurrence of a character, leftwards.
    ToLeft,
    /// `t` — till (just before) the next occurrence.
    TillRight,
    /// `T` — till (just after) the previous occurrence.
    TillLeft,
    /// `;` — repeat the last to/till motion. Resolved by the dispatcher.
    ToTillRepeat,
    /// `,` — repeat the last to/till motion, reversed. Resolved by the
    /// dispatcher.
    ToTillReverse,
    /// `n` — next match of the last pattern.
    SearchNext,
    /// `N` — previous match of the last pattern.
    SearchPrev,
    /// `*` — next occurrence of the word under the cursor.
    SearchWordForward,
    /// `#` — previous occurrence of the word under the cursor.
    SearchWordBackward,
    /// `` ` `` — exact position of a mark.
    MarkGoto,
    /// `'` — first non-blank of the mark's line.
    MarkGotoLine,
    /// `<C-o>` — older jump list entry. Resolved by the dispatcher.
    JumplistPrev,
    /// `<C-i>` — newer jump list entry. Resolved by the dispatcher.
    JumplistNext,
    /// `g;` — older change list entry. Resolved by the dispatcher.
    ChangelistPrev,
    /// `g,` — newer change list entry. Resolved by the dispatcher.
    ChangelistNext,
    /// No movement. Gives put and friends an empty range to "operate" on.
    Nop,
}

bitflags! {
    /// Behavior flags of a motion kind.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MotionFlags: u8 {
        const LINEWISE   = 1 << 0;
        const INCLUSIVE  = 1 << 1;
        const JUMP       = 1 << 2;
        const IDEMPOTENT = 1 << 3;
    }
}

impl MotionKind {
    /// The behavior flags of this kind.
    #[must_use]
    pub const fn flags(self) -> MotionFlags {
        use MotionKind::*;
        match self {
            LineUp | LineDown | LineNext => MotionFlags::LINEWISE,
            Line | FileBegin | FileEnd => {
                MotionFlags::LINEWISE.union(MotionFlags::JUMP)
            }
            WordEndPrev | WordEndNext | LongwordEndPrev | LongwordEndNext | LineFinish
            | ToRight | TillRight => MotionFlags::INCLUSIVE,
            BracketMatch => MotionFlags::INCLUSIVE.union(MotionFlags::JUMP),
            ParagraphPrev | ParagraphNext | SentencePrev | SentenceNext | SearchNext
            | SearchPrev | SearchWordForward | SearchWordBackward | MarkGoto => {
                MotionFlags::JUMP
            }
            MarkGotoLine => MotionFlags::LINEWISE.union(MotionFlags::JUMP),
            JumplistPrev | JumplistNext | ChangelistPrev | ChangelistNext | Nop => {
                MotionFlags::IDEMPOTENT
            }
            _ => MotionFlags::empty(),
        }
    }

    /// The default range kind an operator applies over this motion.
    #[inline]
    #[must_use]
    pub fn default_kind(self) -> TextKind {
        if self.flags().contains(MotionFlags::LINEWISE) {
            TextKind::Linewise
        } else {
            TextKind::Charwise
        }
    }

    /// True for line-vertical motions that keep the sticky column.
    #[inline]
    #[must_use]
    pub const fn is_vertical(self) -> bool {
        matches!(self, Self::LineUp | Self::LineDown)
    }

    /// True for the kinds the dispatcher must resolve before calling
    /// [`target`] (they depend on editor state, not just the text).
    #[inline]
    #[must_use]
    pub const fn needs_resolution(self) -> bool {
        matches!(
            self,
            Self::ToTillRepeat
                | Self::ToTillReverse
                | Self::JumplistPrev
                | Self::JumplistNext
                | Self::ChangelistPrev
                | Self::ChangelistNext
        )
    }

    /// True for the to/till family (the repeatable char searches).
    #[inline]
    #[must_use]
    pub const fn is_totill(self) -> bool {
        matches!(
            self,
            Self::ToRight | Self::ToLeft | Self::TillRight | Self::TillLeft
        )
    }

    /// The opposite-direction to/till kind, for `,`.
    #[must_use]
    pub const fn totill_reversed(self) -> Option<Self> {
        match self {
            Self::ToRight => Some(Self::ToLeft),
            Self::ToLeft => Some(Self::ToRight),
            Self::TillRight => Some(Self::TillLeft),
            Self::TillLeft => Some(Self::TillRight),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// MotionCtx
// ---------------------------------------------------------------------------

/// Arguments a motion may need beyond the buffer and position.
///
/// The dispatcher fills in whichever fields the pending command supplies;
/// motions read only what their kind requires.
#[derive(Debug, Clone, Default)]
pub struct MotionCtx<'a> {
    /// The cursor's remembered column for vertical movement.
    pub sticky_col: usize,
    /// The to/till target character.
    pub char_arg: Option<char>,
    /// The last search pattern and its base direction.
    pub pattern: Option<(&'a str, Direction)>,
    /// A resolved mark position.
    pub mark: Option<Position>,
    /// A numeric argument: 0-indexed line for `Line`, column for `Column`.
    pub num_arg: Option<usize>,
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Compute the target position of a motion.
///
/// Total: always returns a valid position. A motion that cannot move (or a
/// meta kind the dispatcher should have resolved) returns `pos` unchanged.
#[must_use]
pub fn target(kind: MotionKind, buf: &Buffer, pos: Position, ctx: &MotionCtx<'_>) -> Position {
    use MotionKind::*;
    match kind {
        CharPrev => buf.char_prev(pos),
        CharNext => buf.char_next(pos),

        WordStartPrev => word::word_start_prev(buf, pos),
        WordStartNext => word::word_start_next(buf, pos),
        WordEndPrev => word::word_end_prev(buf, pos),
        WordEndNext => word::word_end_next(buf, pos),
        LongwordStartPrev => word::longword_start_prev(buf, pos),
        LongwordStartNext => word::longword_start_next(buf, pos),
        LongwordEndPrev => word::longword_end_prev(buf, pos),
        LongwordEndNext => word::longword_end_next(buf, pos),

        LineUp => vertical(buf, pos, ctx.sticky_col, -1),
        LineDown => vertical(buf, pos, ctx.sticky_col, 1),
        LineNext => {
            if pos.line + 1 < buf.line_count() {
                Position::new(pos.line + 1, 0)
            } else {
                buf.end_position()
            }
        }
        LineBegin => buf.line_begin(pos),
        LineStart => buf.line_start(pos),
        LineFinish => buf.line_finish(pos),
        LineEnd => buf.line_end(pos),
        Line => {
            let line = ctx.num_arg.unwrap_or(0).min(buf.last_line());
            buf.line_start(Position::new(line, 0))
        }
        Column => {
            let col = ctx.num_arg.unwrap_or(0);
            let max = buf.line_content_len(pos.line).unwrap_or(0);
            Position::new(pos.line, col.min(max.saturating_sub(1)))
        }
        FileBegin => buf.line_start(Position::ZERO),
        FileEnd => buf.line_start(Position::new(buf.last_line(), 0)),

        ParagraphPrev => paragraph_prev(buf, pos),
        ParagraphNext => paragraph_next(buf, pos),
        SentencePrev => sentence_prev(buf, pos),
        SentenceNext => sentence_next(buf, pos),

        BracketMatch => bracket_match(buf, pos),

        ToRight => char_find(buf, pos, ctx.char_arg, Direction::Forward, 0),
        ToLeft => char_find(buf, pos, ctx.char_arg, Direction::Backward, 0),
        TillRight => char_find(buf, pos, ctx.char_arg, Direction::Forward, 1),
        TillLeft => char_find(buf, pos, ctx.char_arg, Direction::Backward, 1),

        SearchNext | SearchWordForward => search_step(buf, pos, ctx, false),
        SearchPrev | SearchWordBackward => search_step(buf, pos, ctx, true),

        MarkGoto => ctx.mark.map_or(pos, |m| buf.clamp_position(m)),
        MarkGotoLine => ctx
            .mark
            .map_or(pos, |m| buf.line_start(buf.clamp_position(m))),

        // Meta kinds: resolved by the dispatcher before reaching here.
        ToTillRepeat | ToTillReverse | JumplistPrev | JumplistNext | ChangelistPrev
        | ChangelistNext | Nop => pos,
    }
}

// ---------------------------------------------------------------------------
// Implementations
// ---------------------------------------------------------------------------

/// One line up or down, snapping to the sticky column.
fn vertical(buf: &Buffer, pos: Position, sticky: usize, dir: isize) -> Position {
    let line = if dir < 0 {
        if pos.line == 0 {
            return pos;
        }
        pos.line - 1
    } else {
        if pos.line >= buf.last_line() {
            return pos;
        }
        pos.line + 1
    };
    let max = buf.line_content_len(line).unwrap_or(0);
    Position::new(line, sticky.max(pos.col).min(max))
}

/// `f`/`F`/`t`/`T` — find a character on the current line.
///
/// `back_off` is 0 for "to" (land on the char) and 1 for "till" (stop one
/// short of it). Returns `pos` when the character does not occur.
fn char_find(
    buf: &Buffer,
    pos: Position,
    target: Option<char>,
    dir: Direction,
    back_off: usize,
) -> Position {
    let Some(target) = target else { return pos };
    let Some(line) = buf.line(pos.line) else {
        return pos;
    };
    let content = buf.line_content_len(pos.line).unwrap_or(0);

    match dir {
        Direction::Forward => {
            let mut col = pos.col + 1;
            while col < content {
                if line.char(col) == target {
                    return Position::new(pos.line, col - back_off);
                }
                col += 1;
            }
            pos
        }
        Direction::Backward => {
            let mut col = pos.col;
            while col > 0 {
                col -= 1;
                if line.char(col) == target {
                    return Position::new(pos.line, col + back_off);
                }
            }
            pos
        }
    }
}

/// `n`/`N` — step to the next/previous match of the last pattern.
fn search_step(buf: &Buffer, pos: Position, ctx: &MotionCtx<'_>, reverse: bool) -> Position {
    let Some((pattern, base_dir)) = ctx.pattern else {
        return pos;
    };
    let dir = if reverse { base_dir.opposite() } else { base_dir };
    let m = match dir {
        Direction::Forward => search::find_forward(buf, pattern, buf.char_next(pos)),
        Direction::Backward => {
            // Step off the current position; wrap explicitly at the start.
            let from = if pos == Position::ZERO {
                buf.end_position()
            } else {
                buf.char_prev(pos)
            };
            search::find_backward(buf, pattern, from)
        }
    };
    m.map_or(pos, |m| m.start)
}

/// `%` — jump between matching brackets.
fn bracket_match(buf: &Buffer, pos: Position) -> Position {
    const PAIRS: [(char, char); 4] = [('(', ')'), ('[', ']'), ('{', '}'), ('<', '>')];
    let Some(ch) = buf.char_at(pos) else { return pos };
    let Some(idx) = buf.pos_to_char_idx(pos) else {
        return pos;
    };
    let rope = buf.rope();
    for (open, close) in PAIRS {
        if ch == open {
            if let Some(m) = find_closing(rope, idx, rope.len_chars(), open, close) {
                return buf.char_idx_to_pos(m).unwrap_or(pos);
            }
        } else if ch == close {
            if let Some(m) = find_opening(rope, idx, open, close) {
                return buf.char_idx_to_pos(m).unwrap_or(pos);
            }
        }
    }
    pos
}

/// True when a line has no content characters.
fn line_is_blank(buf: &Buffer, line: usize) -> bool {
    buf.line_content_len(line) == Some(0)
}

/// `}` — forward to the next blank line after the current paragraph, or the
/// end of the buffer.
fn paragraph_next(buf: &Buffer, pos: Position) -> Position {
    let last = buf.last_line();
    let mut line = pos.line;
    // Leave a blank run first so repeated `}` makes progress.
    while line < last && line_is_blank(buf, line) {
        line += 1;
    }
    while line < last && !line_is_blank(buf, line) {
        line += 1;
    }
    if line_is_blank(buf, line) {
        Position::new(line, 0)
    } else {
        buf.end_position()
    }
}

/// `{` — backward to the previous blank line, or the start of the buffer.
fn paragraph_prev(buf: &Buffer, pos: Position) -> Position {
    let mut line = pos.line;
    // Leave the blank run the cursor may be on so repeated `{` makes
    // progress.
    while line > 0 && line_is_blank(buf, line) {
        line -= 1;
    }
    while line > 0 {
        line -= 1;
        if line_is_blank(buf, line) {
            return Position::new(line, 0);
        }
    }
    Position::ZERO
}

/// True when the char at `idx` ends a sentence: a terminator possibly
/// followed by closing quotes/brackets, then whitespace or end of text.
pub(crate) fn is_sentence_end(rope: &ropey::Rope, idx: usize) -> bool {
    if !matches!(rope.char(idx), '.' | '!' | '?') {
        return false;
    }
    let total = rope.len_chars();
    let mut i = idx + 1;
    while i < total && matches!(rope.char(i), ')' | ']' | '"' | '\'') {
        i += 1;
    }
    i >= total || rope.char(i).is_whitespace()
}

/// Char indices where sentences start: the first non-whitespace character of
/// the text, and the first non-whitespace character after each sentence end.
pub(crate) fn sentence_starts(rope: &ropey::Rope) -> Vec<usize> {
    let total = rope.len_chars();
    let mut starts = Vec::new();

    let mut i = 0;
    while i < total && rope.char(i).is_whitespace() {
        i += 1;
    }
    if i < total {
        starts.push(i);
    }

    let mut i = 0;
    while i < total {
        if is_sentence_end(rope, i) {
            let mut j = i + 1;
            while j < total && matches!(rope.char(j), ')' | ']' | '"' | '\'') {
                j += 1;
            }
            while j < total && rope.char(j).is_whitespace() {
                j += 1;
            }
            if j < total && starts.last() != Some(&j) {
                starts.push(j);
            }
            i = j.max(i + 1);
        } else {
            i += 1;
        }
    }
    starts
}

/// `)` — forward to the start of the next sentence, or the end of the buffer
/// from the last sentence.
fn sentence_next(buf: &Buffer, pos: Position) -> Position {
    let rope = buf.rope();
    let Some(idx) = buf.pos_to_char_idx(pos) else {
        return buf.clamp_position(pos);
    };
    match sentence_starts(rope).iter().find(|&&s| s > idx) {
        Some(&s) => buf.char_idx_to_pos(s).unwrap_or(pos),
        None if rope.len_chars() > 0 => buf.end_position(),
        None => pos,
    }
}

/// `(` — backward to the start of the current sentence, or the previous one
/// when already at a sentence start.
fn sentence_prev(buf: &Buffer, pos: Position) -> Position {
    let rope = buf.rope();
    let Some(idx) = buf.pos_to_char_idx(pos) else {
        return buf.clamp_position(pos);
    };
    match sentence_starts(rope).iter().rev().find(|&&s| s < idx) {
        Some(&s) => buf.char_idx_to_pos(s).unwrap_or(pos),
        None => pos,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
