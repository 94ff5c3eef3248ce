//! Operator implementations.
//!
//! An operator consumes a range and mutates the buffer over it. The
//! dispatcher computes one range per cursor (see [`crate::dispatch`]) and
//! calls [`apply`] once per cursor, in descending range order so earlier
//! positions stay valid while edits land.
//!
//! Every buffer mutation goes through [`EditScope`], which records the edit
//! in the history transaction and migrates marks — an operator execution is
//! exactly one undoable snapshot, delimited by the dispatcher.

use crate::buffer::Buffer;
use crate::history::{end_after_insert, History};
use crate::mark::MarkStore;
use crate::position::{Position, Range, TextKind};

// ---------------------------------------------------------------------------
// OpKind
// ---------------------------------------------------------------------------

/// Every operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// `c` — delete the range and enter insert mode.
    Change,
    /// `d` — delete the range into a register.
    Delete,
    /// `y` — copy the range into a register.
    Yank,
    /// `<` — dedent the covered lines.
    ShiftLeft,
    /// `>` — indent the covered lines.
    ShiftRight,
    /// `gu` — lowercase the range.
    CaseLower,
    /// `gU` — uppercase the range.
    CaseUpper,
    /// `g~` — swap the case of the range.
    CaseSwap,
    /// `J` — join the covered lines.
    Join,
    /// `p` — put register text after the cursor.
    PutAfter,
    /// `P` — put register text before the cursor.
    PutBefore,
    /// `gp` — put after, cursor after the new text.
    PutAfterEnd,
    /// `gP` — put before, cursor after the new text.
    PutBeforeEnd,
    /// Create a cursor at the start of every covered line.
    CursorSol,
    /// Create a cursor at the end of every covered line.
    CursorEol,
    /// Internal: replay the last insertion (repeat of insert mode).
    RepeatInsert,
    /// Internal: replay the last replacement (repeat of `r`).
    RepeatReplace,
}

impl OpKind {
    /// True for the put family, which needs no motion — it executes over an
    /// empty range at the cursor.
    #[inline]
    #[must_use]
    pub const fn is_put(self) -> bool {
        matches!(
            self,
            Self::PutAfter | Self::PutBefore | Self::PutAfterEnd | Self::PutBeforeEnd
        )
    }

    /// True for operators that execute on an empty range at the cursor
    /// without a motion.
    #[inline]
    #[must_use]
    pub const fn is_rangeless(self) -> bool {
        self.is_put() || matches!(self, Self::RepeatInsert | Self::RepeatReplace)
    }

    /// True for operators that capture the range into a register.
    #[inline]
    #[must_use]
    pub const fn writes_register(self) -> bool {
        matches!(self, Self::Change | Self::Delete | Self::Yank)
    }
}

// ---------------------------------------------------------------------------
// EditScope
// ---------------------------------------------------------------------------

/// The mutable state an operator touches: buffer, open history transaction,
/// marks, and a set of *tracked positions* (cursor landing spots computed by
/// earlier fan-out steps) that migrate through edits exactly like marks.
/// Mutations route through here so none of them can fall out of sync with
/// the text.
pub(crate) struct EditScope<'a> {
    pub buf: &'a mut Buffer,
    pub history: &'a mut History,
    pub marks: &'a mut MarkStore,
    pub tracked: &'a mut Vec<Position>,
}

impl EditScope<'_> {
    /// Delete a range, returning the removed text.
    pub(crate) fn delete(&mut self, range: Range) -> String {
        let text = self.buf.slice_string(range);
        if !text.is_empty() {
            self.history.record_delete(range.start, &text);
            self.buf.delete(range);
            self.marks.adjust_delete(range);
            for pos in self.tracked.iter_mut() {
                *pos = crate::mark::shift_delete(*pos, range).unwrap_or(range.start);
            }
        }
        text
    }

    /// Insert text, returning the position just past it.
    pub(crate) fn insert(&mut self, pos: Position, text: &str) -> Position {
        if text.is_empty() {
            return pos;
        }
        self.buf.insert(pos, text);
        self.history.record_insert(pos, text);
        let end = end_after_insert(pos, text);
        self.marks.adjust_insert(pos, end);
        for tracked in self.tracked.iter_mut() {
            *tracked = crate::mark::shift_insert(*tracked, pos, end);
        }
        end
    }

    /// Replace the single character under `pos` with `text` (which may be a
    /// multi-byte rune). At a line end or in an empty buffer the text is
    /// inserted without removing anything.
    pub(crate) fn replace_char(&mut self, pos: Position, text: &str) -> Position {
        let content = self.buf.line_content_len(pos.line).unwrap_or(0);
        if pos.col < content {
            self.delete(Range::new(pos, Position::new(pos.line, pos.col + 1)));
        }
        self.insert(pos, text);
        pos
    }

    /// Overwrite the characters under `pos` with `text`, replace-mode style:
    /// existing characters up to the end of the line are consumed, then the
    /// remainder is inserted.
    pub(crate) fn overwrite(&mut self, pos: Position, text: &str) -> Position {
        let content = self.buf.line_content_len(pos.line).unwrap_or(0);
        let covered = text.chars().filter(|ch| *ch != '\n' && *ch != '\r').count();
        let end_col = (pos.col + covered).min(content);
        if end_col > pos.col {
            self.delete(Range::new(pos, Position::new(pos.line, end_col)));
        }
        self.insert(pos, text)
    }
}

// ---------------------------------------------------------------------------
// OpCtx / OpOutcome
// ---------------------------------------------------------------------------

/// Per-cursor execution context.
#[derive(Debug)]
pub(crate) struct OpCtx<'a> {
    /// Effective count of the command.
    pub count: u32,
    /// The cursor's position before the operator ran.
    pub pos: Position,
    /// The range to operate on (already linewise-expanded when applicable).
    pub range: Range,
    /// Whether the operation is linewise.
    pub linewise: bool,
    /// Text to put (this cursor's slice for a multi-put).
    pub put_text: &'a str,
    /// Kind of the register being put.
    pub put_kind: TextKind,
    /// The repeat buffer, for the internal repeat operators.
    pub repeat_text: &'a str,
}

/// What an operator did for one cursor.
#[derive(Debug, Default)]
pub(crate) struct OpOutcome {
    /// Where the cursor lands; `None` disposes it (cursor-creating ops).
    pub pos: Option<Position>,
    /// Text captured for the register (delete/change/yank).
    pub captured: Option<String>,
    /// Cursors to create (cursor-sol/eol).
    pub new_cursors: Vec<Position>,
}

/// Run one operator for one cursor.
pub(crate) fn apply(kind: OpKind, scope: &mut EditScope<'_>, ctx: &OpCtx<'_>) -> OpOutcome {
    match kind {
        OpKind::Delete => op_delete(scope, ctx),
        OpKind::Change => op_change(scope, ctx),
        OpKind::Yank => OpOutcome {
            pos: Some(scope.buf.clamp_position(ctx.pos)),
            captured: Some(yank_text(scope.buf, ctx)),
            new_cursors: Vec::new(),
        },
        OpKind::ShiftRight => op_shift(scope, ctx, true),
        OpKind::ShiftLeft => op_shift(scope, ctx, false),
        OpKind::CaseLower | OpKind::CaseUpper | OpKind::CaseSwap => op_case(kind, scope, ctx),
        OpKind::Join => op_join(scope, ctx),
        OpKind::PutAfter | OpKind::PutBefore | OpKind::PutAfterEnd | OpKind::PutBeforeEnd => {
            op_put(kind, scope, ctx)
        }
        OpKind::CursorSol | OpKind::CursorEol => op_cursor(kind, scope, ctx),
        OpKind::RepeatInsert => {
            let end = scope.insert(ctx.pos, ctx.repeat_text);
            OpOutcome { pos: Some(end), ..Default::default() }
        }
        OpKind::RepeatReplace => {
            let end = scope.overwrite(ctx.pos, ctx.repeat_text);
            let pos = scope.buf.clamp_position(scope.buf.char_prev(end));
            OpOutcome { pos: Some(pos), ..Default::default() }
        }
    }
}

// ---------------------------------------------------------------------------
// Implementations
// ---------------------------------------------------------------------------

/// The register image of a range: linewise captures always end in a newline.
fn yank_text(buf: &Buffer, ctx: &OpCtx<'_>) -> String {
    let mut text = buf.slice_string(ctx.range);
    if ctx.linewise && !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

fn op_delete(scope: &mut EditScope<'_>, ctx: &OpCtx<'_>) -> OpOutcome {
    let captured = yank_text(scope.buf, ctx);

    let mut range = ctx.range;
    // Deleting the last lines of the buffer also takes the newline that
    // preceded them; otherwise a dangling empty line is left behind.
    if ctx.linewise
        && range.end == scope.buf.end_position()
        && range.start.col == 0
        && range.start.line > 0
    {
        let prev = range.start.line - 1;
        range.start = Position::new(prev, scope.buf.line_content_len(prev).unwrap_or(0));
    }

    scope.delete(range);

    let landing = scope.buf.clamp_position(ctx.range.start);
    let pos = if ctx.linewise {
        scope.buf.line_start(scope.buf.clamp_position(Position::new(ctx.range.start.line, 0)))
    } else {
        landing
    };
    OpOutcome {
        pos: Some(pos),
        captured: Some(captured),
        new_cursors: Vec::new(),
    }
}

/// Change deletes like `d` but keeps the line break of a linewise range:
/// the line is opened for typing, not joined away.
fn op_change(scope: &mut EditScope<'_>, ctx: &OpCtx<'_>) -> OpOutcome {
    let mut range = ctx.range;
    if ctx.linewise && range.end.col == 0 && range.end.line > range.start.line {
        let last = range.end.line - 1;
        range.end = Position::new(last, scope.buf.line_content_len(last).unwrap_or(0));
    }

    let mut captured = scope.buf.slice_string(range);
    if ctx.linewise && !captured.ends_with('\n') {
        captured.push('\n');
    }
    scope.delete(range);

    OpOutcome {
        pos: Some(scope.buf.clamp_position(range.start)),
        captured: Some(captured),
        new_cursors: Vec::new(),
    }
}

/// The lines a range covers. An exclusive end at column 0 does not pull in
/// the following line.
fn covered_lines(range: Range) -> std::ops::RangeInclusive<usize> {
    let end_line = if range.end.col == 0 && range.end.line > range.start.line {
        range.end.line - 1
    } else {
        range.end.line
    };
    range.start.line..=end_line
}

fn op_shift(scope: &mut EditScope<'_>, ctx: &OpCtx<'_>, right: bool) -> OpOutcome {
    const TAB_WIDTH: usize = 8;

    for line in covered_lines(ctx.range) {
        let begin = Position::new(line, 0);
        if right {
            scope.insert(begin, "\t");
        } else {
            let Some(slice) = scope.buf.line(line) else { continue };
            let content = scope.buf.line_content_len(line).unwrap_or(0);
            let remove = if content > 0 && slice.char(0) == '\t' {
                1
            } else {
                let spaces = slice
                    .chars()
                    .take(content)
                    .take_while(|&ch| ch == ' ')
                    .count();
                spaces.min(TAB_WIDTH)
            };
            if remove > 0 {
                scope.delete(Range::new(begin, Position::new(line, remove)));
            }
        }
    }

    let pos = scope.buf.line_start(scope.buf.clamp_position(ctx.pos));
    OpOutcome { pos: Some(pos), ..Default::default() }
}

fn op_case(kind: OpKind, scope: &mut EditScope<'_>, ctx: &OpCtx<'_>) -> OpOutcome {
    let text = scope.buf.slice_string(ctx.range);
    let mapped: String = text
        .chars()
        .map(|ch| {
            if !ch.is_ascii() {
                return ch;
            }
            match kind {
                OpKind::CaseUpper => ch.to_ascii_uppercase(),
                OpKind::CaseLower => ch.to_ascii_lowercase(),
                _ => {
                    if ch.is_ascii_lowercase() {
                        ch.to_ascii_uppercase()
                    } else {
                        ch.to_ascii_lowercase()
                    }
                }
            }
        })
        .collect();

    if mapped != text {
        scope.delete(ctx.range);
        scope.insert(ctx.range.start, &mapped);
    }
    OpOutcome {
        pos: Some(scope.buf.clamp_position(ctx.range.start)),
        ..Default::default()
    }
}

fn op_join(scope: &mut EditScope<'_>, ctx: &OpCtx<'_>) -> OpOutcome {
    let lines = covered_lines(ctx.range);
    let (first, last) = (*lines.start(), *lines.end());
    // Joining a single-line range still joins one line break.
    let joins = (last - first).max(1);

    let seam = Position::new(first, scope.buf.line_content_len(first).unwrap_or(0));

    for _ in 0..joins {
        if first + 1 >= scope.buf.line_count() {
            break;
        }
        let eol = Position::new(first, scope.buf.line_content_len(first).unwrap_or(0));
        let next_start = scope.buf.line_start(Position::new(first + 1, 0));
        let next_content = scope.buf.line_content_len(first + 1).unwrap_or(0);
        scope.delete(Range::new(eol, next_start));
        if next_content > 0 && eol.col > 0 {
            scope.insert(eol, " ");
        }
    }

    OpOutcome {
        pos: Some(scope.buf.clamp_position(seam)),
        ..Default::default()
    }
}

fn op_put(kind: OpKind, scope: &mut EditScope<'_>, ctx: &OpCtx<'_>) -> OpOutcome {
    if ctx.put_text.is_empty() {
        return OpOutcome { pos: Some(ctx.pos), ..Default::default() };
    }
    let linewise = ctx.put_kind.is_linewise();
    let before = matches!(kind, OpKind::PutBefore | OpKind::PutBeforeEnd);
    let to_end = matches!(kind, OpKind::PutAfterEnd | OpKind::PutBeforeEnd);

    let mut text = ctx.put_text.to_string();
    let mut at = ctx.pos;
    // First line of the inserted text, for the linewise landing position.
    let mut first_new_line = ctx.pos.line;

    if linewise {
        if !text.ends_with('\n') {
            text.push('\n');
        }
        if before {
            at = Position::new(ctx.pos.line, 0);
            first_new_line = at.line;
        } else if ctx.pos.line + 1 < scope.buf.line_count() {
            at = Position::new(ctx.pos.line + 1, 0);
            first_new_line = at.line;
        } else {
            // Putting below the last line: the break goes in front.
            at = scope.buf.end_position();
            text = format!("\n{}", text.trim_end_matches('\n'));
            first_new_line = at.line + 1;
        }
    } else {
        let content = scope.buf.line_content_len(ctx.pos.line).unwrap_or(0);
        if !before {
            at = Position::new(ctx.pos.line, (ctx.pos.col + 1).min(content));
        }
    }

    let mut end = at;
    for _ in 0..ctx.count.max(1) {
        end = scope.insert(end, &text);
    }

    let pos = if linewise {
        if to_end {
            scope.buf.line_start(scope.buf.clamp_position(end))
        } else {
            scope.buf.line_start(scope.buf.clamp_position(Position::new(first_new_line, 0)))
        }
    } else if to_end {
        scope.buf.clamp_position(end)
    } else {
        // On the last character of the inserted text.
        scope.buf.clamp_position(scope.buf.char_prev(end))
    };

    OpOutcome { pos: Some(pos), ..Default::default() }
}

fn op_cursor(kind: OpKind, scope: &mut EditScope<'_>, ctx: &OpCtx<'_>) -> OpOutcome {
    let mut new_cursors = Vec::new();
    for line in covered_lines(ctx.range) {
        let pos = if kind == OpKind::CursorEol {
            scope.buf.line_finish(Position::new(line, 0))
        } else {
            scope.buf.line_start(Position::new(line, 0))
        };
        new_cursors.push(pos);
    }
    OpOutcome { pos: None, captured: None, new_cursors }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
