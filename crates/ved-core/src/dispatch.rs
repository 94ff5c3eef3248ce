//! The command builder and fan-out executor.
//!
//! The dispatcher accumulates a [`Pending`] command — counts, register,
//! operator, kind override — while keystrokes arrive, and executes it once
//! the grammar is satisfied:
//!
//! ```text
//! command := count? register? (
//!               motion
//!             | textobject                  (only after an operator)
//!             | operator count? (motion | textobject | operator)
//!             | action
//!           )
//! ```
//!
//! Counts *multiply* across the operator boundary: `2d3w` deletes six
//! words. Doubling an operator (`dd`) applies it to whole lines. Typing an
//! operator in a visual mode executes immediately with the selection as the
//! range.
//!
//! Execution fans out over the cursor set: the motion or text object is
//! computed at every cursor, and the resulting ranges are applied in
//! **descending** start order; positions computed earlier migrate through
//! later edits like marks (see [`EditScope`]). One execution is exactly one
//! undo snapshot. After a successful execution the command is captured in
//! the repeat slot for `.`.

use tracing::debug;

use crate::cursor::Cursor;
use crate::error::{EditError, EditResult};
use crate::editor::Editor;
use crate::mode::ModeId;
use crate::motion::{self, MotionCtx, MotionFlags, MotionKind};
use crate::op::{self, EditScope, OpCtx, OpKind};
use crate::position::{Position, Range, TextKind};
use crate::register::RegisterId;
use crate::search::{self, Direction};
use crate::textobject::{self, TextObjectKind};

// ---------------------------------------------------------------------------
// Pending
// ---------------------------------------------------------------------------

/// The command being built up, one keystroke at a time.
#[derive(Debug, Default)]
pub(crate) struct Pending {
    /// Digits typed before the operator.
    pub count_pre: u32,
    /// Digits typed after the operator.
    pub count_post: u32,
    /// Register selected with `"x`, plus the uppercase append flag.
    pub register: Option<(RegisterId, bool)>,
    /// The armed operator.
    pub op: Option<OpKind>,
    /// `v`/`V` in operator-pending mode.
    pub kind_override: Option<TextKind>,
    /// The resolved position of a pending mark motion.
    pub mark_pos: Option<Position>,
}

impl Pending {
    /// Discard everything.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// The effective count: both counts multiplied, each defaulting to 1.
    pub fn effective_count(&self) -> u32 {
        self.count_pre.max(1) * self.count_post.max(1)
    }

    /// Whether any count digit was typed.
    pub fn count_given(&self) -> bool {
        self.count_pre > 0 || self.count_post > 0
    }

    /// The count a new digit would extend (pre- or post-operator).
    pub fn digit_slot(&self) -> u32 {
        if self.op.is_some() {
            self.count_post
        } else {
            self.count_pre
        }
    }

    /// Multiply-accumulate a digit into the active count.
    pub fn push_digit(&mut self, digit: u32) {
        let slot = if self.op.is_some() {
            &mut self.count_post
        } else {
            &mut self.count_pre
        };
        *slot = slot.saturating_mul(10).saturating_add(digit);
    }
}

// ---------------------------------------------------------------------------
// Target & repeat slot
// ---------------------------------------------------------------------------

/// What the pending command executes over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Target {
    /// A motion, with the to/till character when one was consumed.
    Motion(MotionKind, Option<char>),
    /// A text object.
    TextObject(TextObjectKind),
    /// `count` whole lines from the cursor — doubled operators and `J`.
    CurrentLines,
    /// An empty range at the cursor — puts and the repeat operators.
    Rangeless,
    /// The visual selection.
    Visual,
}

/// A completed command, replayable with `.`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RepeatSlot {
    pub count_pre: u32,
    pub count_post: u32,
    pub register: Option<(RegisterId, bool)>,
    pub op: OpKind,
    pub kind_override: Option<TextKind>,
    pub target: Target,
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// One cursor's computed range, in fan-out order.
struct Slot {
    /// Cursor index in the (ascending) cursor set.
    cursor: usize,
    /// Ascending rank among the valid slots, for register slices.
    rank: usize,
    pos: Position,
    range: Range,
}

impl Editor {
    /// Execute the pending command over `target`. The pending state is
    /// consumed regardless of the outcome.
    pub(crate) fn execute(&mut self, target: Target) -> EditResult {
        let result = self.execute_inner(target);
        self.pending.clear();
        if result.is_err() && self.mode == ModeId::Operator {
            // A failed command leaves no operator pending.
            let back = self.mode_prev;
            self.mode_set(back);
        }
        if result.is_ok() {
            self.ui.draw();
        }
        result
    }

    fn execute_inner(&mut self, target: Target) -> EditResult {
        let target = self.resolve_target(target)?;
        let Some(target) = target else {
            return Ok(()); // resolved to a completed state-walk (jump lists)
        };

        debug!(?target, op = ?self.pending.op, count = self.pending.effective_count(), "execute");

        match self.pending.op {
            None => self.execute_movement(target),
            Some(op) => self.execute_operator(op, target),
        }
    }

    /// Resolve meta motions that depend on editor state. Returns `None`
    /// when the target was fully handled here.
    fn resolve_target(&mut self, target: Target) -> EditResult<Option<Target>> {
        let Target::Motion(kind, ch) = target else {
            return Ok(Some(target));
        };

        let resolved = match kind {
            MotionKind::ToTillRepeat => match self.last_totill {
                Some((k, c)) => Target::Motion(k, Some(c)),
                None => return Ok(None),
            },
            MotionKind::ToTillReverse => match self.last_totill {
                Some((k, c)) => Target::Motion(k.totill_reversed().unwrap_or(k), Some(c)),
                None => return Ok(None),
            },
            MotionKind::JumplistPrev
            | MotionKind::JumplistNext
            | MotionKind::ChangelistPrev
            | MotionKind::ChangelistNext => {
                self.list_motion(kind);
                return Ok(None);
            }
            MotionKind::SearchWordForward | MotionKind::SearchWordBackward => {
                let pos = self.view.primary().position();
                let Some(word) = search::word_at(&self.buffer, pos) else {
                    return Err(EditError::InvalidInput("no word under cursor".into()));
                };
                let dir = if kind == MotionKind::SearchWordForward {
                    Direction::Forward
                } else {
                    Direction::Backward
                };
                self.set_search_pattern(word, dir);
                Target::Motion(MotionKind::SearchNext, None)
            }
            MotionKind::SearchNext | MotionKind::SearchPrev => {
                if self.last_search.is_none() {
                    return Err(EditError::NoSearchPattern);
                }
                target
            }
            _ => {
                if kind.is_totill() {
                    if let Some(c) = ch {
                        self.last_totill = Some((kind, c));
                    }
                }
                target
            }
        };
        Ok(Some(resolved))
    }

    /// Walk the jump or change list on the primary cursor.
    fn list_motion(&mut self, kind: MotionKind) {
        let cur = self.view.primary().position();
        let dest = match kind {
            MotionKind::JumplistPrev => self.jumps.back(cur),
            MotionKind::JumplistNext => self.jumps.forward(),
            MotionKind::ChangelistPrev => self.changes.back(),
            MotionKind::ChangelistNext => self.changes.forward(),
            _ => None,
        };
        if let Some(pos) = dest {
            let past_end = self.mode.cursor_past_end();
            self.view.primary_mut().set_position(pos, &self.buffer, past_end);
            self.view.ensure_visible(&self.buffer);
        }
    }

    /// Whether the effective range kind is linewise.
    fn is_linewise(&self, target: Target) -> bool {
        if matches!(target, Target::Visual) && self.mode == ModeId::VisualLine {
            return true;
        }
        if let Some(kind) = self.pending.kind_override {
            return kind.is_linewise();
        }
        match target {
            Target::Motion(kind, _) => kind.default_kind().is_linewise(),
            Target::CurrentLines => true,
            _ => false,
        }
    }

    /// The numeric argument a motion takes from the count, and the number
    /// of times the motion loop runs.
    fn count_args(&self, kind: MotionKind, count: u32) -> (u32, Option<usize>) {
        match kind {
            MotionKind::Line | MotionKind::Column => {
                (1, Some(count.saturating_sub(1) as usize))
            }
            _ => (count, None),
        }
    }

    /// Run a motion or text object over every cursor with no operator:
    /// plain cursor movement, or selection adjustment in visual modes.
    fn execute_movement(&mut self, target: Target) -> EditResult {
        let count = self.pending.effective_count();
        let past_end = self.mode.cursor_past_end();

        match target {
            Target::Motion(kind, ch) => {
                if kind.flags().contains(MotionFlags::JUMP) {
                    self.jumps.push(self.view.primary().position());
                }
                let pattern = self.last_search.clone();
                let mark = self.pending.mark_pos;
                let (loops, num_arg) = self.count_args(kind, count);

                for idx in 0..self.view.cursor_count() {
                    let cursor = &self.view.cursors()[idx];
                    let mut pos = cursor.position();
                    let ctx = MotionCtx {
                        sticky_col: cursor.sticky_col(),
                        char_arg: ch,
                        pattern: pattern.as_ref().map(|(p, d)| (p.as_str(), *d)),
                        mark,
                        num_arg,
                    };
                    for _ in 0..loops.max(1) {
                        let next = motion::target(kind, &self.buffer, pos, &ctx);
                        if next == pos {
                            break;
                        }
                        pos = next;
                        if kind.flags().contains(MotionFlags::IDEMPOTENT) {
                            break;
                        }
                    }
                    let cursor = &mut self.view.cursors_mut()[idx];
                    if kind.is_vertical() {
                        cursor.set_position_vertical(pos, &self.buffer, past_end);
                    } else {
                        cursor.set_position(pos, &self.buffer, past_end);
                    }
                }
                self.view.normalize(&self.buffer, past_end);
                self.view.ensure_visible(&self.buffer);
                Ok(())
            }
            Target::TextObject(kind) => {
                // Without an operator a text object only means something in
                // a visual mode, where it grows the selection.
                if self.mode.is_visual() {
                    for idx in 0..self.view.cursor_count() {
                        let cursor = &self.view.cursors()[idx];
                        let pos = cursor.position();
                        let sel = cursor.selection(&self.buffer);
                        if let Some(r) = textobject::range(kind, &self.buffer, pos) {
                            let merged = sel.map_or(r, |s| s.union(r));
                            self.view.cursors_mut()[idx].selection_set(merged, &self.buffer);
                        }
                    }
                    self.view.normalize(&self.buffer, past_end);
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Fan an operator out over every cursor.
    #[allow(clippy::too_many_lines)]
    fn execute_operator(&mut self, mut op: OpKind, mut target: Target) -> EditResult {
        // `cw` behaves like `ce` — a change never takes the trailing gap.
        if op == OpKind::Change {
            if let Target::Motion(kind, ch) = target {
                let adjusted = match kind {
                    MotionKind::WordStartNext => MotionKind::WordEndNext,
                    MotionKind::LongwordStartNext => MotionKind::LongwordEndNext,
                    other => other,
                };
                target = Target::Motion(adjusted, ch);
            }
        }
        // A change over an empty range is an insert in disguise.
        if op == OpKind::Change && matches!(target, Target::Rangeless) {
            op = OpKind::RepeatInsert;
        }

        let count = self.pending.effective_count();
        let linewise = self.is_linewise(target);
        let slots = self.compute_slots(target, count, linewise);
        if slots.is_empty() {
            return Err(EditError::EmptyRange);
        }

        // The visual selection becomes the saved selection and the `<`/`>`
        // marks once the operator has consumed it.
        let visual_sel = if self.mode.is_visual() {
            self.view
                .primary()
                .anchor()
                .map(|anchor| (anchor, self.view.primary().position()))
        } else {
            None
        };

        // Resolve the register: what put reads, where captures go.
        let reg_sel = self.pending.register;
        let reg_id = reg_sel.map(|(id, _)| id);
        let append = reg_sel.is_some_and(|(_, a)| a);
        let (put_kind, put_slices) = {
            let reg = self.registers.get(reg_id);
            let slices = if reg.slices().len() == slots.len() {
                reg.slices().to_vec()
            } else {
                vec![reg.content().to_string(); slots.len()]
            };
            (reg.kind(), slices)
        };
        let repeat_text = self.repeat_text.clone();

        let group_open = self.history.in_transaction();
        if !group_open {
            self.history.begin(self.view.primary().position());
        }

        // Apply in descending start order; earlier positions stay valid and
        // every landing position computed so far migrates through later
        // edits.
        let mut order: Vec<usize> = (0..slots.len()).collect();
        order.sort_by(|&a, &b| slots[b].range.start.cmp(&slots[a].range.start));

        let mut tracked: Vec<Position> = Vec::new();
        let mut results: Vec<(usize, Option<usize>)> = Vec::new();
        let mut extra_cursor_slots: Vec<usize> = Vec::new();
        let mut captured: Vec<(usize, String)> = Vec::new();

        for &i in &order {
            let slot = &slots[i];
            let ctx = OpCtx {
                count,
                pos: slot.pos,
                range: slot.range,
                linewise,
                put_text: &put_slices[slot.rank],
                put_kind,
                repeat_text: &repeat_text,
            };
            let mut scope = EditScope {
                buf: &mut self.buffer,
                history: &mut self.history,
                marks: &mut self.marks,
                tracked: &mut tracked,
            };
            let out = op::apply(op, &mut scope, &ctx);
            if let Some(text) = out.captured {
                captured.push((slot.rank, text));
            }
            match out.pos {
                Some(pos) => {
                    tracked.push(pos);
                    results.push((slot.cursor, Some(tracked.len() - 1)));
                }
                None => results.push((slot.cursor, None)),
            }
            for pos in out.new_cursors {
                tracked.push(pos);
                extra_cursor_slots.push(tracked.len() - 1);
            }
        }

        if op.writes_register() {
            self.write_captures(reg_id, append, captured, linewise);
        }

        self.rebuild_cursors(&slots, &results, &extra_cursor_slots, &tracked, op);

        if let Some((anchor, head)) = visual_sel {
            let r = Range::ordered(anchor, head);
            self.marks.set(crate::mark::MarkId::SelectionStart, r.start);
            self.marks.set(crate::mark::MarkId::SelectionEnd, r.end);
            self.view.primary_mut().set_saved_selection(anchor, head);
        }

        let had_edits = self.history.pending_has_edits();
        if had_edits {
            self.changes.push(self.view.primary().position());
        }

        if op == OpKind::Change {
            // The deletion and the upcoming insertion undo as one group.
            self.mode_set(ModeId::Insert);
        } else {
            if !group_open {
                self.history.commit(self.view.primary().position());
            }
            if self.mode == ModeId::Operator {
                let back = self.mode_prev;
                self.mode_set(back);
            } else if self.mode.is_visual() {
                self.mode_set(ModeId::Normal);
            }
        }

        if !self.repeating && !group_open && !matches!(target, Target::Visual) {
            self.repeat = Some(RepeatSlot {
                count_pre: self.pending.count_pre,
                count_post: self.pending.count_post,
                register: reg_sel,
                op,
                kind_override: self.pending.kind_override,
                target,
            });
        }

        self.view.ensure_visible(&self.buffer);
        Ok(())
    }

    /// Compute the per-cursor ranges. Cursors whose motion does not move or
    /// whose text object is invalid get no slot.
    fn compute_slots(&self, target: Target, count: u32, linewise: bool) -> Vec<Slot> {
        let pattern = self.last_search.clone();
        let mark = self.pending.mark_pos;
        let mut slots = Vec::new();

        for idx in 0..self.view.cursor_count() {
            let cursor = &self.view.cursors()[idx];
            let pos = cursor.position();

            let computed = match target {
                Target::Motion(kind, ch) => {
                    let ctx = MotionCtx {
                        sticky_col: cursor.sticky_col(),
                        char_arg: ch,
                        pattern: pattern.as_ref().map(|(p, d)| (p.as_str(), *d)),
                        mark,
                        num_arg: self.count_args(kind, count).1,
                    };
                    let (loops, _) = self.count_args(kind, count);
                    let mut end = pos;
                    for _ in 0..loops.max(1) {
                        let next = motion::target(kind, &self.buffer, end, &ctx);
                        if next == end {
                            break;
                        }
                        end = next;
                        if kind.flags().contains(MotionFlags::IDEMPOTENT) {
                            break;
                        }
                    }
                    if end == pos && !matches!(kind, MotionKind::Nop) {
                        None
                    } else {
                        let mut r = Range::ordered(pos, end);
                        if kind.flags().contains(MotionFlags::INCLUSIVE) {
                            r = Range::new(r.start, self.buffer.char_next(r.end));
                        }
                        Some(r)
                    }
                }
                Target::TextObject(kind) => {
                    let mut acc: Option<Range> = None;
                    let mut probe = pos;
                    for _ in 0..count.max(1) {
                        let Some(r) = textobject::range(kind, &self.buffer, probe) else {
                            break;
                        };
                        let merged = acc.map_or(r, |a| a.union(r));
                        probe = merged.end;
                        acc = Some(merged);
                    }
                    acc
                }
                Target::CurrentLines => {
                    let first = pos.line;
                    let last = (first + count.max(1) as usize - 1).min(self.buffer.last_line());
                    let end = if last + 1 < self.buffer.line_count() {
                        Position::new(last + 1, 0)
                    } else {
                        self.buffer.end_position()
                    };
                    Some(Range::new(Position::new(first, 0), end.max(Position::new(first, 0))))
                }
                Target::Rangeless => Some(Range::point(pos)),
                Target::Visual => cursor
                    .selection(&self.buffer)
                    .or(Some(Range::point(pos))),
            };

            if let Some(mut range) = computed {
                if linewise && !matches!(target, Target::CurrentLines) {
                    range = self.buffer.range_linewise(range);
                }
                let rank = slots.len();
                slots.push(Slot { cursor: idx, rank, pos, range });
            }
        }
        slots
    }

    /// Store delete/yank captures in the target register, ascending cursor
    /// order, as slices when more than one cursor contributed.
    fn write_captures(
        &mut self,
        reg_id: Option<RegisterId>,
        append: bool,
        mut captured: Vec<(usize, String)>,
        linewise: bool,
    ) {
        if captured.is_empty() {
            return;
        }
        captured.sort_by_key(|(rank, _)| *rank);
        let kind = if linewise {
            TextKind::Linewise
        } else {
            TextKind::Charwise
        };
        let mut texts: Vec<String> = captured.into_iter().map(|(_, t)| t).collect();
        if texts.len() == 1 {
            self.registers
                .write(reg_id, texts.pop().expect("one capture"), kind, append);
        } else if append {
            let joined = match kind {
                TextKind::Linewise => texts.concat(),
                TextKind::Charwise => texts.join("\n"),
            };
            self.registers.write(reg_id, joined, kind, true);
        } else {
            self.registers.write_slices(reg_id, texts, kind);
        }
    }

    /// Rebuild the cursor set from the operator outcomes: surviving cursors
    /// land on their tracked positions, disposed ones vanish, operator-made
    /// cursors join, and untouched cursors stay put.
    fn rebuild_cursors(
        &mut self,
        slots: &[Slot],
        results: &[(usize, Option<usize>)],
        extra_cursor_slots: &[usize],
        tracked: &[Position],
        op: OpKind,
    ) {
        let past_end = op == OpKind::Change || self.mode.cursor_past_end();
        let old_primary = self.view.primary_index();

        let mut finals: Vec<(Option<usize>, Position)> = Vec::new();
        for &(cursor_idx, slot) in results {
            if let Some(s) = slot {
                finals.push((Some(cursor_idx), tracked[s]));
            }
        }
        // Cursors that had no valid range keep their position.
        for idx in 0..self.view.cursor_count() {
            if !slots.iter().any(|s| s.cursor == idx) {
                finals.push((Some(idx), self.view.cursors()[idx].position()));
            }
        }
        for &s in extra_cursor_slots {
            finals.push((None, tracked[s]));
        }
        if finals.is_empty() {
            finals.push((None, Position::ZERO));
        }

        let primary = finals
            .iter()
            .position(|(idx, _)| *idx == Some(old_primary))
            .unwrap_or(0);
        let cursors: Vec<Cursor> = finals
            .iter()
            .map(|(_, pos)| Cursor::at(self.buffer.clamp_position(*pos)))
            .collect();
        self.view.set_cursors(cursors, primary);
        self.view.normalize(&self.buffer, past_end);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
