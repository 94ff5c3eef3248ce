//! The editor: key dispatch, mode transitions, and the public API.
//!
//! `Editor` owns the buffer, history, cursor set, registers, marks, macros,
//! jump lists, the action table, and the per-mode key maps. Hosts feed key
//! tokens through [`Editor::keys`] (or [`Editor::feed`]); everything else
//! happens inside.
//!
//! # Key dispatch
//!
//! Incoming tokens land in a queue. The dispatcher grows a prefix from the
//! front of the queue and looks it up through the current mode's
//! inheritance chain (first hit wins):
//!
//! - an **exact** binding runs its action, which may consume further tokens
//!   from the queue (register names, to/till characters, …) or report that
//!   it needs more input, in which case the tokens stay buffered;
//! - a **prefix** waits for more input;
//! - a **miss** forwards the tokens to the mode's default input policy —
//!   insert-like modes insert them, the prompt edits its line, normal mode
//!   drops them silently.
//!
//! Macro replay splices the recorded tokens at the head of the queue, so a
//! replay behaves exactly like typing. All state mutation happens on this
//! single dispatch path; actions run to completion before the next token is
//! examined.

use tracing::{debug, trace};

use crate::action::{
    Action, ActionKind, ActionTable, GotoDefault, InsertEntry, ScreenAnchor, ScrollAmount,
    ScrollDir, VerticalDir,
};
use crate::bindings::default_bindings;
use crate::buffer::Buffer;
use crate::cursor::Cursor;
use crate::dispatch::{Pending, RepeatSlot, Target};
use crate::error::{EditError, EditResult};
use crate::history::History;
use crate::jumplist::{ChangeList, JumpList};
use crate::key::{parse_keys, Key};
use crate::keymap::{Binding, KeyMap, Lookup};
use crate::macros::MacroStore;
use crate::mark::{MarkId, MarkStore};
use crate::mode::{InputPolicy, ModeId, MODE_COUNT};
use crate::motion::MotionKind;
use crate::op::{EditScope, OpKind};
use crate::position::{Position, Range, TextKind};
use crate::prompt::Prompt;
use crate::register::RegisterId;
use crate::search::Direction;
use crate::ui::{NullUi, Ui};
use crate::view::View;

/// Outcome of running one action.
enum Flow {
    /// The action completed (or failed recoverably).
    Done,
    /// The action needs more input; keep the keys buffered.
    NeedMore,
}

// ---------------------------------------------------------------------------
// Editor
// ---------------------------------------------------------------------------

/// The editor instance. No globals — hosts carry this value.
pub struct Editor {
    pub(crate) buffer: Buffer,
    pub(crate) history: History,
    pub(crate) view: View,
    pub(crate) registers: crate::register::RegisterFile,
    pub(crate) marks: MarkStore,
    pub(crate) macros: MacroStore,
    pub(crate) jumps: JumpList,
    pub(crate) changes: ChangeList,
    pub(crate) actions: ActionTable,
    pub(crate) keymaps: [KeyMap; MODE_COUNT],

    pub(crate) mode: ModeId,
    /// The previous *user* mode (normal, visual, insert, …).
    pub(crate) mode_prev: ModeId,

    pub(crate) pending: Pending,
    pub(crate) repeat: Option<RepeatSlot>,
    /// The text of the last insertion/replacement, replayed by `.`.
    pub(crate) repeat_text: String,
    /// Where the last insert input ended — a new position starts a fresh
    /// repeat run.
    pub(crate) repeat_anchor: Option<Position>,
    /// Guards against the repeat slot being re-armed while `.` runs.
    pub(crate) repeating: bool,

    pub(crate) last_search: Option<(String, Direction)>,
    pub(crate) last_totill: Option<(MotionKind, char)>,

    pub(crate) prompt: Option<Prompt>,
    /// A submitted `:` line awaiting the host's command parser.
    pub(crate) queued_command: Option<String>,

    /// Buffered, not yet dispatched key tokens.
    pub(crate) queue: Vec<Key>,
    /// One-line message for the UI; `true` marks an error.
    pub(crate) message: Option<(String, bool)>,

    pub(crate) ui: Box<dyn Ui>,
}

impl Editor {
    /// Create an editor over an empty buffer, with the default actions and
    /// bindings and a no-op UI.
    #[must_use]
    pub fn new() -> Self {
        Self::with_buffer(Buffer::new())
    }

    /// Create an editor over the given text.
    #[must_use]
    pub fn with_text(text: &str) -> Self {
        Self::with_buffer(Buffer::from_text(text))
    }

    /// Create an editor over an existing buffer.
    #[must_use]
    pub fn with_buffer(buffer: Buffer) -> Self {
        let mut keymaps: [KeyMap; MODE_COUNT] = Default::default();
        for spec in default_bindings() {
            let binding = if spec.alias {
                Binding::Alias(spec.target)
            } else {
                Binding::Action(spec.target)
            };
            keymaps[spec.mode.index()].bind(&parse_keys(spec.keys), binding);
        }

        Self {
            buffer,
            history: History::new(),
            view: View::new(),
            registers: crate::register::RegisterFile::new(),
            marks: MarkStore::new(),
            macros: MacroStore::new(),
            jumps: JumpList::new(),
            changes: ChangeList::new(),
            actions: ActionTable::with_defaults(),
            keymaps,
            mode: ModeId::Normal,
            mode_prev: ModeId::Normal,
            pending: Pending::default(),
            repeat: None,
            repeat_text: String::new(),
            repeat_anchor: None,
            repeating: false,
            last_search: None,
            last_totill: None,
            prompt: None,
            queued_command: None,
            queue: Vec::new(),
            message: None,
            ui: Box::new(NullUi),
        }
    }

    /// Replace the UI the editor reports to.
    pub fn set_ui(&mut self, ui: Box<dyn Ui>) {
        self.ui = ui;
    }

    // -- Host accessors -------------------------------------------------------

    /// The text buffer.
    #[must_use]
    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// The text buffer, mutably (for host-side file operations).
    pub fn buffer_mut(&mut self) -> &mut Buffer {
        &mut self.buffer
    }

    /// The view (cursor set + scroll state).
    #[must_use]
    pub fn view(&self) -> &View {
        &self.view
    }

    /// The view, mutably (for host-side dimension updates).
    pub fn view_mut(&mut self) -> &mut View {
        &mut self.view
    }

    /// The current mode.
    #[must_use]
    pub fn mode(&self) -> ModeId {
        self.mode
    }

    /// The active prompt, if prompt mode is active.
    #[must_use]
    pub fn prompt(&self) -> Option<&Prompt> {
        self.prompt.as_ref()
    }

    /// The current message line content, with its error flag.
    #[must_use]
    pub fn message(&self) -> Option<(&str, bool)> {
        self.message.as_ref().map(|(m, e)| (m.as_str(), *e))
    }

    /// Show an informational message (host-side command results).
    pub fn set_message(&mut self, text: impl Into<String>) {
        self.message = Some((text.into(), false));
    }

    /// Show an error message.
    pub fn set_error(&mut self, text: impl Into<String>) {
        self.message = Some((text.into(), true));
    }

    /// A `:` line submitted at the prompt, for the host's command parser.
    pub fn take_command(&mut self) -> Option<String> {
        self.queued_command.take()
    }

    /// True while a macro is recording.
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.macros.is_recording()
    }

    // -- Key input ------------------------------------------------------------

    /// Feed a string of keys in the binding symbol grammar (`"dw"`,
    /// `"<Esc>"`). Convenience over [`Editor::feed`].
    pub fn keys(&mut self, input: &str) {
        for key in parse_keys(input) {
            self.feed(key);
        }
    }

    /// Feed one key token.
    pub fn feed(&mut self, key: Key) {
        trace!(%key, mode = %self.mode, "key");
        self.message = None;
        self.macros.push(key);
        self.queue.push(key);
        self.process_queue();
    }

    fn process_queue(&mut self) {
        loop {
            if self.queue.is_empty() {
                return;
            }

            // Grow a prefix from the front of the queue until it resolves.
            let mut n = 1;
            let resolution = loop {
                match self.chain_lookup(&self.queue[..n]) {
                    Lookup::Exact(binding) => break Some(binding.clone()),
                    Lookup::Prefix => {
                        if n == self.queue.len() {
                            return; // wait for more input
                        }
                        n += 1;
                    }
                    Lookup::Miss => break None,
                }
            };

            let seq: Vec<Key> = self.queue.drain(..n).collect();
            match resolution {
                Some(Binding::Action(name)) => {
                    let Some(action) = self.actions.get(name).copied() else {
                        debug!(name, "binding names an unregistered action");
                        continue;
                    };
                    match self.run_action(&action, &seq) {
                        Ok(Flow::Done) => {}
                        Ok(Flow::NeedMore) => {
                            // Put the sequence back and wait.
                            self.queue.splice(0..0, seq);
                            return;
                        }
                        Err(err) => {
                            self.set_error(err.to_string());
                            self.pending.clear();
                            if self.mode == ModeId::Operator {
                                let back = self.mode_prev;
                                self.mode_set(back);
                            }
                        }
                    }
                }
                Some(Binding::Alias(spec)) => {
                    let expansion = parse_keys(spec);
                    self.queue.splice(0..0, expansion);
                }
                None => {
                    self.default_input(&seq);
                }
            }
        }
    }

    /// Look a sequence up through the current mode's inheritance chain.
    /// The first map that matches — or reports a prefix — wins.
    fn chain_lookup(&self, seq: &[Key]) -> Lookup<'_> {
        for mode in self.mode.chain() {
            match self.keymaps[mode.index()].lookup(seq) {
                Lookup::Miss => continue,
                hit => return hit,
            }
        }
        Lookup::Miss
    }

    /// Keys no binding matched, interpreted by the mode's input policy.
    fn default_input(&mut self, keys: &[Key]) {
        match self.mode.input_policy() {
            // Rejected input in normal/visual modes is dropped silently,
            // by design.
            InputPolicy::Drop => {}
            InputPolicy::CancelPending => {
                self.pending.clear();
                let back = self.mode_prev;
                self.mode_set(back);
            }
            InputPolicy::InsertText | InputPolicy::ReplaceText => {
                let overwrite = self.mode.input_policy() == InputPolicy::ReplaceText;
                let text = self.keys_to_text(keys);
                if !text.is_empty() {
                    self.input_text(&text, overwrite);
                }
            }
            InputPolicy::PromptText => {
                if let Some(prompt) = &mut self.prompt {
                    for key in keys {
                        if let Some(ch) = key.char() {
                            prompt.insert_char(ch);
                        }
                    }
                    self.ui.draw();
                }
            }
        }
    }

    /// The text a run of unbound keys inserts.
    fn keys_to_text(&self, keys: &[Key]) -> String {
        let mut text = String::new();
        for key in keys {
            match key {
                Key::Char(ch) => text.push(*ch),
                Key::Enter => text.push_str(self.buffer.line_ending().as_str()),
                Key::Tab => text.push('\t'),
                _ => {}
            }
        }
        text
    }

    // -- Mode transitions -----------------------------------------------------

    /// Switch modes, running leave/enter hooks.
    pub(crate) fn mode_set(&mut self, new: ModeId) {
        if new == self.mode {
            return;
        }
        let old = self.mode;
        debug!(%old, %new, "mode switch");

        // Leave hooks.
        if matches!(old, ModeId::Insert | ModeId::Replace) {
            // The whole insert is one undoable group.
            if self.history.in_transaction() {
                self.history.commit(self.view.primary().position());
            }
            if !self.repeat_text.is_empty() {
                let op = if old == ModeId::Insert {
                    OpKind::RepeatInsert
                } else {
                    OpKind::RepeatReplace
                };
                self.repeat = Some(RepeatSlot {
                    count_pre: 0,
                    count_post: 0,
                    register: None,
                    op,
                    kind_override: None,
                    target: Target::Rangeless,
                });
            }
            // Step off the past-end column.
            for idx in 0..self.view.cursor_count() {
                let pos = self.view.cursors()[idx].position();
                let target = Position::new(pos.line, pos.col.saturating_sub(1));
                self.view.cursors_mut()[idx].set_position(target, &self.buffer, false);
            }
            self.view.normalize(&self.buffer, false);
        } else if old.is_visual() && !new.is_visual() && new != ModeId::Prompt {
            if let Some(anchor) = self.view.primary().anchor() {
                let head = self.view.primary().position();
                let r = Range::ordered(anchor, head);
                self.marks.set(MarkId::SelectionStart, r.start);
                self.marks.set(MarkId::SelectionEnd, r.end);
            }
            for cursor in self.view.cursors_mut() {
                cursor.selection_clear();
            }
        } else if old == ModeId::Prompt {
            self.prompt = None;
            self.ui.prompt_hide();
        }

        if old.is_user() {
            self.mode_prev = old;
        }
        self.mode = new;

        // Enter hooks.
        match new {
            ModeId::Insert | ModeId::Replace => {
                if !self.history.in_transaction() {
                    self.history.begin(self.view.primary().position());
                }
                self.repeat_text.clear();
                self.repeat_anchor = None;
            }
            ModeId::Visual | ModeId::VisualLine => {
                for cursor in self.view.cursors_mut() {
                    if !cursor.has_selection() {
                        cursor.selection_start();
                    }
                }
            }
            ModeId::Prompt => {
                if let Some(prompt) = &self.prompt {
                    let leader = prompt.leader();
                    let preset = prompt.line().to_string();
                    self.ui.prompt_show(leader, &preset);
                }
            }
            _ => {}
        }
        self.ui.draw();
    }

    // -- Action execution -----------------------------------------------------

    #[allow(clippy::too_many_lines)]
    fn run_action(&mut self, action: &Action, seq: &[Key]) -> Result<Flow, EditError> {
        use ActionKind::*;
        trace!(name = action.name, "action");

        match action.kind {
            Nop => Ok(Flow::Done),

            Movement(kind) => self.execute(Target::Motion(kind, None)).map(|()| Flow::Done),

            MovementKey(kind) => {
                let Some(key) = self.queue.first().copied() else {
                    return Ok(Flow::NeedMore);
                };
                self.queue.remove(0);
                match key.char() {
                    Some(ch) => self.execute(Target::Motion(kind, Some(ch))).map(|()| Flow::Done),
                    None => {
                        self.cancel_pending();
                        Ok(Flow::Done)
                    }
                }
            }

            MarkMotion(kind) => {
                let Some(key) = self.queue.first().copied() else {
                    return Ok(Flow::NeedMore);
                };
                self.queue.remove(0);
                let Some(id) = key.char().and_then(MarkId::from_char) else {
                    self.cancel_pending();
                    return Ok(Flow::Done);
                };
                let Some(pos) = self.marks.get(id) else {
                    return Err(EditError::MissingMark(key.char().unwrap_or('?')));
                };
                self.pending.mark_pos = Some(pos);
                self.execute(Target::Motion(kind, None)).map(|()| Flow::Done)
            }

            TextObject(kind) => self.execute(Target::TextObject(kind)).map(|()| Flow::Done),

            Operator(kind) => self.arm_operator(kind).map(|()| Flow::Done),

            GotoLine(default) => {
                let target = if self.pending.count_given() {
                    Target::Motion(MotionKind::Line, None)
                } else {
                    match default {
                        GotoDefault::First => Target::Motion(MotionKind::FileBegin, None),
                        GotoDefault::Last => Target::Motion(MotionKind::FileEnd, None),
                    }
                };
                self.execute(target).map(|()| Flow::Done)
            }

            SwitchMode(mode) => {
                self.pending.clear();
                self.mode_set(mode);
                Ok(Flow::Done)
            }

            EnterInsert(entry) => {
                self.pending.clear();
                for idx in 0..self.view.cursor_count() {
                    let pos = self.view.cursors()[idx].position();
                    let target = match entry {
                        InsertEntry::Here => pos,
                        InsertEntry::After => {
                            let content = self.buffer.line_content_len(pos.line).unwrap_or(0);
                            Position::new(pos.line, (pos.col + 1).min(content))
                        }
                        InsertEntry::LineEnd => self.buffer.line_end(pos),
                        InsertEntry::LineStart => self.buffer.line_start(pos),
                    };
                    self.view.cursors_mut()[idx].set_position(target, &self.buffer, true);
                }
                self.mode_set(ModeId::Insert);
                Ok(Flow::Done)
            }

            OpenLine(dir) => {
                self.pending.clear();
                self.open_line(dir);
                Ok(Flow::Done)
            }

            JoinLineBelow => {
                let lines = self.pending.effective_count().max(2);
                self.pending.count_pre = lines;
                self.pending.count_post = 0;
                self.pending.op = Some(OpKind::Join);
                self.execute(Target::CurrentLines).map(|()| Flow::Done)
            }

            Count => {
                let digit = seq.last().and_then(|k| k.digit()).unwrap_or(0);
                if digit == 0 && self.pending.digit_slot() == 0 {
                    return self
                        .execute(Target::Motion(MotionKind::LineBegin, None))
                        .map(|()| Flow::Done);
                }
                self.pending.push_digit(digit);
                Ok(Flow::Done)
            }

            UseRegister => {
                let Some(key) = self.queue.first().copied() else {
                    return Ok(Flow::NeedMore);
                };
                self.queue.remove(0);
                if let Some(ch) = key.char() {
                    if let Some(id) = RegisterId::from_char(ch) {
                        self.pending.register = Some((id, RegisterId::is_append_char(ch)));
                    }
                }
                Ok(Flow::Done)
            }

            MarkSet => {
                let Some(key) = self.queue.first().copied() else {
                    return Ok(Flow::NeedMore);
                };
                self.queue.remove(0);
                if let Some(id) = key.char().and_then(MarkId::from_char) {
                    self.marks.set(id, self.view.primary().position());
                }
                Ok(Flow::Done)
            }

            InsertRegister => {
                let Some(key) = self.queue.first().copied() else {
                    return Ok(Flow::NeedMore);
                };
                self.queue.remove(0);
                let Some(id) = key.char().and_then(RegisterId::from_char) else {
                    return Ok(Flow::Done);
                };
                let reg = self.registers.get(Some(id));
                if reg.is_empty() {
                    return Err(EditError::MissingRegister(key.char().unwrap_or('"')));
                }
                let texts = if reg.slices().len() == self.view.cursor_count() {
                    reg.slices().to_vec()
                } else {
                    vec![reg.content().to_string()]
                };
                self.splice_at_cursors(&texts, false);
                Ok(Flow::Done)
            }

            MacroRecord => {
                if self.macros.is_recording() {
                    // Strip the toggle key that was just recorded.
                    self.macros.record_stop(1);
                    return Ok(Flow::Done);
                }
                let Some(key) = self.queue.first().copied() else {
                    return Ok(Flow::NeedMore);
                };
                self.queue.remove(0);
                if let Some(ch) = key.char() {
                    self.macros.record_start(ch);
                }
                Ok(Flow::Done)
            }

            MacroReplay => {
                let Some(key) = self.queue.first().copied() else {
                    return Ok(Flow::NeedMore);
                };
                self.queue.remove(0);
                let Some(name) = key.char() else {
                    return Ok(Flow::Done);
                };
                // Replaying the register being recorded is refused, silently.
                if let Some(recorded) = self.macros.get(name) {
                    let tokens = recorded.to_vec();
                    debug!(register = %name, keys = tokens.len(), "macro replay");
                    // Inject at the head of the stream: a replay behaves
                    // exactly like typing.
                    self.queue.splice(0..0, tokens);
                }
                Ok(Flow::Done)
            }

            ReplaceChar => {
                let Some(key) = self.queue.first().copied() else {
                    return Ok(Flow::NeedMore);
                };
                self.queue.remove(0);
                let text = match key {
                    Key::Char(ch) => ch.to_string(),
                    Key::Enter => self.buffer.line_ending().as_str().to_string(),
                    _ => {
                        self.pending.clear();
                        return Ok(Flow::Done);
                    }
                };
                self.replace_at_cursors(&text);
                Ok(Flow::Done)
            }

            InsertVerbatim => self.insert_verbatim(),

            InsertNewline => {
                let nl = self.buffer.line_ending().as_str().to_string();
                self.input_text(&nl, self.mode == ModeId::Replace);
                Ok(Flow::Done)
            }

            InsertTab => {
                self.input_text("\t", self.mode == ModeId::Replace);
                Ok(Flow::Done)
            }

            DeleteShorthand(kind) => {
                self.pending.op = Some(OpKind::Delete);
                // Shorthand deletes never fail loudly: at a buffer edge
                // there is simply nothing to remove.
                let _ = self.execute(Target::Motion(kind, None));
                Ok(Flow::Done)
            }

            Scroll(dir, amount) => {
                let lines = if self.pending.count_given() {
                    self.pending.effective_count() as usize
                } else {
                    match amount {
                        ScrollAmount::Page => self.view.height() as usize,
                        ScrollAmount::HalfPage => (self.view.height() as usize / 2).max(1),
                    }
                };
                match dir {
                    ScrollDir::Up => self.view.scroll_up(&self.buffer, lines),
                    ScrollDir::Down => self.view.scroll_down(&self.buffer, lines),
                }
                self.pending.clear();
                self.ui.draw();
                Ok(Flow::Done)
            }

            Slide(dir) => {
                let lines = if self.pending.count_given() {
                    self.pending.effective_count() as usize
                } else {
                    1
                };
                match dir {
                    ScrollDir::Up => self.view.slide_up(&self.buffer, lines),
                    ScrollDir::Down => self.view.slide_down(&self.buffer, lines),
                }
                self.pending.clear();
                self.ui.draw();
                Ok(Flow::Done)
            }

            RedrawAt(anchor) => {
                match anchor {
                    ScreenAnchor::Top => self.view.redraw_top(),
                    ScreenAnchor::Center => self.view.redraw_center(),
                    ScreenAnchor::Bottom => self.view.redraw_bottom(),
                }
                self.pending.clear();
                self.ui.draw();
                Ok(Flow::Done)
            }

            Undo => {
                self.pending.clear();
                match self.history.undo(&mut self.buffer) {
                    Some(pos) => {
                        self.restore_single_cursor(pos);
                        Ok(Flow::Done)
                    }
                    None => Err(EditError::NoHistory("oldest")),
                }
            }

            Redo => {
                self.pending.clear();
                match self.history.redo(&mut self.buffer) {
                    Some(pos) => {
                        self.restore_single_cursor(pos);
                        Ok(Flow::Done)
                    }
                    None => Err(EditError::NoHistory("newest")),
                }
            }

            Earlier => {
                let count = self.pending.effective_count() as usize;
                self.pending.clear();
                match self.history.earlier(&mut self.buffer, count) {
                    Some(pos) => {
                        self.restore_single_cursor(pos);
                        Ok(Flow::Done)
                    }
                    None => Err(EditError::NoHistory("oldest")),
                }
            }

            Later => {
                let count = self.pending.effective_count() as usize;
                self.pending.clear();
                match self.history.later(&mut self.buffer, count) {
                    Some(pos) => {
                        self.restore_single_cursor(pos);
                        Ok(Flow::Done)
                    }
                    None => Err(EditError::NoHistory("newest")),
                }
            }

            Repeat => {
                let Some(slot) = self.repeat else {
                    return Ok(Flow::Done);
                };
                if !self.pending.count_given() {
                    self.pending.count_pre = slot.count_pre;
                    self.pending.count_post = slot.count_post;
                }
                if self.pending.register.is_none() {
                    self.pending.register = slot.register;
                }
                self.pending.op = Some(slot.op);
                self.pending.kind_override = slot.kind_override;
                self.repeating = true;
                let result = self.execute(slot.target);
                self.repeating = false;
                result.map(|()| Flow::Done)
            }

            SelectionFlip => {
                for cursor in self.view.cursors_mut() {
                    cursor.selection_swap();
                }
                self.ui.draw();
                Ok(Flow::Done)
            }

            SelectionRestore => {
                let mut any = false;
                for idx in 0..self.view.cursor_count() {
                    let buffer = &self.buffer;
                    any |= self.view.cursors_mut()[idx].selection_restore(buffer);
                }
                if any {
                    self.mode_set(ModeId::Visual);
                }
                Ok(Flow::Done)
            }

            CursorsSelectWord => {
                if self.view.cursors_select_word(&self.buffer) {
                    self.mode_set(ModeId::Visual);
                }
                Ok(Flow::Done)
            }

            CursorsNewMatchNext => {
                self.view.cursors_select_next(&self.buffer);
                self.ui.draw();
                Ok(Flow::Done)
            }

            CursorsNewMatchSkip => {
                self.view.cursors_select_skip(&self.buffer);
                self.ui.draw();
                Ok(Flow::Done)
            }

            CursorsAlign => {
                self.view.cursors_align(&self.buffer);
                self.ui.draw();
                Ok(Flow::Done)
            }

            CursorsRemoveAll => {
                self.view.cursors_clear();
                self.ui.draw();
                Ok(Flow::Done)
            }

            CursorsRemoveLast => {
                let primary = self.view.primary_index();
                self.view.cursor_dispose(primary);
                self.ui.draw();
                Ok(Flow::Done)
            }

            CursorsNewLine(dir) => {
                let pos = self.view.primary().position();
                let line = match dir {
                    VerticalDir::Above => pos.line.saturating_sub(1),
                    VerticalDir::Below => (pos.line + 1).min(self.buffer.last_line()),
                };
                if line != pos.line {
                    let target = self.buffer.clamp_position(Position::new(line, pos.col));
                    if let Some(idx) = self.view.cursor_new_at(target) {
                        self.view.set_primary(idx);
                    }
                }
                self.ui.draw();
                Ok(Flow::Done)
            }

            PromptSearch(dir) => {
                self.open_prompt(dir.leader(), "");
                Ok(Flow::Done)
            }

            PromptCmd(preset) => {
                // The selection-range preset only makes sense from visual.
                let preset = if self.mode.is_visual() { preset } else { "" };
                self.open_prompt(':', preset);
                Ok(Flow::Done)
            }

            PromptEnter => self.prompt_enter().map(|()| Flow::Done),

            PromptBackspace => {
                let Some(prompt) = &mut self.prompt else {
                    return Ok(Flow::Done);
                };
                if !prompt.backspace() && prompt.is_empty() {
                    // Backspace on an empty line aborts the prompt.
                    let saved = prompt.saved_mode();
                    self.mode_set(saved);
                }
                self.ui.draw();
                Ok(Flow::Done)
            }

            PromptDelete => {
                if let Some(prompt) = &mut self.prompt {
                    prompt.delete();
                    self.ui.draw();
                }
                Ok(Flow::Done)
            }

            PromptMove(movement) => {
                if let Some(prompt) = &mut self.prompt {
                    match movement {
                        crate::action::PromptMove::Left => prompt.move_left(),
                        crate::action::PromptMove::Right => prompt.move_right(),
                        crate::action::PromptMove::Home => prompt.move_home(),
                        crate::action::PromptMove::End => prompt.move_end(),
                    }
                    self.ui.draw();
                }
                Ok(Flow::Done)
            }

            Suspend => {
                self.ui.suspend();
                Ok(Flow::Done)
            }

            Redraw => {
                self.ui.draw();
                Ok(Flow::Done)
            }

            KindOverride(kind) => {
                self.pending.kind_override = Some(kind);
                Ok(Flow::Done)
            }
        }
    }

    /// Drop the pending command, leaving operator-pending mode if active.
    fn cancel_pending(&mut self) {
        self.pending.clear();
        if self.mode == ModeId::Operator {
            let back = self.mode_prev;
            self.mode_set(back);
        }
    }

    /// Arm an operator, or execute it right away where the grammar says so:
    /// visual selections, rangeless operators, and doubling.
    fn arm_operator(&mut self, kind: OpKind) -> EditResult {
        if self.mode.is_visual() {
            self.pending.op = Some(kind);
            return self.execute(Target::Visual);
        }
        if kind.is_rangeless() {
            self.pending.op = Some(kind);
            return self.execute(Target::Rangeless);
        }
        if self.mode == ModeId::Operator {
            if self.pending.op == Some(kind) {
                // Doubled operator: apply to whole lines.
                return self.execute(Target::CurrentLines);
            }
            // A different operator replaces the pending one.
            self.pending.op = Some(kind);
            return Ok(());
        }
        self.pending.op = Some(kind);
        self.mode_set(ModeId::Operator);
        Ok(())
    }

    // -- Text entry helpers ---------------------------------------------------

    /// Insert (or overwrite, in replace mode) typed text at every cursor,
    /// maintaining the repeat buffer.
    pub(crate) fn input_text(&mut self, text: &str, overwrite: bool) {
        let pos = self.view.primary().position();
        if self.repeat_anchor != Some(pos) {
            self.repeat_text.clear();
        }
        self.repeat_text.push_str(text);

        self.splice_at_cursors(std::slice::from_ref(&text.to_string()), overwrite);
        self.repeat_anchor = Some(self.view.primary().position());
    }

    /// Insert text at every cursor: one shared string, or one slice per
    /// cursor. Wraps in its own undo group unless one is already open.
    pub(crate) fn splice_at_cursors(&mut self, texts: &[String], overwrite: bool) {
        if texts.iter().all(|t| t.is_empty()) {
            return;
        }
        let wrap = !self.history.in_transaction();
        if wrap {
            self.history.begin(self.view.primary().position());
        }

        let mut positions: Vec<Position> =
            self.view.cursors().iter().map(Cursor::position).collect();
        {
            let mut scope = EditScope {
                buf: &mut self.buffer,
                history: &mut self.history,
                marks: &mut self.marks,
                tracked: &mut positions,
            };
            for i in (0..scope.tracked.len()).rev() {
                let at = scope.tracked[i];
                let text = if texts.len() == scope.tracked.len() {
                    texts[i].clone()
                } else {
                    texts[0].clone()
                };
                if overwrite {
                    scope.overwrite(at, &text);
                } else {
                    scope.insert(at, &text);
                }
            }
        }
        for (i, pos) in positions.iter().enumerate() {
            self.view.cursors_mut()[i].set_position(*pos, &self.buffer, true);
        }
        self.view.normalize(&self.buffer, true);

        if wrap {
            self.changes.push(self.view.primary().position());
            self.history.commit(self.view.primary().position());
        }
        self.view.ensure_visible(&self.buffer);
        self.ui.draw();
    }

    /// `r` — replace the character under every cursor with `text`, as one
    /// snapshot, and arm the repeat slot with the replacement.
    fn replace_at_cursors(&mut self, text: &str) {
        let wrap = !self.history.in_transaction();
        if wrap {
            self.history.begin(self.view.primary().position());
        }

        let newline = text.ends_with('\n') || text.ends_with('\r');
        let mut positions: Vec<Position> =
            self.view.cursors().iter().map(Cursor::position).collect();
        {
            let mut scope = EditScope {
                buf: &mut self.buffer,
                history: &mut self.history,
                marks: &mut self.marks,
                tracked: &mut positions,
            };
            for i in (0..scope.tracked.len()).rev() {
                let at = scope.tracked[i];
                scope.replace_char(at, text);
                if !newline {
                    // Stay on the replaced character.
                    scope.tracked[i] = at;
                }
            }
        }
        for (i, pos) in positions.iter().enumerate() {
            self.view.cursors_mut()[i].set_position(*pos, &self.buffer, false);
        }
        self.view.normalize(&self.buffer, false);

        self.changes.push(self.view.primary().position());
        if wrap {
            self.history.commit(self.view.primary().position());
        }

        // `.` repeats the replacement character.
        self.repeat_text = text.to_string();
        if !self.repeating {
            self.repeat = Some(RepeatSlot {
                count_pre: 0,
                count_post: 0,
                register: None,
                op: OpKind::RepeatReplace,
                kind_override: None,
                target: Target::Rangeless,
            });
        }
        self.pending.clear();
        self.view.ensure_visible(&self.buffer);
        self.ui.draw();
    }

    /// `o`/`O` — open a line and enter insert mode, as one undo group.
    fn open_line(&mut self, dir: VerticalDir) {
        if !self.history.in_transaction() {
            self.history.begin(self.view.primary().position());
        }
        let nl = self.buffer.line_ending().as_str().to_string();

        let mut positions: Vec<Position> =
            self.view.cursors().iter().map(Cursor::position).collect();
        {
            let mut scope = EditScope {
                buf: &mut self.buffer,
                history: &mut self.history,
                marks: &mut self.marks,
                tracked: &mut positions,
            };
            for i in (0..scope.tracked.len()).rev() {
                let pos = scope.tracked[i];
                match dir {
                    VerticalDir::Below => {
                        let at = scope.buf.line_end(pos);
                        let end = scope.insert(at, &nl);
                        scope.tracked[i] = end;
                    }
                    VerticalDir::Above => {
                        let at = scope.buf.line_begin(pos);
                        scope.insert(at, &nl);
                        scope.tracked[i] = at;
                    }
                }
            }
        }
        for (i, pos) in positions.iter().enumerate() {
            self.view.cursors_mut()[i].set_position(*pos, &self.buffer, true);
        }
        self.view.normalize(&self.buffer, true);
        self.mode_set(ModeId::Insert);
    }

    /// `<C-v>` — read a base prefix and digits, insert the rune or byte.
    fn insert_verbatim(&mut self) -> Result<Flow, EditError> {
        let Some(first) = self.queue.first().copied() else {
            return Ok(Flow::NeedMore);
        };
        let Some(prefix) = first.char() else {
            self.queue.remove(0);
            return Ok(Flow::Done);
        };

        let (base, digits, seed) = match prefix {
            'o' | 'O' => (8u32, 3usize, 0u32),
            'x' | 'X' => (16, 2, 0),
            'u' => (16, 4, 0),
            'U' => (16, 8, 0),
            '0'..='9' => (10, 2, prefix.to_digit(10).unwrap_or(0)),
            _ => {
                self.queue.remove(0);
                return Ok(Flow::Done);
            }
        };
        if self.queue.len() < 1 + digits {
            return Ok(Flow::NeedMore);
        }

        self.queue.remove(0);
        let mut value = seed;
        for _ in 0..digits {
            let Some(digit) = self.queue.first().and_then(|k| k.char()).and_then(|c| c.to_digit(base))
            else {
                break; // a non-digit terminates the number early
            };
            self.queue.remove(0);
            value = value * base + digit;
        }

        // Octal/hex/decimal prefixes name a byte value; `u`/`U` name a code
        // point. The buffer is UTF-8, so both become a rune.
        let text = char::from_u32(value).map(String::from);
        if let Some(text) = text {
            self.input_text(&text, self.mode == ModeId::Replace);
        }
        Ok(Flow::Done)
    }

    /// After undo/redo/earlier/later: one cursor, restored position.
    fn restore_single_cursor(&mut self, pos: Position) {
        let cursor = Cursor::at(self.buffer.clamp_position(pos));
        self.view.set_cursors(vec![cursor], 0);
        self.view.normalize(&self.buffer, self.mode.cursor_past_end());
        self.view.ensure_visible(&self.buffer);
        self.ui.draw();
    }

    // -- Prompt ---------------------------------------------------------------

    fn open_prompt(&mut self, leader: char, preset: &str) {
        let saved = if self.mode.is_user() {
            self.mode
        } else {
            self.mode_prev
        };
        self.pending.clear();
        self.prompt = Some(Prompt::new(leader, preset, saved));
        self.mode_set(ModeId::Prompt);
    }

    fn prompt_enter(&mut self) -> EditResult {
        let Some(mut prompt) = self.prompt.take() else {
            return Ok(());
        };
        let line = prompt.take_line();
        let leader = prompt.leader();
        let saved = prompt.saved_mode();
        self.mode_set(saved);

        match leader {
            ':' => {
                if !line.is_empty() {
                    self.registers.write(
                        Some(RegisterId::Command),
                        line.clone(),
                        TextKind::Charwise,
                        false,
                    );
                    self.queued_command = Some(line);
                }
                Ok(())
            }
            '/' | '?' => {
                let dir = if leader == '/' {
                    Direction::Forward
                } else {
                    Direction::Backward
                };
                if line.is_empty() {
                    // An empty search repeats the last pattern, reversing
                    // direction as asked.
                    match &mut self.last_search {
                        Some((_, d)) => *d = dir,
                        None => return Err(EditError::NoSearchPattern),
                    }
                } else {
                    self.set_search_pattern(line, dir);
                }
                self.execute(Target::Motion(MotionKind::SearchNext, None))
            }
            _ => Ok(()),
        }
    }

    /// Record a search pattern: the `/` register and the last-pattern slot.
    pub(crate) fn set_search_pattern(&mut self, pattern: String, dir: Direction) {
        self.registers.write(
            Some(RegisterId::Search),
            pattern.clone(),
            TextKind::Charwise,
            false,
        );
        self.last_search = Some((pattern, dir));
    }

    // -- Public command API (the surface configuration and `:` map onto) ------

    /// Execute a motion, honoring the pending command.
    pub fn motion(&mut self, kind: MotionKind) -> EditResult {
        self.execute(Target::Motion(kind, None))
    }

    /// Execute a motion that takes a character argument.
    pub fn motion_key(&mut self, kind: MotionKind, key: char) -> EditResult {
        self.execute(Target::Motion(kind, Some(key)))
    }

    /// Execute a text object, honoring the pending command.
    pub fn textobject(&mut self, kind: crate::textobject::TextObjectKind) -> EditResult {
        self.execute(Target::TextObject(kind))
    }

    /// Arm or execute an operator, as the grammar dictates.
    pub fn operator(&mut self, kind: OpKind) -> EditResult {
        self.arm_operator(kind)
    }

    /// The pending count (0 when unset).
    #[must_use]
    pub fn count_get(&self) -> u32 {
        if self.pending.count_given() {
            self.pending.effective_count()
        } else {
            0
        }
    }

    /// Set the pending count.
    pub fn count_set(&mut self, count: u32) {
        self.pending.count_pre = count;
        self.pending.count_post = 0;
    }

    /// Select the register for the next command.
    pub fn register_set(&mut self, id: RegisterId, append: bool) {
        self.pending.register = Some((id, append));
    }

    /// Read a register.
    #[must_use]
    pub fn register_get(&self, id: RegisterId) -> &crate::register::Register {
        self.registers.get(Some(id))
    }

    /// Set a mark at a position.
    pub fn mark_set(&mut self, id: MarkId, pos: Position) {
        self.marks.set(id, pos);
    }

    /// Switch modes.
    pub fn mode_switch(&mut self, mode: ModeId) {
        self.mode_set(mode);
    }

    /// Replay the last change (`.`).
    pub fn repeat_last(&mut self) -> EditResult {
        let action = Action {
            name: "editor-repeat",
            description: "",
            kind: ActionKind::Repeat,
        };
        self.run_action(&action, &[]).map(|_| ())
    }

    /// Insert text at a position, as its own undo group, migrating marks.
    pub fn insert(&mut self, pos: Position, text: &str) {
        let wrap = !self.history.in_transaction();
        if wrap {
            self.history.begin(self.view.primary().position());
        }
        let mut positions: Vec<Position> = Vec::new();
        let mut scope = EditScope {
            buf: &mut self.buffer,
            history: &mut self.history,
            marks: &mut self.marks,
            tracked: &mut positions,
        };
        scope.insert(pos, text);
        if wrap {
            self.history.commit(self.view.primary().position());
        }
        self.view.normalize(&self.buffer, self.mode.cursor_past_end());
        self.ui.draw();
    }

    /// Replace the character under every cursor (`r`'s engine).
    pub fn replace_key(&mut self, text: &str) {
        self.replace_at_cursors(text);
    }

    /// Move `count` states earlier in time (`:earlier`).
    pub fn earlier(&mut self, count: usize) -> EditResult {
        match self.history.earlier(&mut self.buffer, count) {
            Some(pos) => {
                self.restore_single_cursor(pos);
                Ok(())
            }
            None => Err(EditError::NoHistory("oldest")),
        }
    }

    /// Move `count` states later in time (`:later`).
    pub fn later(&mut self, count: usize) -> EditResult {
        match self.history.later(&mut self.buffer, count) {
            Some(pos) => {
                self.restore_single_cursor(pos);
                Ok(())
            }
            None => Err(EditError::NoHistory("newest")),
        }
    }

    /// Request a repaint.
    pub fn draw(&mut self) {
        self.ui.draw();
    }

    /// Suspend the editor via the UI.
    pub fn suspend(&mut self) {
        self.ui.suspend();
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("mode", &self.mode)
            .field("cursors", &self.view.cursor_count())
            .field("buffer", &self.buffer)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn ed(text: &str) -> Editor {
        Editor::with_text(text)
    }

    fn pos(e: &Editor) -> Position {
        e.view().primary().position()
    }

    fn p(line: usize, col: usize) -> Position {
        Position::new(line, col)
    }

    /// Run `keys` against `initial`, assert the buffer and primary cursor,
    /// then check that `u` restores the initial text and `<C-r>` the edited
    /// one.
    fn check_edit(initial: &str, keys: &str, expected: &str, cursor: Position) {
        let mut e = ed(initial);
        e.keys(keys);
        assert_eq!(e.buffer().contents(), expected, "after {keys:?}");
        assert_eq!(pos(&e), cursor, "cursor after {keys:?}");

        e.keys("<Esc>u");
        assert_eq!(e.buffer().contents(), initial, "undo after {keys:?}");
        e.keys("<C-r>");
        assert_eq!(e.buffer().contents(), expected, "redo after {keys:?}");
    }

    // == The scenario table ==================================================

    #[test]
    fn scenario_dw() {
        check_edit("hello world", "dw", "world", p(0, 0));
    }

    #[test]
    fn scenario_d2w() {
        check_edit("hello world", "d2w", "", p(0, 0));
    }

    #[test]
    fn scenario_visual_line_delete() {
        check_edit("abc\ndef\nghi", "Vjd", "ghi", p(0, 0));
    }

    #[test]
    fn scenario_delete_inner_parens() {
        // Cursor on the `f` of `(foo bar)`.
        let mut e = ed("(foo bar)");
        e.keys("l");
        assert_eq!(pos(&e), p(0, 1));
        e.keys("di(");
        assert_eq!(e.buffer().contents(), "()");
        assert_eq!(pos(&e), p(0, 1)); // between the parens

        e.keys("u");
        assert_eq!(e.buffer().contents(), "(foo bar)");
        e.keys("<C-r>");
        assert_eq!(e.buffer().contents(), "()");
    }

    #[test]
    fn scenario_yyp() {
        check_edit("aaa\nbbb\nccc", "yyp", "aaa\naaa\nbbb\nccc", p(1, 0));
    }

    #[test]
    fn scenario_replace_char() {
        check_edit("abc", "rx", "xbc", p(0, 0));
    }

    #[test]
    fn scenario_multicursor_match_delete() {
        let mut e = ed("foo foo foo");
        e.keys("viw");
        assert_eq!(e.mode(), ModeId::Visual);
        e.keys("<C-n><C-n>");
        assert_eq!(e.view().cursor_count(), 3);
        e.keys("d");

        assert_eq!(e.buffer().contents(), "  ");
        assert_eq!(e.mode(), ModeId::Normal);
        assert_eq!(pos(&e), p(0, 1)); // the first gap

        // Cursors stay ordered and non-overlapping.
        let positions: Vec<_> = e.view().cursors().iter().map(Cursor::position).collect();
        let mut sorted = positions.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(positions, sorted);

        e.keys("u");
        assert_eq!(e.buffer().contents(), "foo foo foo");
        e.keys("<C-r>");
        assert_eq!(e.buffer().contents(), "  ");
    }

    // == Property: escape clears the pending command =========================

    #[test]
    fn escape_always_returns_to_normal_with_no_pending() {
        for stream in [
            "<Esc>",
            "2d<Esc>",
            "\"a3<Esc>",
            "d2<Esc>",
            "v<Esc>",
            "Vjj<Esc>",
            "ihello<Esc>",
            "R42<Esc>",
            ":wq<Esc>",
            "/foo<Esc>",
            "f<Esc>",
            "3\"q<Esc>",
            "gu<Esc>",
        ] {
            let mut e = ed("one two\nthree four\nfive six");
            e.keys(stream);
            assert_eq!(e.mode(), ModeId::Normal, "mode after {stream:?}");
            assert_eq!(e.count_get(), 0, "count after {stream:?}");
            assert!(e.pending.op.is_none(), "operator after {stream:?}");
            assert!(e.pending.register.is_none(), "register after {stream:?}");
        }
    }

    // == Property: delete then put restores the buffer =======================

    #[test]
    fn delete_put_roundtrip_charwise() {
        for (text, keys) in [
            ("hello world", "dwP"),
            ("hello world", "x P"),
            ("hello world", "vlldP"),
            ("alpha beta gamma", "wdeP"),
        ] {
            let mut e = ed(text);
            e.keys(keys);
            assert_eq!(e.buffer().contents(), text, "{keys:?} on {text:?}");
        }
    }

    #[test]
    fn delete_put_roundtrip_linewise() {
        let mut e = ed("aaa\nbbb\nccc");
        e.keys("ddP");
        assert_eq!(e.buffer().contents(), "aaa\nbbb\nccc");

        let mut e = ed("aaa\nbbb\nccc");
        e.keys("jddP");
        assert_eq!(e.buffer().contents(), "aaa\nbbb\nccc");
    }

    // == Property: undo restores buffer and cursor ===========================

    #[test]
    fn undo_restores_buffer_and_cursor() {
        for keys in ["dw", "x", "dd", "cwnew<Esc>", "ohi<Esc>", "J", "rz", ">>"] {
            let mut e = ed("alpha beta\ngamma delta");
            e.keys("w"); // start somewhere interesting
            let before_text = e.buffer().contents();
            let before_pos = pos(&e);

            e.keys(keys);
            let after_text = e.buffer().contents();
            assert_ne!(after_text, before_text, "{keys:?} edited nothing");

            e.keys("u");
            assert_eq!(e.buffer().contents(), before_text, "undo of {keys:?}");
            assert_eq!(pos(&e), before_pos, "cursor after undo of {keys:?}");

            e.keys("<C-r>");
            assert_eq!(e.buffer().contents(), after_text, "redo of {keys:?}");
        }
    }

    // == Property: counts multiply ===========================================

    #[test]
    fn counts_multiply_across_operator() {
        let text = "a b c d e f g h i j k l";
        let mut lhs = ed(text);
        lhs.keys("2d3w");
        let mut rhs = ed(text);
        rhs.keys("d6w");
        assert_eq!(lhs.buffer().contents(), rhs.buffer().contents());

        let mut lhs = ed(text);
        lhs.keys("3d2w");
        assert_eq!(lhs.buffer().contents(), rhs.buffer().contents());
    }

    #[test]
    fn count_repeats_motion() {
        let mut e = ed("a b c d e");
        e.keys("3w");
        assert_eq!(pos(&e), p(0, 6));
        e.keys("2b");
        assert_eq!(pos(&e), p(0, 2));
    }

    #[test]
    fn multi_digit_count() {
        let text: String = (0..30).map(|i| format!("line{i}\n")).collect();
        let mut e = ed(&text);
        e.keys("12j");
        assert_eq!(pos(&e).line, 12);
    }

    // == Registers ===========================================================

    #[test]
    fn named_register_yank_and_put() {
        let mut e = ed("hello world");
        e.keys("\"ayw");
        assert_eq!(e.register_get(RegisterId::Named('a')).content(), "hello ");
        // The unnamed register was left untouched by the named write.
        assert_eq!(e.register_get(RegisterId::Unnamed).content(), "");

        e.keys("\"ap");
        assert_eq!(e.buffer().contents(), "hhello ello world");
    }

    #[test]
    fn uppercase_register_appends() {
        let mut e = ed("one two");
        e.keys("\"ayw");
        e.keys("w\"Ayw");
        assert_eq!(e.register_get(RegisterId::Named('a')).content(), "one two");
    }

    #[test]
    fn delete_writes_unnamed_register() {
        let mut e = ed("hello world");
        e.keys("dw");
        assert_eq!(e.register_get(RegisterId::Unnamed).content(), "hello ");
        assert_eq!(
            e.register_get(RegisterId::Unnamed).kind(),
            TextKind::Charwise
        );
    }

    #[test]
    fn linewise_register_kind() {
        let mut e = ed("aaa\nbbb");
        e.keys("yy");
        let reg = e.register_get(RegisterId::Unnamed);
        assert_eq!(reg.content(), "aaa\n");
        assert_eq!(reg.kind(), TextKind::Linewise);
    }

    // == Operators ===========================================================

    #[test]
    fn change_word_enters_insert() {
        let mut e = ed("hello world");
        e.keys("cw");
        assert_eq!(e.mode(), ModeId::Insert);
        assert_eq!(e.buffer().contents(), " world");
        e.keys("bye<Esc>");
        assert_eq!(e.buffer().contents(), "bye world");
        // One undo covers delete + insertion.
        e.keys("u");
        assert_eq!(e.buffer().contents(), "hello world");
    }

    #[test]
    fn change_line_keeps_line_break() {
        let mut e = ed("aaa\nbbb\nccc");
        e.keys("jcc");
        assert_eq!(e.buffer().contents(), "aaa\n\nccc");
        assert_eq!(e.mode(), ModeId::Insert);
        e.keys("new<Esc>");
        assert_eq!(e.buffer().contents(), "aaa\nnew\nccc");
    }

    #[test]
    fn delete_line_variants() {
        check_edit("aaa\nbbb\nccc", "dd", "bbb\nccc", p(0, 0));
        check_edit("aaa\nbbb\nccc", "jdd", "aaa\nccc", p(1, 0));
        check_edit("aaa\nbbb\nccc", "2dd", "ccc", p(0, 0));
        // Deleting the last line also drops its leading break.
        check_edit("aaa\nbbb", "jdd", "aaa", p(0, 0));
    }

    #[test]
    fn delete_with_find_motion() {
        check_edit("say hello now", "dfo", " now", p(0, 0));
        check_edit("say hello now", "dto", "o now", p(0, 0));
    }

    #[test]
    fn case_operators() {
        check_edit("hello World", "gUgU", "HELLO WORLD", p(0, 0));
        check_edit("hello World", "gugu", "hello world", p(0, 0));
        check_edit("hello World", "g~g~", "HELLO wORLD", p(0, 0));
        check_edit("hello World", "gUw", "HELLO World", p(0, 0));
    }

    #[test]
    fn shift_operators() {
        // The cursor lands on the first non-blank of its line.
        check_edit("aaa\nbbb", ">j", "\taaa\n\tbbb", p(0, 1));
        check_edit("\taaa\n\tbbb", "<j", "aaa\nbbb", p(0, 0));
    }

    #[test]
    fn join_lines() {
        check_edit("hello\n   world", "J", "hello world", p(0, 5));
        check_edit("a\nb\nc", "3J", "a b c", p(0, 1));
    }

    #[test]
    fn visual_join() {
        check_edit("a\nb\nc", "VjJ", "a b\nc", p(0, 1));
    }

    #[test]
    fn shorthand_deletes() {
        check_edit("abc", "x", "bc", p(0, 0));
        check_edit("abc", "lX", "bc", p(0, 0));
        check_edit("abcde", "3x", "de", p(0, 0));
        check_edit("hello world", "D", "", p(0, 0));
        check_edit("hello", "lC", "h", p(0, 1));
    }

    #[test]
    fn operator_on_invalid_object_leaves_buffer() {
        let mut e = ed("hello world");
        e.keys("di(");
        assert_eq!(e.buffer().contents(), "hello world");
        // The failure is surfaced, the register untouched.
        assert!(e.message().is_some_and(|(_, err)| err));
        assert_eq!(e.register_get(RegisterId::Unnamed).content(), "");
    }

    #[test]
    fn motion_without_movement_discards_command() {
        let mut e = ed("hello");
        e.keys("d0"); // already at column 0
        assert_eq!(e.buffer().contents(), "hello");
        assert_eq!(e.mode(), ModeId::Normal);
    }

    #[test]
    fn kind_override_makes_motion_linewise() {
        // `dVl` deletes the whole line: `l` is charwise, `V` forces lines.
        let mut e = ed("aaa\nbbb");
        e.keys("dVl");
        assert_eq!(e.buffer().contents(), "bbb");
    }

    #[test]
    fn put_variants() {
        check_edit("ac", "ylp", "aac", p(0, 1));
        check_edit("ac", "ylP", "aac", p(0, 0));
        check_edit("abc", "yl2p", "aaabc", p(0, 2));
        check_edit("aaa", "yyp", "aaa\naaa", p(1, 0));
        check_edit("aaa\nbbb", "yyjp", "aaa\nbbb\naaa", p(2, 0));
        check_edit("aaa\nbbb", "jyyP", "aaa\nbbb\nbbb", p(1, 0));
    }

    // == Text objects through operators ======================================

    #[test]
    fn delete_text_objects() {
        check_edit("say \"hello\" now", "fedi\"", "say \"\" now", p(0, 5));
        // The outer quote takes the delimiters, not the whitespace.
        check_edit("say \"hello\" now", "feda\"", "say  now", p(0, 4));
        check_edit("one two three", "wdaw", "one three", p(0, 4));
        check_edit("one two three", "wdiw", "one  three", p(0, 4));
    }

    #[test]
    fn yank_inner_paragraph() {
        let mut e = ed("one\ntwo\n\nthree");
        e.keys("yip");
        assert_eq!(e.register_get(RegisterId::Unnamed).content(), "one\ntwo\n");
        // Text objects are charwise ranges; only motions and overrides make
        // a command linewise.
        assert_eq!(e.register_get(RegisterId::Unnamed).kind(), TextKind::Charwise);
    }

    #[test]
    fn change_inner_quotes() {
        let mut e = ed("say \"hello\" now");
        e.keys("ci\"bye<Esc>");
        assert_eq!(e.buffer().contents(), "say \"bye\" now");
    }

    // == Visual modes ========================================================

    #[test]
    fn visual_extends_with_motions() {
        let mut e = ed("hello world");
        e.keys("vey");
        assert_eq!(e.register_get(RegisterId::Unnamed).content(), "hello");
        assert_eq!(e.mode(), ModeId::Normal);
    }

    #[test]
    fn visual_selection_flip() {
        let mut e = ed("hello");
        e.keys("lvll");
        assert_eq!(pos(&e), p(0, 3));
        e.keys("o");
        assert_eq!(pos(&e), p(0, 1));
        e.keys("o");
        assert_eq!(pos(&e), p(0, 3));
    }

    #[test]
    fn visual_restore_after_escape() {
        let mut e = ed("hello world");
        e.keys("vll<Esc>");
        assert_eq!(e.mode(), ModeId::Normal);
        e.keys("gv");
        assert_eq!(e.mode(), ModeId::Visual);
        e.keys("y");
        assert_eq!(e.register_get(RegisterId::Unnamed).content(), "hel");
    }

    #[test]
    fn visual_leave_sets_selection_marks() {
        let mut e = ed("hello world");
        e.keys("wve<Esc>");
        assert_eq!(e.marks.get(MarkId::SelectionStart), Some(p(0, 6)));
        assert_eq!(e.marks.get(MarkId::SelectionEnd), Some(p(0, 10)));
    }

    #[test]
    fn visual_textobject_selects() {
        let mut e = ed("say (hello) now");
        e.keys("fhvi(y");
        assert_eq!(e.register_get(RegisterId::Unnamed).content(), "hello");
    }

    #[test]
    fn visual_line_covers_whole_lines() {
        check_edit("aaa\nbbb\nccc", "jVy", "aaa\nbbb\nccc", p(1, 0));
        let mut e = ed("aaa\nbbb\nccc");
        e.keys("jVy");
        assert_eq!(e.register_get(RegisterId::Unnamed).content(), "bbb\n");
    }

    // == Marks ===============================================================

    #[test]
    fn mark_set_and_goto() {
        let mut e = ed("aaa\n  bbb\nccc");
        e.keys("jllma");
        e.keys("gg");
        assert_eq!(pos(&e), p(0, 0));
        e.keys("`a");
        assert_eq!(pos(&e), p(1, 2));
        e.keys("gg'a");
        assert_eq!(pos(&e), p(1, 2)); // first non-blank of the mark's line
    }

    #[test]
    fn mark_migrates_through_edits() {
        let mut e = ed("aaa\nbbb");
        e.keys("jma");
        e.keys("ggO new<Esc>"); // insert a line above
        e.keys("`a");
        assert_eq!(pos(&e).line, 2);
    }

    #[test]
    fn missing_mark_reports() {
        let mut e = ed("aaa");
        e.keys("`q");
        assert!(e.message().is_some_and(|(m, err)| err && m.contains('q')));
    }

    #[test]
    fn delete_to_mark() {
        let mut e = ed("one two three");
        e.keys("wwma0d`a");
        assert_eq!(e.buffer().contents(), "three");
    }

    // == Macros ==============================================================

    #[test]
    fn macro_record_and_replay() {
        let mut e = ed("abcdef");
        e.keys("qaxq");
        assert_eq!(e.buffer().contents(), "bcdef");
        assert!(!e.is_recording());
        e.keys("@a");
        assert_eq!(e.buffer().contents(), "cdef");
        e.keys("2@a");
        // A count before replay runs the queue twice... the replayed keys
        // carry no count, so each @a deletes one character.
        assert!(e.buffer().contents().len() < 4);
    }

    #[test]
    fn macro_records_multi_key_commands() {
        let mut e = ed("one two three four");
        e.keys("qwdwq");
        assert_eq!(e.buffer().contents(), "two three four");
        e.keys("@w");
        assert_eq!(e.buffer().contents(), "three four");
        e.keys("@@");
        assert_eq!(e.buffer().contents(), "four");
    }

    #[test]
    fn macro_replay_of_unset_register_is_silent() {
        let mut e = ed("abc");
        e.keys("@z");
        assert_eq!(e.buffer().contents(), "abc");
        assert_eq!(e.mode(), ModeId::Normal);
    }

    // == Repeat ==============================================================

    #[test]
    fn repeat_delete() {
        let mut e = ed("one two three four");
        e.keys("dw");
        assert_eq!(e.buffer().contents(), "two three four");
        e.keys(".");
        assert_eq!(e.buffer().contents(), "three four");
        e.keys("2.");
        assert_eq!(e.buffer().contents(), "");
    }

    #[test]
    fn repeat_replace_repeats_the_character() {
        let mut e = ed("abc");
        e.keys("rx");
        assert_eq!(e.buffer().contents(), "xbc");
        e.keys("l.");
        assert_eq!(e.buffer().contents(), "xxc");
        e.keys("l.");
        assert_eq!(e.buffer().contents(), "xxx");
    }

    #[test]
    fn repeat_insertion() {
        let mut e = ed("");
        e.keys("iab<Esc>");
        assert_eq!(e.buffer().contents(), "ab");
        e.keys(".");
        assert_eq!(e.buffer().contents(), "aabb");
    }

    #[test]
    fn new_command_preempts_repeat() {
        let mut e = ed("one two three");
        e.keys("dw");
        e.keys("x"); // a different change re-arms the slot
        e.keys(".");
        // `.` repeats the `x`, not the `dw`.
        assert_eq!(e.buffer().contents(), "o three");
    }

    // == Search ==============================================================

    #[test]
    fn search_and_step() {
        let mut e = ed("foo bar foo baz foo");
        e.keys("/foo<Enter>");
        assert_eq!(pos(&e), p(0, 8));
        e.keys("n");
        assert_eq!(pos(&e), p(0, 16));
        e.keys("n"); // wraps
        assert_eq!(pos(&e), p(0, 0));
        e.keys("N");
        assert_eq!(pos(&e), p(0, 16));
    }

    #[test]
    fn search_stores_pattern_register() {
        let mut e = ed("alpha beta");
        e.keys("/beta<Enter>");
        assert_eq!(e.register_get(RegisterId::Search).content(), "beta");
    }

    #[test]
    fn search_word_under_cursor() {
        let mut e = ed("foo bar foo baz");
        e.keys("*");
        assert_eq!(pos(&e), p(0, 8));
        assert_eq!(e.register_get(RegisterId::Search).content(), "foo");
        e.keys("#");
        assert_eq!(pos(&e), p(0, 0));
    }

    #[test]
    fn search_without_pattern_reports() {
        let mut e = ed("abc");
        e.keys("n");
        assert!(e.message().is_some_and(|(_, err)| err));
    }

    #[test]
    fn delete_to_next_match() {
        let mut e = ed("foo bar foo");
        e.keys("/bar<Enter>gg");
        // `dn` deletes up to the next match of the last pattern.
        e.keys("dn");
        assert_eq!(e.buffer().contents(), "bar foo");
    }

    // == To/till repeat ======================================================

    #[test]
    fn totill_repeat_and_reverse() {
        let mut e = ed("a.b.c.d");
        e.keys("f.");
        assert_eq!(pos(&e), p(0, 1));
        e.keys(";");
        assert_eq!(pos(&e), p(0, 3));
        e.keys(";");
        assert_eq!(pos(&e), p(0, 5));
        e.keys(",");
        assert_eq!(pos(&e), p(0, 3));
    }

    // == Insert mode =========================================================

    #[test]
    fn insert_entries() {
        check_edit("bc", "iah<Esc>", "ahbc", p(0, 1));

        let mut e = ed("abc");
        e.keys("ax<Esc>");
        assert_eq!(e.buffer().contents(), "axbc");

        let mut e = ed("abc");
        e.keys("AX<Esc>");
        assert_eq!(e.buffer().contents(), "abcX");

        let mut e = ed("  abc");
        e.keys("llllIX<Esc>");
        assert_eq!(e.buffer().contents(), "  Xabc");
    }

    #[test]
    fn open_lines() {
        let mut e = ed("aaa\nbbb");
        e.keys("ohi<Esc>");
        assert_eq!(e.buffer().contents(), "aaa\nhi\nbbb");
        assert_eq!(pos(&e), p(1, 1));

        let mut e = ed("aaa");
        e.keys("Ohi<Esc>");
        assert_eq!(e.buffer().contents(), "hi\naaa");
    }

    #[test]
    fn insert_is_one_undo_group() {
        let mut e = ed("");
        e.keys("ihello world<Esc>");
        e.keys("u");
        assert_eq!(e.buffer().contents(), "");
    }

    #[test]
    fn insert_mode_editing_keys() {
        let mut e = ed("");
        e.keys("iab<Backspace>c<Esc>");
        assert_eq!(e.buffer().contents(), "ac");

        let mut e = ed("");
        e.keys("ione two<C-w>three<Esc>");
        assert_eq!(e.buffer().contents(), "one three");

        let mut e = ed("");
        e.keys("iabc<C-u>xy<Esc>");
        assert_eq!(e.buffer().contents(), "xy");
    }

    #[test]
    fn insert_newline_splits_line() {
        let mut e = ed("ab");
        e.keys("li<Enter><Esc>");
        assert_eq!(e.buffer().contents(), "a\nb");
    }

    #[test]
    fn backspace_joins_lines_in_insert() {
        let mut e = ed("a\nb");
        e.keys("ji<Backspace><Esc>");
        assert_eq!(e.buffer().contents(), "ab");
    }

    #[test]
    fn insert_register_inserts_content() {
        let mut e = ed("hello world");
        e.keys("yw");
        e.keys("A <C-r>\"<Esc>");
        assert_eq!(e.buffer().contents(), "hello world hello ");
    }

    #[test]
    fn insert_verbatim_codes() {
        let mut e = ed("");
        e.keys("i<C-v>u0041<Esc>");
        assert_eq!(e.buffer().contents(), "A");

        let mut e = ed("");
        e.keys("i<C-v>x41<Esc>");
        assert_eq!(e.buffer().contents(), "A");

        let mut e = ed("");
        e.keys("i<C-v>o101<Esc>");
        assert_eq!(e.buffer().contents(), "A");

        let mut e = ed("");
        e.keys("i<C-v>065<Esc>");
        assert_eq!(e.buffer().contents(), "A");
    }

    #[test]
    fn replace_mode_overwrites() {
        let mut e = ed("xyz");
        e.keys("Rab<Esc>");
        assert_eq!(e.buffer().contents(), "abz");
        assert_eq!(pos(&e), p(0, 1));
        e.keys("u");
        assert_eq!(e.buffer().contents(), "xyz");
    }

    #[test]
    fn replace_mode_extends_past_line_content() {
        let mut e = ed("ab");
        e.keys("Rxyz<Esc>");
        assert_eq!(e.buffer().contents(), "xyz");
    }

    // == Multi-cursor ========================================================

    #[test]
    fn select_word_enters_visual() {
        let mut e = ed("foo bar");
        e.keys("<C-n>");
        assert_eq!(e.mode(), ModeId::Visual);
        e.keys("y");
        assert_eq!(e.register_get(RegisterId::Unnamed).content(), "foo");
    }

    #[test]
    fn multicursor_yank_stores_slices() {
        let mut e = ed("foo foo");
        e.keys("viw<C-n>y");
        let reg = e.register_get(RegisterId::Unnamed);
        assert_eq!(reg.slices(), ["foo", "foo"]);
        assert_eq!(reg.content(), "foo\nfoo");
    }

    #[test]
    fn multicursor_put_distributes_slices() {
        let mut e = ed("one two");
        // Yank both words with two cursors, delete them, then put back.
        e.keys("viw<C-n>y");
        let slices = e.register_get(RegisterId::Unnamed).slices().to_vec();
        assert_eq!(slices, ["one", "two"]);
    }

    #[test]
    fn multicursor_skip_moves_on() {
        let mut e = ed("foo foo foo");
        e.keys("viw<C-x>");
        assert_eq!(e.view().cursor_count(), 1);
        e.keys("d");
        // Only the second occurrence was selected.
        assert_eq!(e.buffer().contents(), "foo  foo");
    }

    #[test]
    fn cursors_new_line_below() {
        let mut e = ed("aaa\nbbb\nccc");
        e.keys("<C-j>");
        assert_eq!(e.view().cursor_count(), 2);
        e.keys("x");
        assert_eq!(e.buffer().contents(), "aa\nbb\nccc");
        e.keys("u");
        assert_eq!(e.buffer().contents(), "aaa\nbbb\nccc");
    }

    #[test]
    fn cursors_clear_collapses() {
        let mut e = ed("aaa\nbbb");
        e.keys("<C-j>");
        assert_eq!(e.view().cursor_count(), 2);
        e.keys("<C-c>");
        assert_eq!(e.view().cursor_count(), 1);
    }

    #[test]
    fn multicursor_insert_types_everywhere() {
        let mut e = ed("aaa\nbbb");
        e.keys("<C-j>ix<Esc>");
        assert_eq!(e.buffer().contents(), "xaaa\nxbbb");
    }

    #[test]
    fn cursor_operators_make_cursors() {
        let mut e = ed("aaa\nbbb\nccc");
        e.keys("Vj"); // select two lines
        e.operator(OpKind::CursorSol).unwrap();
        assert_eq!(e.view().cursor_count(), 2);
        assert_eq!(e.buffer().contents(), "aaa\nbbb\nccc"); // no text change
        assert!(!e.history.can_undo());
    }

    // == Prompt & commands ===================================================

    #[test]
    fn command_line_is_queued_for_the_host() {
        let mut e = ed("abc");
        e.keys(":write foo<Enter>");
        assert_eq!(e.take_command().as_deref(), Some("write foo"));
        assert_eq!(e.take_command(), None);
        assert_eq!(e.mode(), ModeId::Normal);
        assert_eq!(e.register_get(RegisterId::Command).content(), "write foo");
    }

    #[test]
    fn prompt_backspace_on_empty_aborts() {
        let mut e = ed("abc");
        e.keys(":");
        assert_eq!(e.mode(), ModeId::Prompt);
        e.keys("<Backspace>");
        assert_eq!(e.mode(), ModeId::Normal);
        assert_eq!(e.take_command(), None);
    }

    #[test]
    fn prompt_editing() {
        let mut e = ed("abc");
        e.keys(":wq<Left>x<Enter>");
        assert_eq!(e.take_command().as_deref(), Some("wxq"));
    }

    #[test]
    fn visual_prompt_preset() {
        let mut e = ed("abc\ndef");
        e.keys("Vj:");
        assert_eq!(e.prompt().map(Prompt::line), Some("'<,'>"));
        e.keys("d<Enter>");
        assert_eq!(e.take_command().as_deref(), Some("'<,'>d"));
    }

    // == History chronology ==================================================

    #[test]
    fn earlier_and_later() {
        let mut e = ed("");
        e.keys("ia<Esc>");
        e.keys("ob<Esc>");
        e.keys("oc<Esc>");
        assert_eq!(e.buffer().contents(), "a\nb\nc");

        e.keys("2g-");
        assert_eq!(e.buffer().contents(), "a");
        e.keys("g+");
        assert_eq!(e.buffer().contents(), "a\nb");
        e.keys("5g+");
        assert_eq!(e.buffer().contents(), "a\nb\nc");
    }

    #[test]
    fn undo_past_end_reports() {
        let mut e = ed("abc");
        e.keys("u");
        assert!(e.message().is_some_and(|(m, err)| err && m.contains("oldest")));
    }

    // == Jump & change lists =================================================

    #[test]
    fn jumplist_round_trip() {
        let text: String = (0..50).map(|i| format!("line{i}\n")).collect();
        let mut e = ed(&text);
        e.keys("G");
        assert_eq!(pos(&e).line, 50);
        e.keys("<C-o>");
        assert_eq!(pos(&e).line, 0);
        e.keys("<C-i>");
        assert_eq!(pos(&e).line, 50);
    }

    #[test]
    fn changelist_walks_edit_sites() {
        let mut e = ed("aaa\nbbb\nccc");
        e.keys("x");
        e.keys("jjx");
        e.keys("g;");
        assert_eq!(pos(&e).line, 2);
        e.keys("g;");
        assert_eq!(pos(&e).line, 0);
        e.keys("g,");
        assert_eq!(pos(&e).line, 2);
    }

    // == Alias expansions ====================================================

    #[test]
    fn alias_shorthands() {
        check_edit("hello", "sX<Esc>", "Xello", p(0, 0));
        let mut e = ed("aaa\nbbb");
        e.keys("Y");
        assert_eq!(e.register_get(RegisterId::Unnamed).content(), "aaa\n");
        let mut e = ed("hello world");
        e.keys("vx");
        assert_eq!(e.buffer().contents(), "ello world");
    }

    // == Unicode =============================================================

    #[test]
    fn unicode_motions_and_edits() {
        let mut e = ed("café naïve");
        e.keys("dw");
        assert_eq!(e.buffer().contents(), "naïve");
        e.keys("rñ");
        assert_eq!(e.buffer().contents(), "ñaïve");
        e.keys("u");
        assert_eq!(e.buffer().contents(), "naïve");
    }

    #[test]
    fn unicode_word_objects() {
        let mut e = ed("say 日本語 now");
        e.keys("wdiw");
        assert_eq!(e.buffer().contents(), "say  now");
    }

    // == Dispatch plumbing ===================================================

    #[test]
    fn pending_prefix_waits_for_more_input() {
        let mut e = ed("aaa");
        e.keys("g");
        // Nothing happened yet; the key is buffered.
        assert_eq!(pos(&e), p(0, 0));
        e.keys("g");
        assert_eq!(pos(&e), p(0, 0)); // gg from line 0 stays put
        let text: String = (0..10).map(|i| format!("{i}\n")).collect();
        let mut e = ed(&text);
        e.keys("Gg");
        assert_eq!(pos(&e).line, 10);
        e.keys("g");
        assert_eq!(pos(&e).line, 0);
    }

    #[test]
    fn unbound_keys_drop_silently_in_normal() {
        let mut e = ed("abc");
        e.keys("\\");
        assert_eq!(e.buffer().contents(), "abc");
        assert_eq!(e.mode(), ModeId::Normal);
        assert!(e.message().is_none());
    }

    #[test]
    fn movement_key_waits_for_argument() {
        let mut e = ed("say hello");
        e.keys("f");
        assert_eq!(pos(&e), p(0, 0));
        e.keys("h");
        assert_eq!(pos(&e), p(0, 4));
    }

    #[test]
    fn api_surface_mirrors_keys() {
        let mut e = ed("hello world");
        e.operator(OpKind::Delete).unwrap();
        e.motion(MotionKind::WordStartNext).unwrap();
        assert_eq!(e.buffer().contents(), "world");

        e.count_set(2);
        assert_eq!(e.count_get(), 2);
        e.motion(MotionKind::CharNext).unwrap();
        assert_eq!(pos(&e), p(0, 2));

        e.mode_switch(ModeId::Insert);
        assert_eq!(e.mode(), ModeId::Insert);
        e.mode_switch(ModeId::Normal);

        e.insert(Position::ZERO, ">");
        assert_eq!(e.buffer().contents(), ">world");
    }
}
