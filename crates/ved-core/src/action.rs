//! The action table.
//!
//! An action is a named, documented editor operation. Keystrokes resolve to
//! actions through the per-mode key maps; the same names are addressable
//! from configuration and the `:` command line. Handlers are a closed sum
//! ([`ActionKind`]) — one variant per handler *shape*, parameterised by a
//! small payload — rather than an open function-pointer table.
//!
//! [`default_actions`] registers the complete built-in set; names are stable
//! identifiers like `cursor-char-next`, `operator-delete`, or
//! `text-object-paragraph-inner`.

use std::collections::HashMap;

use crate::mode::ModeId;
use crate::motion::MotionKind;
use crate::op::OpKind;
use crate::position::TextKind;
use crate::search::Direction;
use crate::textobject::TextObjectKind;

// ---------------------------------------------------------------------------
// Payload enums
// ---------------------------------------------------------------------------

/// Where `gg`/`G` default to without a count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GotoDefault {
    First,
    Last,
}

/// Above or below the current line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalDir {
    Above,
    Below,
}

/// Scroll direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDir {
    Up,
    Down,
}

/// Scroll distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAmount {
    Page,
    HalfPage,
}

/// Where a redraw anchors the cursor line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenAnchor {
    Top,
    Center,
    Bottom,
}

/// How insert mode is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertEntry {
    /// `i` — before the cursor.
    Here,
    /// `a` — after the cursor.
    After,
    /// `A` — at the end of the line.
    LineEnd,
    /// `I` — at the first non-blank of the line.
    LineStart,
}

/// Prompt-line cursor movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMove {
    Left,
    Right,
    Home,
    End,
}

// ---------------------------------------------------------------------------
// ActionKind
// ---------------------------------------------------------------------------

/// The closed sum of handler shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Ignore the key.
    Nop,
    /// Execute a motion.
    Movement(MotionKind),
    /// Consume one key, then execute the motion with it (`f`/`t`).
    MovementKey(MotionKind),
    /// Consume one key naming a mark, then execute the motion.
    MarkMotion(MotionKind),
    /// Execute a text object.
    TextObject(TextObjectKind),
    /// Arm (or, in visual mode, execute) an operator.
    Operator(OpKind),
    /// With a count: go to that line. Without: first or last line.
    GotoLine(GotoDefault),
    /// Switch to a mode.
    SwitchMode(ModeId),
    /// Enter insert mode with cursor pre-positioning.
    EnterInsert(InsertEntry),
    /// Open a new line above/below and enter insert mode.
    OpenLine(VerticalDir),
    /// `J` in normal mode: join `count` lines (at least two).
    JoinLineBelow,
    /// Multiply-accumulate the pending count with the last key's digit;
    /// a leading `0` is the line-begin motion instead.
    Count,
    /// Consume one key naming the register for the pending command.
    UseRegister,
    /// Consume one key, set that mark at the cursor.
    MarkSet,
    /// Consume one key, insert that register's content at every cursor.
    InsertRegister,
    /// Toggle macro recording; starting consumes the register key.
    MacroRecord,
    /// Consume the register key, replay that macro.
    MacroReplay,
    /// Consume one key (any rune), replace the character under each cursor.
    ReplaceChar,
    /// Consume a base prefix and digits, insert the resulting rune/byte.
    InsertVerbatim,
    /// Insert a line break at every cursor.
    InsertNewline,
    /// Insert a tab at every cursor.
    InsertTab,
    /// Operator-delete fused with a motion (`x`, backspace, `<C-w>`…).
    DeleteShorthand(MotionKind),
    /// Scroll window and cursor.
    Scroll(ScrollDir, ScrollAmount),
    /// Slide window content only.
    Slide(ScrollDir),
    /// Re-anchor the window around the cursor line.
    RedrawAt(ScreenAnchor),
    Undo,
    Redo,
    Earlier,
    Later,
    /// Replay the last change.
    Repeat,
    /// Swap selection anchor and head.
    SelectionFlip,
    /// Restore the last selection and re-enter visual mode.
    SelectionRestore,
    CursorsSelectWord,
    CursorsNewMatchNext,
    CursorsNewMatchSkip,
    CursorsAlign,
    CursorsRemoveAll,
    CursorsRemoveLast,
    /// New cursor on the adjacent line.
    CursorsNewLine(VerticalDir),
    /// Open the search prompt.
    PromptSearch(Direction),
    /// Open the `:` prompt with a preset.
    PromptCmd(&'static str),
    PromptEnter,
    PromptBackspace,
    PromptDelete,
    PromptMove(PromptMove),
    /// Suspend the editor process.
    Suspend,
    /// Redraw the screen.
    Redraw,
    /// Force the pending motion's kind (`v`/`V` in operator-pending mode).
    KindOverride(TextKind),
}

// ---------------------------------------------------------------------------
// Action & ActionTable
// ---------------------------------------------------------------------------

/// A named action.
#[derive(Debug, Clone, Copy)]
pub struct Action {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: ActionKind,
}

/// The registry of actions, resolvable by name.
#[derive(Debug, Default)]
pub struct ActionTable {
    actions: HashMap<&'static str, Action>,
}

impl ActionTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table holding the complete built-in action set.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        for action in default_actions() {
            let registered = table.register(action);
            debug_assert!(registered, "duplicate action name {:?}", action.name);
        }
        table
    }

    /// Register an action. Returns `false` when the name is taken.
    pub fn register(&mut self, action: Action) -> bool {
        if self.actions.contains_key(action.name) {
            return false;
        }
        self.actions.insert(action.name, action);
        true
    }

    /// Resolve an action by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    /// Number of registered actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// True when no actions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

// ---------------------------------------------------------------------------
// The built-in actions
// ---------------------------------------------------------------------------

macro_rules! actions {
    ($(($name:literal, $desc:literal, $kind:expr),)*) => {
        vec![$(Action { name: $name, description: $desc, kind: $kind }),*]
    };
}

/// Every built-in action.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn default_actions() -> Vec<Action> {
    use ActionKind::*;
    use MotionKind as M;
    use OpKind as O;
    use TextObjectKind as T;

    actions![
        ("nop", "Ignore key, do nothing", Nop),
        // -- Cursor motions --
        ("cursor-char-prev", "Move cursor left, to the previous character", Movement(M::CharPrev)),
        ("cursor-char-next", "Move cursor right, to the next character", Movement(M::CharNext)),
        ("cursor-word-start-prev", "Move cursor words backwards", Movement(M::WordStartPrev)),
        ("cursor-word-start-next", "Move cursor words forwards", Movement(M::WordStartNext)),
        ("cursor-word-end-prev", "Move cursor backwards to the end of a word", Movement(M::WordEndPrev)),
        ("cursor-word-end-next", "Move cursor forward to the end of a word", Movement(M::WordEndNext)),
        ("cursor-longword-start-prev", "Move cursor WORDS backwards", Movement(M::LongwordStartPrev)),
        ("cursor-longword-start-next", "Move cursor WORDS forwards", Movement(M::LongwordStartNext)),
        ("cursor-longword-end-prev", "Move cursor backwards to the end of a WORD", Movement(M::LongwordEndPrev)),
        ("cursor-longword-end-next", "Move cursor forward to the end of a WORD", Movement(M::LongwordEndNext)),
        ("cursor-line-up", "Move cursor line upwards", Movement(M::LineUp)),
        ("cursor-line-down", "Move cursor line downwards", Movement(M::LineDown)),
        ("cursor-line-begin", "Move cursor to first character of the line", Movement(M::LineBegin)),
        ("cursor-line-start", "Move cursor to first non-blank character of the line", Movement(M::LineStart)),
        ("cursor-line-finish", "Move cursor to last non-blank character of the line", Movement(M::LineFinish)),
        ("cursor-line-end", "Move cursor to end of the line", Movement(M::LineEnd)),
        ("cursor-line-first", "Move cursor to given line (defaults to first)", GotoLine(GotoDefault::First)),
        ("cursor-line-last", "Move cursor to given line (defaults to last)", GotoLine(GotoDefault::Last)),
        ("cursor-column", "Move cursor to given column of current line", Movement(M::Column)),
        ("cursor-paragraph-prev", "Move cursor paragraph backward", Movement(M::ParagraphPrev)),
        ("cursor-paragraph-next", "Move cursor paragraph forward", Movement(M::ParagraphNext)),
        ("cursor-sentence-prev", "Move cursor sentence backward", Movement(M::SentencePrev)),
        ("cursor-sentence-next", "Move cursor sentence forward", Movement(M::SentenceNext)),
        ("cursor-match-bracket", "Match the bracket under the cursor", Movement(M::BracketMatch)),
        ("cursor-search-forward", "Move cursor to the next match of the last pattern", Movement(M::SearchNext)),
        ("cursor-search-backward", "Move cursor to the previous match of the last pattern", Movement(M::SearchPrev)),
        ("cursor-search-word-forward", "Move cursor to the next occurrence of the word under it", Movement(M::SearchWordForward)),
        ("cursor-search-word-backward", "Move cursor to the previous occurrence of the word under it", Movement(M::SearchWordBackward)),
        // -- To/till --
        ("to-right", "To the first occurrence of a character to the right", MovementKey(M::ToRight)),
        ("to-left", "To the first occurrence of a character to the left", MovementKey(M::ToLeft)),
        ("till-right", "Till before the occurrence of a character to the right", MovementKey(M::TillRight)),
        ("till-left", "Till after the occurrence of a character to the left", MovementKey(M::TillLeft)),
        ("totill-repeat", "Repeat the latest to/till motion", Movement(M::ToTillRepeat)),
        ("totill-reverse", "Repeat the latest to/till motion, reversed", Movement(M::ToTillReverse)),
        // -- Jump & change lists --
        ("jumplist-prev", "Go to older cursor position in the jump list", Movement(M::JumplistPrev)),
        ("jumplist-next", "Go to newer cursor position in the jump list", Movement(M::JumplistNext)),
        ("changelist-prev", "Go to older cursor position in the change list", Movement(M::ChangelistPrev)),
        ("changelist-next", "Go to newer cursor position in the change list", Movement(M::ChangelistNext)),
        // -- Marks --
        ("mark-set", "Set the given mark at the cursor", MarkSet),
        ("mark-goto", "Go to the position of the given mark", MarkMotion(M::MarkGoto)),
        ("mark-goto-line", "Go to the first non-blank of the given mark's line", MarkMotion(M::MarkGotoLine)),
        // -- Modes --
        ("mode-normal", "Enter normal mode", SwitchMode(ModeId::Normal)),
        ("mode-visual-charwise", "Enter characterwise visual mode", SwitchMode(ModeId::Visual)),
        ("mode-visual-linewise", "Enter linewise visual mode", SwitchMode(ModeId::VisualLine)),
        ("mode-replace", "Enter replace mode", SwitchMode(ModeId::Replace)),
        ("mode-operator-pending", "Enter operator-pending mode", SwitchMode(ModeId::Operator)),
        ("insert-mode", "Enter insert mode before the cursor", EnterInsert(InsertEntry::Here)),
        ("append-char-next", "Enter insert mode after the cursor", EnterInsert(InsertEntry::After)),
        ("append-line-end", "Enter insert mode at the end of the line", EnterInsert(InsertEntry::LineEnd)),
        ("insert-line-start", "Enter insert mode at the first non-blank of the line", EnterInsert(InsertEntry::LineStart)),
        ("open-line-above", "Begin a new line above the cursor", OpenLine(VerticalDir::Above)),
        ("open-line-below", "Begin a new line below the cursor", OpenLine(VerticalDir::Below)),
        // -- Operators --
        ("operator-change", "Change operator", Operator(O::Change)),
        ("operator-delete", "Delete operator", Operator(O::Delete)),
        ("operator-yank", "Yank operator", Operator(O::Yank)),
        ("operator-shift-left", "Shift-left operator", Operator(O::ShiftLeft)),
        ("operator-shift-right", "Shift-right operator", Operator(O::ShiftRight)),
        ("operator-case-lower", "Lowercase operator", Operator(O::CaseLower)),
        ("operator-case-upper", "Uppercase operator", Operator(O::CaseUpper)),
        ("operator-case-swap", "Swap-case operator", Operator(O::CaseSwap)),
        ("join-lines", "Join the covered lines", Operator(O::Join)),
        ("join-line-below", "Join line(s) with the following one", JoinLineBelow),
        ("put-after", "Put register text after the cursor", Operator(O::PutAfter)),
        ("put-before", "Put register text before the cursor", Operator(O::PutBefore)),
        ("put-after-end", "Put after, cursor after the new text", Operator(O::PutAfterEnd)),
        ("put-before-end", "Put before, cursor after the new text", Operator(O::PutBeforeEnd)),
        ("cursors-new-lines-begin", "Create a cursor at the start of every covered line", Operator(O::CursorSol)),
        ("cursors-new-lines-end", "Create a cursor at the end of every covered line", Operator(O::CursorEol)),
        // -- Counts & registers --
        ("count", "Count specifier", Count),
        ("register", "Use the given register for the next operator", UseRegister),
        // -- Deletes & inserts --
        ("delete-char-prev", "Delete the previous character", DeleteShorthand(M::CharPrev)),
        ("delete-char-next", "Delete the next character", DeleteShorthand(M::CharNext)),
        ("delete-line-begin", "Delete to the start of the line", DeleteShorthand(M::LineBegin)),
        ("delete-word-prev", "Delete the previous WORD", DeleteShorthand(M::LongwordStartPrev)),
        ("insert-newline", "Insert a line break", InsertNewline),
        ("insert-tab", "Insert a tab", InsertTab),
        ("insert-verbatim", "Insert a rune or byte from its code", InsertVerbatim),
        ("insert-register", "Insert the given register's content", InsertRegister),
        ("replace-char", "Replace the character under the cursor", ReplaceChar),
        // -- History --
        ("editor-undo", "Undo the last change", Undo),
        ("editor-redo", "Redo the last undone change", Redo),
        ("editor-earlier", "Go to an older text state", Earlier),
        ("editor-later", "Go to a newer text state", Later),
        ("editor-repeat", "Repeat the latest editor command", Repeat),
        // -- Macros --
        ("macro-record", "Record a macro into the given register", MacroRecord),
        ("macro-replay", "Replay the macro in the given register", MacroReplay),
        // -- Selections & cursors --
        ("selection-flip", "Move the cursor to the other end of the selection", SelectionFlip),
        ("selection-restore", "Restore the last selection", SelectionRestore),
        ("cursors-select-word", "Select the word under every cursor", CursorsSelectWord),
        ("cursors-new-match-next", "Select the next region matching the selection", CursorsNewMatchNext),
        ("cursors-new-match-skip", "Move the selection to the next match", CursorsNewMatchSkip),
        ("cursors-align", "Align all cursors on the same column", CursorsAlign),
        ("cursors-remove-all", "Remove all but the primary cursor", CursorsRemoveAll),
        ("cursors-remove-last", "Remove the primary cursor", CursorsRemoveLast),
        ("cursors-new-line-above", "Create a cursor on the line above", CursorsNewLine(VerticalDir::Above)),
        ("cursors-new-line-below", "Create a cursor on the line below", CursorsNewLine(VerticalDir::Below)),
        // -- Window --
        ("window-page-up", "Scroll a page up", Scroll(ScrollDir::Up, ScrollAmount::Page)),
        ("window-page-down", "Scroll a page down", Scroll(ScrollDir::Down, ScrollAmount::Page)),
        ("window-halfpage-up", "Scroll half a page up", Scroll(ScrollDir::Up, ScrollAmount::HalfPage)),
        ("window-halfpage-down", "Scroll half a page down", Scroll(ScrollDir::Down, ScrollAmount::HalfPage)),
        ("window-slide-up", "Slide window content up", Slide(ScrollDir::Up)),
        ("window-slide-down", "Slide window content down", Slide(ScrollDir::Down)),
        ("window-redraw-top", "Redraw with the cursor line at the top", RedrawAt(ScreenAnchor::Top)),
        ("window-redraw-center", "Redraw with the cursor line centered", RedrawAt(ScreenAnchor::Center)),
        ("window-redraw-bottom", "Redraw with the cursor line at the bottom", RedrawAt(ScreenAnchor::Bottom)),
        // -- Prompt --
        ("prompt-show", "Show the command prompt", PromptCmd("")),
        ("prompt-show-visual", "Show the command prompt with the selection range", PromptCmd("'<,'>")),
        ("search-forward", "Search forward", PromptSearch(Direction::Forward)),
        ("search-backward", "Search backward", PromptSearch(Direction::Backward)),
        ("prompt-enter", "Execute the prompt content", PromptEnter),
        ("prompt-backspace", "Delete the previous prompt character", PromptBackspace),
        ("prompt-delete", "Delete the prompt character under the cursor", PromptDelete),
        ("prompt-cursor-left", "Move the prompt cursor left", PromptMove(self::PromptMove::Left)),
        ("prompt-cursor-right", "Move the prompt cursor right", PromptMove(self::PromptMove::Right)),
        ("prompt-cursor-home", "Move the prompt cursor to the start", PromptMove(self::PromptMove::Home)),
        ("prompt-cursor-end", "Move the prompt cursor to the end", PromptMove(self::PromptMove::End)),
        // -- Editor --
        ("editor-suspend", "Suspend the editor", Suspend),
        ("editor-redraw", "Redraw the editor content", Redraw),
        // -- Kind overrides --
        ("motion-charwise", "Force the motion to be charwise", KindOverride(TextKind::Charwise)),
        ("motion-linewise", "Force the motion to be linewise", KindOverride(TextKind::Linewise)),
        // -- Text objects --
        ("text-object-word-inner", "A word, whitespace excluded", TextObject(T::WordInner)),
        ("text-object-word-outer", "A word, whitespace included", TextObject(T::WordOuter)),
        ("text-object-longword-inner", "A WORD, whitespace excluded", TextObject(T::LongwordInner)),
        ("text-object-longword-outer", "A WORD, whitespace included", TextObject(T::LongwordOuter)),
        ("text-object-sentence-inner", "A sentence", TextObject(T::SentenceInner)),
        ("text-object-sentence-outer", "A sentence, trailing space included", TextObject(T::SentenceOuter)),
        ("text-object-paragraph-inner", "A paragraph", TextObject(T::ParagraphInner)),
        ("text-object-paragraph-outer", "A paragraph, blank lines included", TextObject(T::ParagraphOuter)),
        ("text-object-parentheses-inner", "() block, inner variant", TextObject(T::ParenInner)),
        ("text-object-parentheses-outer", "() block, outer variant", TextObject(T::ParenOuter)),
        ("text-object-square-bracket-inner", "[] block, inner variant", TextObject(T::SquareInner)),
        ("text-object-square-bracket-outer", "[] block, outer variant", TextObject(T::SquareOuter)),
        ("text-object-curly-bracket-inner", "{} block, inner variant", TextObject(T::CurlyInner)),
        ("text-object-curly-bracket-outer", "{} block, outer variant", TextObject(T::CurlyOuter)),
        ("text-object-angle-bracket-inner", "<> block, inner variant", TextObject(T::AngleInner)),
        ("text-object-angle-bracket-outer", "<> block, outer variant", TextObject(T::AngleOuter)),
        ("text-object-quote-inner", "A quoted string, quotes excluded", TextObject(T::QuoteInner)),
        ("text-object-quote-outer", "A quoted string, quotes included", TextObject(T::QuoteOuter)),
        ("text-object-single-quote-inner", "A single-quoted string, quotes excluded", TextObject(T::SingleQuoteInner)),
        ("text-object-single-quote-outer", "A single-quoted string, quotes included", TextObject(T::SingleQuoteOuter)),
        ("text-object-backtick-inner", "A backtick string, backticks excluded", TextObject(T::BacktickInner)),
        ("text-object-backtick-outer", "A backtick string, backticks included", TextObject(T::BacktickOuter)),
        ("text-object-entire-inner", "The whole text, blank edges excluded", TextObject(T::EntireInner)),
        ("text-object-entire-outer", "The whole text", TextObject(T::EntireOuter)),
        ("text-object-function-inner", "A C-like function body", TextObject(T::FunctionInner)),
        ("text-object-function-outer", "A whole C-like function", TextObject(T::FunctionOuter)),
        ("text-object-line-inner", "The line, surrounding whitespace excluded", TextObject(T::LineInner)),
        ("text-object-line-outer", "The whole line", TextObject(T::LineOuter)),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
