//! Modes — how key tokens are interpreted.
//!
//! The editor is always in exactly one concrete mode. Each mode owns a key
//! map (see [`crate::keymap`]) and inherits from an ordered list of base
//! maps; binding lookup walks the chain and the first map that matches (or
//! reports a prefix) wins.
//!
//! The inheritance graph, bases rightward:
//!
//! ```text
//! NORMAL      → OPERATOR → MOVE → BASIC
//! OPERATOR    → OPERATOR-OPTION → TEXTOBJ → MOVE → BASIC
//! VISUAL      → OPERATOR → TEXTOBJ → MOVE → BASIC
//! VISUAL-LINE → VISUAL → …
//! INSERT      → READLINE → BASIC
//! REPLACE     → INSERT → …
//! PROMPT      → READLINE → BASIC
//! ```
//!
//! `BASIC` holds arrows/home/end/paging, `MOVE` the motions, `TEXTOBJ` the
//! `i`/`a` objects, `OPERATOR-OPTION` the `v`/`V` kind overrides, and
//! `OPERATOR` the operator keys. Text objects are reachable exactly where
//! they mean something: with an operator pending and in the visual modes.
//!
//! When no binding matches, the buffered keys go to the mode's *input
//! policy*: insert-like modes insert them as text, the prompt edits its
//! line, operator-pending cancels the command, and normal/visual drop them
//! silently.

use std::fmt;

// ---------------------------------------------------------------------------
// ModeId
// ---------------------------------------------------------------------------

/// Every mode, concrete and base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeId {
    /// Arrow keys, home/end, paging. The root of every chain.
    Basic,
    /// Motions.
    Move,
    /// Text objects (`i`/`a` pairs).
    TextObj,
    /// Motion-kind overrides (`v`/`V`) while an operator is pending.
    OperatorOption,
    /// Operator keys; also the mode active while an operator awaits its
    /// motion or text object.
    Operator,
    /// The default mode.
    Normal,
    /// Charwise selection.
    Visual,
    /// Linewise selection.
    VisualLine,
    /// Prompt-line editing keys.
    Readline,
    /// The `:` / `/` / `?` prompt.
    Prompt,
    /// Text entry.
    Insert,
    /// Overwriting text entry.
    Replace,
}

/// How a mode consumes keys that no binding matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputPolicy {
    /// Drop them silently.
    Drop,
    /// Insert them into the buffer at every cursor.
    InsertText,
    /// Overwrite the characters under every cursor.
    ReplaceText,
    /// Append them to the prompt line.
    PromptText,
    /// Cancel the pending command and return to the previous mode.
    CancelPending,
}

/// The total number of modes, for per-mode tables.
pub const MODE_COUNT: usize = 12;

impl ModeId {
    /// All modes, in table order. [`ModeId::index`] is the position here.
    pub const ALL: [Self; MODE_COUNT] = [
        Self::Basic,
        Self::Move,
        Self::TextObj,
        Self::OperatorOption,
        Self::Operator,
        Self::Normal,
        Self::Visual,
        Self::VisualLine,
        Self::Readline,
        Self::Prompt,
        Self::Insert,
        Self::Replace,
    ];

    /// Stable index for per-mode tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Basic => 0,
            Self::Move => 1,
            Self::TextObj => 2,
            Self::OperatorOption => 3,
            Self::Operator => 4,
            Self::Normal => 5,
            Self::Visual => 6,
            Self::VisualLine => 7,
            Self::Readline => 8,
            Self::Prompt => 9,
            Self::Insert => 10,
            Self::Replace => 11,
        }
    }

    /// The ordered lookup chain for this mode, itself first.
    #[must_use]
    pub const fn chain(self) -> &'static [Self] {
        use ModeId::*;
        match self {
            Basic => &[Basic],
            Move => &[Move, Basic],
            TextObj => &[TextObj, Move, Basic],
            OperatorOption => &[OperatorOption, TextObj, Move, Basic],
            Operator => &[Operator, OperatorOption, TextObj, Move, Basic],
            Normal => &[Normal, Operator, Move, Basic],
            Visual => &[Visual, Operator, TextObj, Move, Basic],
            VisualLine => &[VisualLine, Visual, Operator, TextObj, Move, Basic],
            Readline => &[Readline, Basic],
            Prompt => &[Prompt, Readline, Basic],
            Insert => &[Insert, Readline, Basic],
            Replace => &[Replace, Insert, Readline, Basic],
        }
    }

    /// What happens to keys no binding matched.
    #[must_use]
    pub const fn input_policy(self) -> InputPolicy {
        match self {
            Self::Insert => InputPolicy::InsertText,
            Self::Replace => InputPolicy::ReplaceText,
            Self::Prompt | Self::Readline => InputPolicy::PromptText,
            Self::Operator | Self::OperatorOption | Self::TextObj => InputPolicy::CancelPending,
            _ => InputPolicy::Drop,
        }
    }

    /// True for the selection modes.
    #[inline]
    #[must_use]
    pub const fn is_visual(self) -> bool {
        matches!(self, Self::Visual | Self::VisualLine)
    }

    /// True for modes the user can rest in. The others are transient lookup
    /// scopes (operator pending, bases).
    #[inline]
    #[must_use]
    pub const fn is_user(self) -> bool {
        matches!(
            self,
            Self::Normal | Self::Visual | Self::VisualLine | Self::Prompt | Self::Insert
                | Self::Replace
        )
    }

    /// True when the cursor may rest one past the last character of a line.
    #[inline]
    #[must_use]
    pub const fn cursor_past_end(self) -> bool {
        matches!(self, Self::Insert | Self::Replace | Self::Prompt)
    }

    /// The status-line text for this mode.
    #[must_use]
    pub const fn status(self) -> &'static str {
        match self {
            Self::Normal => "",
            Self::Visual => "--VISUAL--",
            Self::VisualLine => "--VISUAL LINE--",
            Self::Insert => "--INSERT--",
            Self::Replace => "--REPLACE--",
            Self::Prompt => "--PROMPT--",
            _ => "",
        }
    }
}

impl fmt::Display for ModeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Basic => "BASIC",
            Self::Move => "MOVE",
            Self::TextObj => "TEXT-OBJECTS",
            Self::OperatorOption => "OPERATOR-OPTION",
            Self::Operator => "OPERATOR",
            Self::Normal => "NORMAL",
            Self::Visual => "VISUAL",
            Self::VisualLine => "VISUAL LINE",
            Self::Readline => "READLINE",
            Self::Prompt => "PROMPT",
            Self::Insert => "INSERT",
            Self::Replace => "REPLACE",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_match_table_order() {
        for (i, mode) in ModeId::ALL.iter().enumerate() {
            assert_eq!(mode.index(), i);
        }
    }

    #[test]
    fn chains_start_with_self() {
        for mode in ModeId::ALL {
            assert_eq!(mode.chain()[0], mode, "{mode} chain starts with itself");
        }
    }

    #[test]
    fn chains_end_in_basic() {
        for mode in ModeId::ALL {
            assert_eq!(*mode.chain().last().unwrap(), ModeId::Basic);
        }
    }

    #[test]
    fn textobjects_reachable_where_meaningful() {
        // With an operator pending and in visual modes — nowhere else.
        assert!(ModeId::Operator.chain().contains(&ModeId::TextObj));
        assert!(ModeId::Visual.chain().contains(&ModeId::TextObj));
        assert!(ModeId::VisualLine.chain().contains(&ModeId::TextObj));
        assert!(!ModeId::Normal.chain().contains(&ModeId::TextObj));
        assert!(!ModeId::Insert.chain().contains(&ModeId::TextObj));
    }

    #[test]
    fn operator_keys_reachable_from_normal_and_visual() {
        assert!(ModeId::Normal.chain().contains(&ModeId::Operator));
        assert!(ModeId::Visual.chain().contains(&ModeId::Operator));
        assert!(!ModeId::Insert.chain().contains(&ModeId::Operator));
    }

    #[test]
    fn kind_overrides_only_while_operator_pending() {
        assert!(ModeId::Operator.chain().contains(&ModeId::OperatorOption));
        assert!(!ModeId::Normal.chain().contains(&ModeId::OperatorOption));
        assert!(!ModeId::Visual.chain().contains(&ModeId::OperatorOption));
    }

    #[test]
    fn input_policies() {
        assert_eq!(ModeId::Normal.input_policy(), InputPolicy::Drop);
        assert_eq!(ModeId::Visual.input_policy(), InputPolicy::Drop);
        assert_eq!(ModeId::Insert.input_policy(), InputPolicy::InsertText);
        assert_eq!(ModeId::Replace.input_policy(), InputPolicy::ReplaceText);
        assert_eq!(ModeId::Prompt.input_policy(), InputPolicy::PromptText);
        assert_eq!(ModeId::Operator.input_policy(), InputPolicy::CancelPending);
    }

    #[test]
    fn user_modes() {
        assert!(ModeId::Normal.is_user());
        assert!(ModeId::Insert.is_user());
        assert!(ModeId::Prompt.is_user());
        assert!(!ModeId::Operator.is_user());
        assert!(!ModeId::Move.is_user());
    }

    #[test]
    fn visual_classification() {
        assert!(ModeId::Visual.is_visual());
        assert!(ModeId::VisualLine.is_visual());
        assert!(!ModeId::Normal.is_visual());
    }

    #[test]
    fn cursor_past_end_modes() {
        assert!(ModeId::Insert.cursor_past_end());
        assert!(ModeId::Replace.cursor_past_end());
        assert!(!ModeId::Normal.cursor_past_end());
        assert!(!ModeId::Visual.cursor_past_end());
    }

    #[test]
    fn display_names() {
        assert_eq!(ModeId::Normal.to_string(), "NORMAL");
        assert_eq!(ModeId::VisualLine.to_string(), "VISUAL LINE");
        assert_eq!(ModeId::OperatorOption.to_string(), "OPERATOR-OPTION");
    }

    #[test]
    fn status_texts() {
        assert_eq!(ModeId::Normal.status(), "");
        assert_eq!(ModeId::Insert.status(), "--INSERT--");
        assert_eq!(ModeId::VisualLine.status(), "--VISUAL LINE--");
    }
}
