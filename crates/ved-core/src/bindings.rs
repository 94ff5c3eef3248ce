//! Compiled-in default key bindings.
//!
//! One table per mode; concrete modes see their own table plus their
//! inheritance chain (see [`crate::mode`]). A binding maps a key sequence
//! (in the symbol grammar of [`crate::key`]) to an action name from the
//! registry, or to an alias that expands to other keys.

use crate::mode::ModeId;

/// One binding row: mode, key sequence, target.
pub struct BindingSpec {
    pub mode: ModeId,
    pub keys: &'static str,
    /// An action name, or with `alias = true`, a key sequence to expand.
    pub target: &'static str,
    pub alias: bool,
}

const fn bind(mode: ModeId, keys: &'static str, target: &'static str) -> BindingSpec {
    BindingSpec { mode, keys, target, alias: false }
}

const fn alias(mode: ModeId, keys: &'static str, target: &'static str) -> BindingSpec {
    BindingSpec { mode, keys, target, alias: true }
}

/// The complete default binding set.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn default_bindings() -> Vec<BindingSpec> {
    use ModeId::*;
    vec![
        // ── BASIC: keys that work everywhere ───────────────────────────────
        bind(Basic, "<Up>", "cursor-line-up"),
        bind(Basic, "<Down>", "cursor-line-down"),
        bind(Basic, "<Left>", "cursor-char-prev"),
        bind(Basic, "<Right>", "cursor-char-next"),
        bind(Basic, "<Home>", "cursor-line-begin"),
        bind(Basic, "<End>", "cursor-line-end"),
        bind(Basic, "<PageUp>", "window-page-up"),
        bind(Basic, "<PageDown>", "window-page-down"),
        // ── MOVE: motions ──────────────────────────────────────────────────
        bind(Move, "h", "cursor-char-prev"),
        bind(Move, "l", "cursor-char-next"),
        bind(Move, "j", "cursor-line-down"),
        bind(Move, "k", "cursor-line-up"),
        bind(Move, "w", "cursor-word-start-next"),
        bind(Move, "b", "cursor-word-start-prev"),
        bind(Move, "e", "cursor-word-end-next"),
        bind(Move, "ge", "cursor-word-end-prev"),
        bind(Move, "W", "cursor-longword-start-next"),
        bind(Move, "B", "cursor-longword-start-prev"),
        bind(Move, "E", "cursor-longword-end-next"),
        bind(Move, "gE", "cursor-longword-end-prev"),
        bind(Move, "0", "count"),
        bind(Move, "1", "count"),
        bind(Move, "2", "count"),
        bind(Move, "3", "count"),
        bind(Move, "4", "count"),
        bind(Move, "5", "count"),
        bind(Move, "6", "count"),
        bind(Move, "7", "count"),
        bind(Move, "8", "count"),
        bind(Move, "9", "count"),
        bind(Move, "^", "cursor-line-start"),
        bind(Move, "g_", "cursor-line-finish"),
        bind(Move, "$", "cursor-line-end"),
        bind(Move, "|", "cursor-column"),
        bind(Move, "gg", "cursor-line-first"),
        bind(Move, "G", "cursor-line-last"),
        bind(Move, "{", "cursor-paragraph-prev"),
        bind(Move, "}", "cursor-paragraph-next"),
        bind(Move, "(", "cursor-sentence-prev"),
        bind(Move, ")", "cursor-sentence-next"),
        bind(Move, "%", "cursor-match-bracket"),
        bind(Move, "f", "to-right"),
        bind(Move, "F", "to-left"),
        bind(Move, "t", "till-right"),
        bind(Move, "T", "till-left"),
        bind(Move, ";", "totill-repeat"),
        bind(Move, ",", "totill-reverse"),
        bind(Move, "n", "cursor-search-forward"),
        bind(Move, "N", "cursor-search-backward"),
        bind(Move, "*", "cursor-search-word-forward"),
        bind(Move, "#", "cursor-search-word-backward"),
        bind(Move, "`", "mark-goto"),
        bind(Move, "'", "mark-goto-line"),
        bind(Move, "<C-o>", "jumplist-prev"),
        bind(Move, "<C-i>", "jumplist-next"),
        bind(Move, "<Tab>", "jumplist-next"),
        bind(Move, "g;", "changelist-prev"),
        bind(Move, "g,", "changelist-next"),
        // ── TEXTOBJ: i/a objects ───────────────────────────────────────────
        bind(TextObj, "iw", "text-object-word-inner"),
        bind(TextObj, "aw", "text-object-word-outer"),
        bind(TextObj, "iW", "text-object-longword-inner"),
        bind(TextObj, "aW", "text-object-longword-outer"),
        bind(TextObj, "is", "text-object-sentence-inner"),
        bind(TextObj, "as", "text-object-sentence-outer"),
        bind(TextObj, "ip", "text-object-paragraph-inner"),
        bind(TextObj, "ap", "text-object-paragraph-outer"),
        bind(TextObj, "i(", "text-object-parentheses-inner"),
        bind(TextObj, "a(", "text-object-parentheses-outer"),
        bind(TextObj, "i)", "text-object-parentheses-inner"),
        bind(TextObj, "a)", "text-object-parentheses-outer"),
        bind(TextObj, "ib", "text-object-parentheses-inner"),
        bind(TextObj, "ab", "text-object-parentheses-outer"),
        bind(TextObj, "i[", "text-object-square-bracket-inner"),
        bind(TextObj, "a[", "text-object-square-bracket-outer"),
        bind(TextObj, "i]", "text-object-square-bracket-inner"),
        bind(TextObj, "a]", "text-object-square-bracket-outer"),
        bind(TextObj, "i{", "text-object-curly-bracket-inner"),
        bind(TextObj, "a{", "text-object-curly-bracket-outer"),
        bind(TextObj, "i}", "text-object-curly-bracket-inner"),
        bind(TextObj, "a}", "text-object-curly-bracket-outer"),
        bind(TextObj, "iB", "text-object-curly-bracket-inner"),
        bind(TextObj, "aB", "text-object-curly-bracket-outer"),
        bind(TextObj, "i<", "text-object-angle-bracket-inner"),
        bind(TextObj, "a<", "text-object-angle-bracket-outer"),
        bind(TextObj, "i>", "text-object-angle-bracket-inner"),
        bind(TextObj, "a>", "text-object-angle-bracket-outer"),
        bind(TextObj, "i\"", "text-object-quote-inner"),
        bind(TextObj, "a\"", "text-object-quote-outer"),
        bind(TextObj, "i'", "text-object-single-quote-inner"),
        bind(TextObj, "a'", "text-object-single-quote-outer"),
        bind(TextObj, "i`", "text-object-backtick-inner"),
        bind(TextObj, "a`", "text-object-backtick-outer"),
        bind(TextObj, "ie", "text-object-entire-inner"),
        bind(TextObj, "ae", "text-object-entire-outer"),
        bind(TextObj, "if", "text-object-function-inner"),
        bind(TextObj, "af", "text-object-function-outer"),
        bind(TextObj, "il", "text-object-line-inner"),
        bind(TextObj, "al", "text-object-line-outer"),
        // ── OPERATOR-OPTION: kind overrides while an operator is pending ──
        bind(OperatorOption, "v", "motion-charwise"),
        bind(OperatorOption, "V", "motion-linewise"),
        // ── OPERATOR: operator keys ────────────────────────────────────────
        bind(Operator, "d", "operator-delete"),
        bind(Operator, "c", "operator-change"),
        bind(Operator, "y", "operator-yank"),
        bind(Operator, "<", "operator-shift-left"),
        bind(Operator, ">", "operator-shift-right"),
        bind(Operator, "gu", "operator-case-lower"),
        bind(Operator, "gU", "operator-case-upper"),
        bind(Operator, "g~", "operator-case-swap"),
        bind(Operator, "p", "put-after"),
        bind(Operator, "P", "put-before"),
        bind(Operator, "gp", "put-after-end"),
        bind(Operator, "gP", "put-before-end"),
        bind(Operator, "\"", "register"),
        // ── NORMAL ─────────────────────────────────────────────────────────
        bind(Normal, "<Esc>", "mode-normal"),
        bind(Normal, "i", "insert-mode"),
        bind(Normal, "a", "append-char-next"),
        bind(Normal, "A", "append-line-end"),
        bind(Normal, "I", "insert-line-start"),
        bind(Normal, "o", "open-line-below"),
        bind(Normal, "O", "open-line-above"),
        bind(Normal, "v", "mode-visual-charwise"),
        bind(Normal, "V", "mode-visual-linewise"),
        bind(Normal, "R", "mode-replace"),
        bind(Normal, "r", "replace-char"),
        bind(Normal, "x", "delete-char-next"),
        bind(Normal, "X", "delete-char-prev"),
        alias(Normal, "D", "d$"),
        alias(Normal, "C", "c$"),
        alias(Normal, "Y", "yy"),
        alias(Normal, "s", "cl"),
        alias(Normal, "S", "cc"),
        bind(Normal, "J", "join-line-below"),
        bind(Normal, "u", "editor-undo"),
        bind(Normal, "<C-r>", "editor-redo"),
        bind(Normal, "g-", "editor-earlier"),
        bind(Normal, "g+", "editor-later"),
        bind(Normal, ".", "editor-repeat"),
        bind(Normal, "q", "macro-record"),
        bind(Normal, "@", "macro-replay"),
        bind(Normal, "m", "mark-set"),
        bind(Normal, "gv", "selection-restore"),
        bind(Normal, ":", "prompt-show"),
        bind(Normal, "/", "search-forward"),
        bind(Normal, "?", "search-backward"),
        bind(Normal, "<C-z>", "editor-suspend"),
        bind(Normal, "zt", "window-redraw-top"),
        bind(Normal, "zz", "window-redraw-center"),
        bind(Normal, "zb", "window-redraw-bottom"),
        bind(Normal, "<C-e>", "window-slide-down"),
        bind(Normal, "<C-y>", "window-slide-up"),
        bind(Normal, "<C-d>", "window-halfpage-down"),
        bind(Normal, "<C-u>", "window-halfpage-up"),
        bind(Normal, "<C-f>", "window-page-down"),
        bind(Normal, "<C-b>", "window-page-up"),
        bind(Normal, "<C-n>", "cursors-select-word"),
        bind(Normal, "<C-k>", "cursors-new-line-above"),
        bind(Normal, "<C-j>", "cursors-new-line-below"),
        bind(Normal, "<C-c>", "cursors-remove-all"),
        bind(Normal, "<C-p>", "cursors-remove-last"),
        // ── VISUAL ─────────────────────────────────────────────────────────
        bind(Visual, "<Esc>", "mode-normal"),
        bind(Visual, "v", "mode-normal"),
        bind(Visual, "V", "mode-visual-linewise"),
        bind(Visual, "o", "selection-flip"),
        bind(Visual, "gv", "selection-restore"),
        bind(Visual, "J", "join-lines"),
        alias(Visual, "x", "d"),
        alias(Visual, "s", "c"),
        bind(Visual, ":", "prompt-show-visual"),
        bind(Visual, "/", "search-forward"),
        bind(Visual, "?", "search-backward"),
        bind(Visual, "<C-n>", "cursors-new-match-next"),
        bind(Visual, "<C-x>", "cursors-new-match-skip"),
        bind(Visual, "<Tab>", "cursors-align"),
        bind(Visual, "<C-c>", "cursors-remove-all"),
        bind(Visual, "<C-p>", "cursors-remove-last"),
        // ── VISUAL LINE ────────────────────────────────────────────────────
        bind(VisualLine, "<Esc>", "mode-normal"),
        bind(VisualLine, "V", "mode-normal"),
        bind(VisualLine, "v", "mode-visual-charwise"),
        // ── READLINE: prompt-line editing ──────────────────────────────────
        bind(Readline, "<Enter>", "prompt-enter"),
        bind(Readline, "<Backspace>", "prompt-backspace"),
        bind(Readline, "<Del>", "prompt-delete"),
        bind(Readline, "<Left>", "prompt-cursor-left"),
        bind(Readline, "<Right>", "prompt-cursor-right"),
        bind(Readline, "<Home>", "prompt-cursor-home"),
        bind(Readline, "<End>", "prompt-cursor-end"),
        // ── PROMPT ─────────────────────────────────────────────────────────
        bind(Prompt, "<Esc>", "mode-normal"),
        bind(Prompt, "<C-c>", "mode-normal"),
        // ── INSERT ─────────────────────────────────────────────────────────
        bind(Insert, "<Esc>", "mode-normal"),
        bind(Insert, "<Enter>", "insert-newline"),
        bind(Insert, "<Tab>", "insert-tab"),
        bind(Insert, "<Backspace>", "delete-char-prev"),
        bind(Insert, "<Del>", "delete-char-next"),
        bind(Insert, "<C-w>", "delete-word-prev"),
        bind(Insert, "<C-u>", "delete-line-begin"),
        bind(Insert, "<C-r>", "insert-register"),
        bind(Insert, "<C-v>", "insert-verbatim"),
        // ── REPLACE (inherits INSERT) ──────────────────────────────────────
        bind(Replace, "<Esc>", "mode-normal"),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionTable;
    use std::collections::HashSet;

    #[test]
    fn every_binding_targets_a_known_action() {
        let table = ActionTable::with_defaults();
        for spec in default_bindings() {
            if !spec.alias {
                assert!(
                    table.get(spec.target).is_some(),
                    "binding {:?} in {:?} targets unknown action {:?}",
                    spec.keys,
                    spec.mode,
                    spec.target
                );
            }
        }
    }

    #[test]
    fn no_duplicate_sequences_within_a_mode() {
        let mut seen = HashSet::new();
        for spec in default_bindings() {
            assert!(
                seen.insert((spec.mode, spec.keys)),
                "duplicate binding {:?} in {:?}",
                spec.keys,
                spec.mode
            );
        }
    }

    #[test]
    fn digits_bound_to_count() {
        let bindings = default_bindings();
        for digit in '0'..='9' {
            let key = digit.to_string();
            assert!(bindings
                .iter()
                .any(|s| s.mode == ModeId::Move && s.keys == key && s.target == "count"));
        }
    }

    #[test]
    fn aliases_expand_to_bound_prefixes() {
        // Alias targets are key sequences, not action names; spot-check the
        // shorthands.
        let aliases: Vec<_> = default_bindings().into_iter().filter(|s| s.alias).collect();
        assert!(aliases.iter().any(|s| s.keys == "D" && s.target == "d$"));
        assert!(aliases.iter().any(|s| s.keys == "Y" && s.target == "yy"));
    }

    #[test]
    fn no_bare_prefix_conflicts() {
        // A sequence must not also be a strict prefix of another binding in
        // the same mode: the shorter one would always win.
        let bindings = default_bindings();
        for a in &bindings {
            for b in &bindings {
                if a.mode == b.mode && a.keys != b.keys {
                    assert!(
                        !b.keys.starts_with(a.keys),
                        "{:?} shadows {:?} in {:?}",
                        a.keys,
                        b.keys,
                        a.mode
                    );
                }
            }
        }
    }
}
