//! Registers — named byte buffers for yank, delete, put, and macros.
//!
//! Every yank and delete writes a register; put reads one. A register
//! remembers whether its text was captured character-wise or line-wise,
//! because put behaves differently for each:
//!
//! - **Charwise**: put inserts inline at the cursor position.
//! - **Linewise**: put inserts whole lines below (`p`) or above (`P`).
//!
//! ## Register ids
//!
//! | Id        | Meaning                                             |
//! |-----------|-----------------------------------------------------|
//! | `"`       | The unnamed register — the default for every write. |
//! | `a`–`z`   | Named registers; `A`–`Z` append to the lowercase.   |
//! | `/`       | The last search pattern.                            |
//! | `:`       | The last `:` command line.                          |
//! | `@`       | The last recorded macro.                            |
//!
//! Multi-cursor yanks additionally store one slice per cursor so that a
//! subsequent multi-cursor put can distribute them back, one slice per
//! cursor, when the cursor counts match.

use crate::position::TextKind;

// ---------------------------------------------------------------------------
// RegisterId
// ---------------------------------------------------------------------------

/// A register name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterId {
    /// `"` — the default register.
    Unnamed,
    /// `a`–`z`.
    Named(char),
    /// `/` — last search pattern.
    Search,
    /// `:` — last command line.
    Command,
    /// `@` — last recorded macro.
    Macro,
}

impl RegisterId {
    /// Parse a register id from its key character. Uppercase letters map to
    /// their lowercase register (the append flag is separate, see
    /// [`RegisterFile::write`]). Returns `None` for unknown characters.
    #[must_use]
    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            '"' => Some(Self::Unnamed),
            'a'..='z' => Some(Self::Named(ch)),
            'A'..='Z' => Some(Self::Named(ch.to_ascii_lowercase())),
            '/' => Some(Self::Search),
            ':' => Some(Self::Command),
            '@' => Some(Self::Macro),
            _ => None,
        }
    }

    /// True when the key character requests append mode (`A`–`Z`).
    #[must_use]
    pub const fn is_append_char(ch: char) -> bool {
        ch.is_ascii_uppercase()
    }
}

// ---------------------------------------------------------------------------
// Register
// ---------------------------------------------------------------------------

/// A single register slot — text, capture kind, and per-cursor slices.
#[derive(Debug, Clone, Default)]
pub struct Register {
    /// The stored text. Empty when nothing has been yanked yet.
    content: String,

    /// How the text was captured.
    kind: TextKind,

    /// Per-cursor slices from a multi-cursor yank. Empty after a
    /// single-cursor write.
    slices: Vec<String>,
}

impl Register {
    /// Create an empty register.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            content: String::new(),
            kind: TextKind::Charwise,
            slices: Vec::new(),
        }
    }

    /// Store text, replacing any previous content.
    pub fn set(&mut self, text: String, kind: TextKind) {
        self.content = text;
        self.kind = kind;
        self.slices.clear();
    }

    /// Store a multi-cursor yank: the joined text plus one slice per cursor.
    pub fn set_slices(&mut self, slices: Vec<String>, kind: TextKind) {
        self.content = match kind {
            TextKind::Linewise => slices.concat(),
            TextKind::Charwise => slices.join("\n"),
        };
        self.kind = kind;
        self.slices = slices;
    }

    /// Append text (for uppercase register names).
    ///
    /// If either side is linewise, the register becomes linewise and a
    /// newline separator is ensured between the parts.
    pub fn append(&mut self, text: &str, kind: TextKind) {
        if kind.is_linewise() || self.kind.is_linewise() {
            if !self.content.is_empty() && !self.content.ends_with('\n') {
                self.content.push('\n');
            }
            self.content.push_str(text);
            self.kind = TextKind::Linewise;
        } else {
            self.content.push_str(text);
        }
        self.slices.clear();
    }

    /// The stored text.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// How the text was captured.
    #[must_use]
    pub const fn kind(&self) -> TextKind {
        self.kind
    }

    /// Per-cursor slices from the last multi-cursor yank, if any.
    #[must_use]
    pub fn slices(&self) -> &[String] {
        &self.slices
    }

    /// True when the register has no content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

// ---------------------------------------------------------------------------
// RegisterFile
// ---------------------------------------------------------------------------

/// The complete register file.
///
/// Writes target the unnamed register unless the command selected a specific
/// one; reads fall back to the unnamed register for unknown ids.
#[derive(Debug)]
pub struct RegisterFile {
    unnamed: Register,
    named: [Register; 26],
    search: Register,
    command: Register,
    macro_reg: Register,
}

impl RegisterFile {
    /// Create a register file with all registers empty.
    #[must_use]
    pub fn new() -> Self {
        Self {
            unnamed: Register::new(),
            named: std::array::from_fn(|_| Register::new()),
            search: Register::new(),
            command: Register::new(),
            macro_reg: Register::new(),
        }
    }

    /// The register for an id (`None` means the unnamed register).
    #[must_use]
    pub fn get(&self, id: Option<RegisterId>) -> &Register {
        match id.unwrap_or(RegisterId::Unnamed) {
            RegisterId::Unnamed => &self.unnamed,
            RegisterId::Named(ch) => &self.named[(ch as u8 - b'a') as usize],
            RegisterId::Search => &self.search,
            RegisterId::Command => &self.command,
            RegisterId::Macro => &self.macro_reg,
        }
    }

    fn get_mut(&mut self, id: Option<RegisterId>) -> &mut Register {
        match id.unwrap_or(RegisterId::Unnamed) {
            RegisterId::Unnamed => &mut self.unnamed,
            RegisterId::Named(ch) => &mut self.named[(ch as u8 - b'a') as usize],
            RegisterId::Search => &mut self.search,
            RegisterId::Command => &mut self.command,
            RegisterId::Macro => &mut self.macro_reg,
        }
    }

    /// Write text to a register. `append` corresponds to an uppercase
    /// register name.
    pub fn write(&mut self, id: Option<RegisterId>, text: String, kind: TextKind, append: bool) {
        let reg = self.get_mut(id);
        if append {
            reg.append(&text, kind);
        } else {
            reg.set(text, kind);
        }
    }

    /// Write a multi-cursor yank: the joined text plus per-cursor slices.
    pub fn write_slices(&mut self, id: Option<RegisterId>, slices: Vec<String>, kind: TextKind) {
        self.get_mut(id).set_slices(slices, kind);
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── RegisterId ──────────────────────────────────────────────────────

    #[test]
    fn parse_ids() {
        assert_eq!(RegisterId::from_char('"'), Some(RegisterId::Unnamed));
        assert_eq!(RegisterId::from_char('a'), Some(RegisterId::Named('a')));
        assert_eq!(RegisterId::from_char('Z'), Some(RegisterId::Named('z')));
        assert_eq!(RegisterId::from_char('/'), Some(RegisterId::Search));
        assert_eq!(RegisterId::from_char(':'), Some(RegisterId::Command));
        assert_eq!(RegisterId::from_char('@'), Some(RegisterId::Macro));
        assert_eq!(RegisterId::from_char('!'), None);
        assert_eq!(RegisterId::from_char('1'), None);
    }

    #[test]
    fn append_chars() {
        assert!(RegisterId::is_append_char('A'));
        assert!(!RegisterId::is_append_char('a'));
        assert!(!RegisterId::is_append_char('"'));
    }

    // ── Register slot ───────────────────────────────────────────────────

    #[test]
    fn new_register_is_empty() {
        let reg = Register::new();
        assert!(reg.is_empty());
        assert_eq!(reg.content(), "");
        assert_eq!(reg.kind(), TextKind::Charwise);
    }

    #[test]
    fn set_replaces_content_and_kind() {
        let mut reg = Register::new();
        reg.set("first".into(), TextKind::Charwise);
        reg.set("second\n".into(), TextKind::Linewise);
        assert_eq!(reg.content(), "second\n");
        assert_eq!(reg.kind(), TextKind::Linewise);
    }

    #[test]
    fn append_char_to_char() {
        let mut reg = Register::new();
        reg.set("foo".into(), TextKind::Charwise);
        reg.append("bar", TextKind::Charwise);
        assert_eq!(reg.content(), "foobar");
        assert_eq!(reg.kind(), TextKind::Charwise);
    }

    #[test]
    fn append_line_upgrades_kind() {
        let mut reg = Register::new();
        reg.set("first".into(), TextKind::Charwise);
        reg.append("second\n", TextKind::Linewise);
        assert_eq!(reg.content(), "first\nsecond\n");
        assert_eq!(reg.kind(), TextKind::Linewise);
    }

    #[test]
    fn append_char_to_line_stays_line() {
        let mut reg = Register::new();
        reg.set("first\n".into(), TextKind::Linewise);
        reg.append("second", TextKind::Charwise);
        assert_eq!(reg.content(), "first\nsecond");
        assert_eq!(reg.kind(), TextKind::Linewise);
    }

    #[test]
    fn set_clears_slices() {
        let mut reg = Register::new();
        reg.set_slices(vec!["a".into(), "b".into()], TextKind::Charwise);
        assert_eq!(reg.slices().len(), 2);
        reg.set("plain".into(), TextKind::Charwise);
        assert!(reg.slices().is_empty());
    }

    #[test]
    fn slices_join_charwise_with_newlines() {
        let mut reg = Register::new();
        reg.set_slices(vec!["foo".into(), "bar".into()], TextKind::Charwise);
        assert_eq!(reg.content(), "foo\nbar");
    }

    #[test]
    fn slices_concat_linewise() {
        let mut reg = Register::new();
        reg.set_slices(vec!["foo\n".into(), "bar\n".into()], TextKind::Linewise);
        assert_eq!(reg.content(), "foo\nbar\n");
    }

    #[test]
    fn unicode_content() {
        let mut reg = Register::new();
        reg.set("日本語 🎉".into(), TextKind::Charwise);
        assert_eq!(reg.content(), "日本語 🎉");
    }

    // ── RegisterFile ────────────────────────────────────────────────────

    #[test]
    fn file_starts_empty() {
        let rf = RegisterFile::new();
        assert!(rf.get(None).is_empty());
        for ch in 'a'..='z' {
            assert!(rf.get(RegisterId::from_char(ch)).is_empty());
        }
        assert!(rf.get(Some(RegisterId::Search)).is_empty());
    }

    #[test]
    fn write_unnamed_by_default() {
        let mut rf = RegisterFile::new();
        rf.write(None, "hello".into(), TextKind::Charwise, false);
        assert_eq!(rf.get(None).content(), "hello");
    }

    #[test]
    fn write_named_does_not_touch_unnamed() {
        let mut rf = RegisterFile::new();
        rf.write(None, "default".into(), TextKind::Charwise, false);
        rf.write(
            Some(RegisterId::Named('a')),
            "named".into(),
            TextKind::Linewise,
            false,
        );
        assert_eq!(rf.get(Some(RegisterId::Named('a'))).content(), "named");
        // Selecting a register redirects the write away from the unnamed one.
        assert_eq!(rf.get(None).content(), "default");
    }

    #[test]
    fn named_registers_are_isolated() {
        let mut rf = RegisterFile::new();
        rf.write(Some(RegisterId::Named('a')), "alpha".into(), TextKind::Charwise, false);
        rf.write(Some(RegisterId::Named('b')), "bravo".into(), TextKind::Charwise, false);
        assert_eq!(rf.get(Some(RegisterId::Named('a'))).content(), "alpha");
        assert_eq!(rf.get(Some(RegisterId::Named('b'))).content(), "bravo");
    }

    #[test]
    fn uppercase_appends() {
        let mut rf = RegisterFile::new();
        rf.write(Some(RegisterId::Named('a')), "hello".into(), TextKind::Charwise, false);
        rf.write(Some(RegisterId::Named('a')), " world".into(), TextKind::Charwise, true);
        assert_eq!(rf.get(Some(RegisterId::Named('a'))).content(), "hello world");
    }

    #[test]
    fn append_to_empty_register() {
        let mut rf = RegisterFile::new();
        rf.write(Some(RegisterId::Named('q')), "first".into(), TextKind::Charwise, true);
        assert_eq!(rf.get(Some(RegisterId::Named('q'))).content(), "first");
    }

    #[test]
    fn special_registers_roundtrip() {
        let mut rf = RegisterFile::new();
        rf.write(Some(RegisterId::Search), "pattern".into(), TextKind::Charwise, false);
        rf.write(Some(RegisterId::Command), "w file".into(), TextKind::Charwise, false);
        rf.write(Some(RegisterId::Macro), "dwj".into(), TextKind::Charwise, false);
        assert_eq!(rf.get(Some(RegisterId::Search)).content(), "pattern");
        assert_eq!(rf.get(Some(RegisterId::Command)).content(), "w file");
        assert_eq!(rf.get(Some(RegisterId::Macro)).content(), "dwj");
    }

    #[test]
    fn write_then_read_preserves_kind() {
        let mut rf = RegisterFile::new();
        for (id, kind) in [
            (None, TextKind::Linewise),
            (Some(RegisterId::Named('x')), TextKind::Charwise),
        ] {
            rf.write(id, "text".into(), kind, false);
            assert_eq!(rf.get(id).content(), "text");
            assert_eq!(rf.get(id).kind(), kind);
        }
    }

    #[test]
    fn write_slices_stores_both_forms() {
        let mut rf = RegisterFile::new();
        rf.write_slices(
            None,
            vec!["one".into(), "two".into(), "three".into()],
            TextKind::Charwise,
        );
        let reg = rf.get(None);
        assert_eq!(reg.content(), "one\ntwo\nthree");
        assert_eq!(reg.slices(), ["one", "two", "three"]);
    }
}
