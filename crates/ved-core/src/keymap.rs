//! Key maps — per-mode prefix tries of key sequences.
//!
//! Each mode owns a [`KeyMap`]: a trie from key sequences to entries. A
//! lookup distinguishes three outcomes the dispatch loop acts on:
//!
//! - [`Lookup::Exact`] — the sequence is bound; run the entry.
//! - [`Lookup::Prefix`] — the sequence is a proper prefix of some binding;
//!   buffer the keys and wait for more input.
//! - [`Lookup::Miss`] — nothing starts with this sequence; fall through to
//!   the next map in the mode's inheritance chain, or to the mode's default
//!   input handler.
//!
//! An entry either names an action or is an *alias* that expands to another
//! key sequence, replayed through the dispatcher.

use std::collections::HashMap;

use crate::key::Key;

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

/// What a key sequence is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// An action, by registry name.
    Action(&'static str),
    /// Another key sequence, fed back through the dispatcher.
    Alias(&'static str),
}

// ---------------------------------------------------------------------------
// KeyMap
// ---------------------------------------------------------------------------

/// The result of a trie lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<'a> {
    /// The sequence is bound to this entry.
    Exact(&'a Binding),
    /// The sequence is a proper prefix of at least one binding.
    Prefix,
    /// No binding starts with this sequence.
    Miss,
}

#[derive(Debug, Default)]
struct Node {
    binding: Option<Binding>,
    children: HashMap<Key, Node>,
}

/// A prefix trie over key sequences.
#[derive(Debug, Default)]
pub struct KeyMap {
    root: Node,
}

impl KeyMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a key sequence. A rebind replaces the previous entry.
    pub fn bind(&mut self, seq: &[Key], binding: Binding) {
        let mut node = &mut self.root;
        for key in seq {
            node = node.children.entry(*key).or_default();
        }
        node.binding = Some(binding);
    }

    /// Look up a key sequence.
    ///
    /// An exact binding wins even when longer bindings share the prefix —
    /// binding tables avoid that ambiguity by construction.
    #[must_use]
    pub fn lookup(&self, seq: &[Key]) -> Lookup<'_> {
        let mut node = &self.root;
        for key in seq {
            match node.children.get(key) {
                Some(next) => node = next,
                None => return Lookup::Miss,
            }
        }
        match &node.binding {
            Some(binding) => Lookup::Exact(binding),
            None if !node.children.is_empty() => Lookup::Prefix,
            None => Lookup::Miss,
        }
    }

    /// True when no sequences are bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty() && self.root.binding.is_none()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
