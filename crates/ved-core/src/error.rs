//! Recoverable editor errors.
//!
//! Every variant is recovered locally by the dispatch loop: the pending
//! command is discarded, the view is left unchanged, and the message is
//! surfaced on the UI's message line. Fatal conditions (I/O failures at
//! startup) are the host's business and never pass through here.

use thiserror::Error;

/// A recoverable failure of an editor command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// A key sequence the current mode rejects. Silently dropped in
    /// normal/visual modes, reported elsewhere.
    #[error("not a command: {0}")]
    InvalidInput(String),

    /// An operator was applied to nothing.
    #[error("empty range")]
    EmptyRange,

    /// Undo/redo/earlier/later past the end of history.
    #[error("already at {0} change")]
    NoHistory(&'static str),

    /// A register id that names no register, or an empty register where
    /// content was required.
    #[error("register {0:?} is empty")]
    MissingRegister(char),

    /// A mark id that is unset or was invalidated by a deletion.
    #[error("mark {0:?} is not set")]
    MissingMark(char),

    /// No search pattern has been set yet.
    #[error("no previous search pattern")]
    NoSearchPattern,
}

/// Result alias for editor commands.
pub type EditResult<T = ()> = Result<T, EditError>;
