//! Effects produced by chat transitions
//!
//! The transition function is pure; everything observable happens when the
//! runtime executes these.

use super::transcript::Role;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Show the accepted document's name and rendered initial summary.
    ShowDocument { filename: String, summary: String },

    /// Append a committed (immutable) turn to the transcript.
    AppendTurn { role: Role, content: String },

    /// Create the empty in-flight assistant turn that deltas will extend.
    OpenAnswer,

    /// Extend the in-flight assistant turn; the view re-renders from the
    /// full accumulated content, never from the fragment alone.
    ExtendAnswer { text: String },

    /// The in-flight assistant turn is complete; no further content.
    CommitAnswer,

    /// Issue the streaming call for this query, bound to the current session.
    IssueQuery { text: String },

    SetPending(bool),

    SetInputEnabled(bool),

    /// Inline status text (validation and upload failures).
    ShowStatus { message: String },

    /// Abandon any in-flight streaming read without awaiting it.
    AbortStream,

    /// Discard the session and transcript; clear UI inputs.
    ClearSession,
}

impl Effect {
    pub fn append_assistant(content: impl Into<String>) -> Self {
        Effect::AppendTurn {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn append_user(content: impl Into<String>) -> Self {
        Effect::AppendTurn {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn status(message: impl Into<String>) -> Self {
        Effect::ShowStatus {
            message: message.into(),
        }
    }
}
