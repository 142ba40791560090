//! Conversation transcript model
//!
//! Append-only ordered log of turns, scoped to exactly one session and
//! discarded in full with it. Turns are never reordered or deleted; the only
//! mutation besides append is extending the in-flight assistant turn.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in the transcript. Position in the transcript vector is the
/// monotonic creation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("no turn to extend")]
    Empty,
    #[error("last turn is not an assistant turn")]
    NotAssistant,
}

/// Append-only sequence of turns.
#[derive(Debug, Default, Serialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Extend the last turn's content. Valid only while the last turn is the
    /// in-flight assistant turn.
    pub fn extend_last(&mut self, text: &str) -> Result<&Turn, TranscriptError> {
        let last = self.turns.last_mut().ok_or(TranscriptError::Empty)?;
        if last.role != Role::Assistant {
            return Err(TranscriptError::NotAssistant);
        }
        last.content.push_str(text);
        Ok(last)
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_preserves_order() {
        let mut t = Transcript::new();
        t.append(Turn::assistant("greeting"));
        t.append(Turn::user("question"));
        t.append(Turn::assistant("answer"));
        let roles: Vec<Role> = t.turns().iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![Role::Assistant, Role::User, Role::Assistant]);
    }

    #[test]
    fn extend_last_grows_assistant_turn() {
        let mut t = Transcript::new();
        t.append(Turn::assistant(""));
        t.extend_last("Hel").unwrap();
        t.extend_last("lo").unwrap();
        assert_eq!(t.turns().last().unwrap().content, "Hello");
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn extend_last_rejects_user_turn() {
        let mut t = Transcript::new();
        t.append(Turn::user("question"));
        assert_eq!(t.extend_last("x"), Err(TranscriptError::NotAssistant));
        assert_eq!(t.turns().last().unwrap().content, "question");
    }

    #[test]
    fn extend_last_rejects_empty_transcript() {
        let mut t = Transcript::new();
        assert_eq!(t.extend_last("x"), Err(TranscriptError::Empty));
    }
}
