//! Error taxonomy
//!
//! One error type with a kind classification instead of control flow via
//! exceptions: the state machine maps each kind to a transition, and the
//! decoder/dispatcher stay pure and independently testable.

use thiserror::Error;

/// Backend interaction error with classification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Rejected locally before any network call (wrong file type, unreadable
    /// file, empty query).
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Validation, message)
    }

    /// Network failure or non-success status on upload or query.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Transport, message)
    }

    /// Server-signaled failure inside an otherwise healthy stream.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Protocol, message)
    }
}

/// Classification for state-machine routing. No kind is fatal: every error
/// path returns to a stable, re-enterable phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    Validation,
    Transport,
    Protocol,
}
