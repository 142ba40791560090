//! Chat phase
//!
//! One instance per client, owned by the runtime and passed by reference to
//! the transition function — never ambient global state, so multiple
//! instances (tests, future tabs) stay trivial.

use serde::{Deserialize, Serialize};

/// The chat state machine's current mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatPhase {
    /// No document uploaded yet; input is limited to choosing a file.
    #[default]
    NoDocument,

    /// Document analyzed, awaiting user input.
    DocumentReady,

    /// One streaming answer in flight.
    AwaitingAnswer {
        /// Whether `Started` has arrived and opened the in-flight assistant
        /// turn. Deltas before that point are protocol violations and drop.
        answer_open: bool,
    },
}

impl ChatPhase {
    /// Whether a user query would be accepted right now.
    pub fn accepts_query(&self) -> bool {
        matches!(self, ChatPhase::DocumentReady)
    }
}
