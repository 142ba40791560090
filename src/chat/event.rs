//! Events that drive chat phase transitions

use crate::stream::StreamEvent;

/// Everything that can move the chat state machine.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    /// The upload collaborator reported success.
    DocumentAccepted { filename: String, summary: String },

    /// The upload collaborator reported failure (validation or transport).
    UploadFailed { message: String },

    /// The user submitted a query.
    UserQuery { text: String },

    /// One dispatched event from the in-flight answer stream.
    Stream(StreamEvent),

    /// Explicit reset: discard the session and return to `NoDocument`.
    Reset,
}
