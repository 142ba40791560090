//! Session identity
//!
//! A session correlates one uploaded document with its conversation. The
//! identifier is generated client-side before the first network call and is
//! never reused after a reset.

use crate::chat::Transcript;
use chrono::Utc;

/// Opaque session identifier.
///
/// Time component + random salt. Collisions only risk a misrouted session,
/// not a security boundary, so this does not need to be cryptographic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        let millis = Utc::now().timestamp_millis();
        let salt: u64 = rand::random();
        Self(format!("{millis:x}-{salt:012x}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One document-analysis lifecycle: the identifier plus its transcript.
///
/// Dropped wholesale on reset; a fresh `Session` replaces it.
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    pub transcript: Transcript,
}

impl Session {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            transcript: Transcript::new(),
        }
    }
}
