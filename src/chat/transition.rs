//! Pure phase transition function
//!
//! Given the same phase and event this always produces the same next phase
//! and effects, with no I/O. The runtime executes the effects and owns the
//! session, transcript, and view.

use super::{ChatEvent, ChatPhase, Effect, ANSWER_FAILED_PREFIX, GREETING};
use crate::stream::StreamEvent;
use thiserror::Error;

/// Result of a phase transition.
#[derive(Debug)]
pub struct TransitionResult {
    pub next: ChatPhase,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(next: ChatPhase) -> Self {
        Self {
            next,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Rejected events. The runtime drops `Busy` and `EmptyQuery` silently — a
/// submission while an answer streams is a no-op, as is a blank query — and
/// surfaces the rest as inline status.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("an answer is already streaming")]
    Busy,
    #[error("query is empty")]
    EmptyQuery,
    #[error("no document loaded")]
    NoDocument,
    #[error("invalid transition: {0}")]
    Invalid(String),
}

pub fn transition(
    phase: &ChatPhase,
    event: ChatEvent,
) -> Result<TransitionResult, TransitionError> {
    match (phase, event) {
        // ============================================================
        // Document lifecycle
        // ============================================================
        (ChatPhase::NoDocument, ChatEvent::DocumentAccepted { filename, summary }) => {
            Ok(TransitionResult::new(ChatPhase::DocumentReady)
                .with_effect(Effect::ShowDocument { filename, summary })
                .with_effect(Effect::append_assistant(GREETING))
                .with_effect(Effect::SetInputEnabled(true)))
        }

        (ChatPhase::NoDocument, ChatEvent::UploadFailed { message }) => {
            Ok(TransitionResult::new(ChatPhase::NoDocument).with_effect(Effect::status(message)))
        }

        // ============================================================
        // Query submission
        // ============================================================
        (ChatPhase::DocumentReady, ChatEvent::UserQuery { text }) => {
            let text = text.trim().to_string();
            if text.is_empty() {
                return Err(TransitionError::EmptyQuery);
            }
            Ok(
                TransitionResult::new(ChatPhase::AwaitingAnswer { answer_open: false })
                    .with_effect(Effect::append_user(text.clone()))
                    .with_effect(Effect::SetInputEnabled(false))
                    .with_effect(Effect::SetPending(true))
                    .with_effect(Effect::IssueQuery { text }),
            )
        }

        // At most one streaming call in flight; submission requires
        // DocumentReady.
        (ChatPhase::AwaitingAnswer { .. }, ChatEvent::UserQuery { .. }) => {
            Err(TransitionError::Busy)
        }

        (ChatPhase::NoDocument, ChatEvent::UserQuery { .. }) => Err(TransitionError::NoDocument),

        // ============================================================
        // Streamed answer integration
        // ============================================================
        (
            ChatPhase::AwaitingAnswer { answer_open: false },
            ChatEvent::Stream(StreamEvent::Started),
        ) => Ok(
            TransitionResult::new(ChatPhase::AwaitingAnswer { answer_open: true })
                .with_effect(Effect::SetPending(false))
                .with_effect(Effect::OpenAnswer),
        ),

        // Repeated `start` frames are tolerated; the first one already
        // opened the answer turn.
        (
            ChatPhase::AwaitingAnswer { answer_open: true },
            ChatEvent::Stream(StreamEvent::Started),
        ) => Ok(TransitionResult::new(ChatPhase::AwaitingAnswer {
            answer_open: true,
        })),

        (
            ChatPhase::AwaitingAnswer { answer_open: true },
            ChatEvent::Stream(StreamEvent::Delta(text)),
        ) => Ok(
            TransitionResult::new(ChatPhase::AwaitingAnswer { answer_open: true })
                .with_effect(Effect::ExtendAnswer { text }),
        ),

        // A delta before `start` is a protocol violation; drop it.
        (
            ChatPhase::AwaitingAnswer { answer_open: false },
            ChatEvent::Stream(StreamEvent::Delta(_)),
        ) => Ok(TransitionResult::new(ChatPhase::AwaitingAnswer {
            answer_open: false,
        })),

        (ChatPhase::AwaitingAnswer { answer_open }, ChatEvent::Stream(StreamEvent::Ended)) => {
            let mut result = TransitionResult::new(ChatPhase::DocumentReady);
            if !answer_open {
                // end without start: the pending indicator is still up
                result = result.with_effect(Effect::SetPending(false));
            } else {
                result = result.with_effect(Effect::CommitAnswer);
            }
            Ok(result.with_effect(Effect::SetInputEnabled(true)))
        }

        (
            ChatPhase::AwaitingAnswer { .. },
            ChatEvent::Stream(StreamEvent::Failed { reason }),
        ) => Ok(TransitionResult::new(ChatPhase::DocumentReady)
            .with_effect(Effect::SetPending(false))
            .with_effect(Effect::append_assistant(format!(
                "{ANSWER_FAILED_PREFIX}: {reason}. Please try again."
            )))
            .with_effect(Effect::SetInputEnabled(true))),

        // Late stream events — after completion or an abandoned stream —
        // are inert.
        (ChatPhase::NoDocument | ChatPhase::DocumentReady, ChatEvent::Stream(_)) => {
            Ok(TransitionResult::new(phase.clone()))
        }

        // ============================================================
        // Reset
        // ============================================================
        (_, ChatEvent::Reset) => Ok(TransitionResult::new(ChatPhase::NoDocument)
            .with_effect(Effect::AbortStream)
            .with_effect(Effect::ClearSession)),

        (phase, event) => Err(TransitionError::Invalid(format!(
            "no transition from {phase:?} on {event:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Role;

    fn accepted() -> ChatEvent {
        ChatEvent::DocumentAccepted {
            filename: "lease.pdf".to_string(),
            summary: "# Summary\nA lease.".to_string(),
        }
    }

    #[test]
    fn document_accepted_greets_and_enables_input() {
        let result = transition(&ChatPhase::NoDocument, accepted()).unwrap();
        assert_eq!(result.next, ChatPhase::DocumentReady);
        assert!(result
            .effects
            .iter()
            .any(|e| matches!(e, Effect::AppendTurn { role: Role::Assistant, content } if content.as_str() == GREETING)));
        assert!(result.effects.contains(&Effect::SetInputEnabled(true)));
    }

    #[test]
    fn upload_failure_stays_put_with_status() {
        let result = transition(
            &ChatPhase::NoDocument,
            ChatEvent::UploadFailed {
                message: "Invalid file type. Please upload a PDF.".to_string(),
            },
        )
        .unwrap();
        assert_eq!(result.next, ChatPhase::NoDocument);
        assert!(matches!(result.effects[..], [Effect::ShowStatus { .. }]));
    }

    #[test]
    fn query_appends_turn_and_issues_call() {
        let result = transition(
            &ChatPhase::DocumentReady,
            ChatEvent::UserQuery {
                text: "  what is the notice period?  ".to_string(),
            },
        )
        .unwrap();
        assert_eq!(result.next, ChatPhase::AwaitingAnswer { answer_open: false });
        assert!(result.effects.iter().any(
            |e| matches!(e, Effect::AppendTurn { role: Role::User, content } if content == "what is the notice period?")
        ));
        assert!(result
            .effects
            .iter()
            .any(|e| matches!(e, Effect::IssueQuery { text } if text == "what is the notice period?")));
    }

    #[test]
    fn blank_query_rejected_silently() {
        let err = transition(
            &ChatPhase::DocumentReady,
            ChatEvent::UserQuery {
                text: "   \t ".to_string(),
            },
        )
        .unwrap_err();
        assert_eq!(err, TransitionError::EmptyQuery);
    }

    #[test]
    fn query_while_streaming_is_busy() {
        for answer_open in [false, true] {
            let err = transition(
                &ChatPhase::AwaitingAnswer { answer_open },
                ChatEvent::UserQuery {
                    text: "another".to_string(),
                },
            )
            .unwrap_err();
            assert_eq!(err, TransitionError::Busy);
        }
    }

    #[test]
    fn started_opens_answer_once() {
        let result = transition(
            &ChatPhase::AwaitingAnswer { answer_open: false },
            ChatEvent::Stream(StreamEvent::Started),
        )
        .unwrap();
        assert_eq!(result.next, ChatPhase::AwaitingAnswer { answer_open: true });
        assert!(result.effects.contains(&Effect::OpenAnswer));

        let again = transition(
            &ChatPhase::AwaitingAnswer { answer_open: true },
            ChatEvent::Stream(StreamEvent::Started),
        )
        .unwrap();
        assert!(again.effects.is_empty());
    }

    #[test]
    fn delta_before_start_is_dropped() {
        let result = transition(
            &ChatPhase::AwaitingAnswer { answer_open: false },
            ChatEvent::Stream(StreamEvent::Delta("early".to_string())),
        )
        .unwrap();
        assert!(result.effects.is_empty());
        assert_eq!(result.next, ChatPhase::AwaitingAnswer { answer_open: false });
    }

    #[test]
    fn ended_returns_to_ready() {
        let result = transition(
            &ChatPhase::AwaitingAnswer { answer_open: true },
            ChatEvent::Stream(StreamEvent::Ended),
        )
        .unwrap();
        assert_eq!(result.next, ChatPhase::DocumentReady);
        assert!(result.effects.contains(&Effect::CommitAnswer));
        assert!(result.effects.contains(&Effect::SetInputEnabled(true)));
    }

    #[test]
    fn failure_appends_distinct_error_turn() {
        let result = transition(
            &ChatPhase::AwaitingAnswer { answer_open: true },
            ChatEvent::Stream(StreamEvent::Failed {
                reason: "connection reset".to_string(),
            }),
        )
        .unwrap();
        assert_eq!(result.next, ChatPhase::DocumentReady);
        assert!(result.effects.iter().any(|e| matches!(
            e,
            Effect::AppendTurn { role: Role::Assistant, content }
                if content.contains("connection reset")
        )));
    }

    #[test]
    fn reset_from_any_phase_clears_everything() {
        for phase in [
            ChatPhase::NoDocument,
            ChatPhase::DocumentReady,
            ChatPhase::AwaitingAnswer { answer_open: true },
        ] {
            let result = transition(&phase, ChatEvent::Reset).unwrap();
            assert_eq!(result.next, ChatPhase::NoDocument);
            assert!(result.effects.contains(&Effect::AbortStream));
            assert!(result.effects.contains(&Effect::ClearSession));
        }
    }

    #[test]
    fn late_stream_events_are_inert() {
        for phase in [ChatPhase::NoDocument, ChatPhase::DocumentReady] {
            for ev in [
                StreamEvent::Started,
                StreamEvent::Delta("late".to_string()),
                StreamEvent::Ended,
                StreamEvent::Failed {
                    reason: "late".to_string(),
                },
            ] {
                let result = transition(&phase, ChatEvent::Stream(ev)).unwrap();
                assert_eq!(result.next, phase);
                assert!(result.effects.is_empty());
            }
        }
    }
}
