//! Property-based tests for the chat state machine

use super::state::ChatPhase;
use super::transition::{transition, TransitionError};
use super::{ChatEvent, Effect};
use crate::stream::StreamEvent;
use proptest::prelude::*;

// ============================================================================
// Generators
// ============================================================================

fn arb_phase() -> impl Strategy<Value = ChatPhase> {
    prop_oneof![
        Just(ChatPhase::NoDocument),
        Just(ChatPhase::DocumentReady),
        any::<bool>().prop_map(|answer_open| ChatPhase::AwaitingAnswer { answer_open }),
    ]
}

fn arb_stream_event() -> impl Strategy<Value = StreamEvent> {
    prop_oneof![
        Just(StreamEvent::Started),
        "[^\r\n]{0,30}".prop_map(StreamEvent::Delta),
        Just(StreamEvent::Ended),
        "[a-z ]{1,20}".prop_map(|reason| StreamEvent::Failed { reason }),
    ]
}

fn arb_event() -> impl Strategy<Value = ChatEvent> {
    prop_oneof![
        ("[a-z]{1,10}\\.pdf", "[a-zA-Z ]{0,40}").prop_map(|(filename, summary)| {
            ChatEvent::DocumentAccepted { filename, summary }
        }),
        "[a-z ]{1,30}".prop_map(|message| ChatEvent::UploadFailed { message }),
        "[a-z ?]{0,30}".prop_map(|text| ChatEvent::UserQuery { text }),
        arb_stream_event().prop_map(ChatEvent::Stream),
        Just(ChatEvent::Reset),
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Every accepted transition lands in a well-formed phase, and every
    /// rejection is one of the named error kinds — the machine never wedges.
    #[test]
    fn transitions_are_total_and_stable(phase in arb_phase(), event in arb_event()) {
        match transition(&phase, event) {
            Ok(result) => {
                let well_formed = matches!(
                    result.next,
                    ChatPhase::NoDocument
                        | ChatPhase::DocumentReady
                        | ChatPhase::AwaitingAnswer { .. }
                );
                prop_assert!(well_formed);
            }
            Err(
                TransitionError::Busy
                | TransitionError::EmptyQuery
                | TransitionError::NoDocument
                | TransitionError::Invalid(_),
            ) => {}
        }
    }

    /// A query is only ever accepted in `DocumentReady` with non-blank text,
    /// so at most one streaming call can be in flight.
    #[test]
    fn query_only_accepted_when_ready(phase in arb_phase(), text in "[a-z ?]{1,30}") {
        let blank = text.trim().is_empty();
        let accepted = transition(&phase, ChatEvent::UserQuery { text }).is_ok();
        prop_assert_eq!(accepted, phase.accepts_query() && !blank);
    }

    /// Terminal stream events always return the machine to `DocumentReady`.
    #[test]
    fn terminal_events_land_in_ready(answer_open in any::<bool>(), fail in any::<bool>()) {
        let event = if fail {
            StreamEvent::Failed { reason: "reason".to_string() }
        } else {
            StreamEvent::Ended
        };
        let result = transition(
            &ChatPhase::AwaitingAnswer { answer_open },
            ChatEvent::Stream(event),
        ).unwrap();
        prop_assert_eq!(result.next, ChatPhase::DocumentReady);
        prop_assert!(result.effects.contains(&Effect::SetInputEnabled(true)));
    }

    /// Reset is universal: from any phase it aborts, clears, and lands in
    /// `NoDocument`.
    #[test]
    fn reset_always_lands_in_no_document(phase in arb_phase()) {
        let result = transition(&phase, ChatEvent::Reset).unwrap();
        prop_assert_eq!(result.next, ChatPhase::NoDocument);
        prop_assert!(result.effects.contains(&Effect::AbortStream));
        prop_assert!(result.effects.contains(&Effect::ClearSession));
    }

    /// Deltas extend, never replace: the accumulated answer is exactly the
    /// concatenation of every delta in order.
    #[test]
    fn deltas_accumulate_in_order(
        deltas in proptest::collection::vec("[^\r\n]{0,15}", 0..8),
    ) {
        let mut phase = ChatPhase::AwaitingAnswer { answer_open: true };
        let mut content = String::new();
        for delta in &deltas {
            let result = transition(
                &phase,
                ChatEvent::Stream(StreamEvent::Delta(delta.clone())),
            ).unwrap();
            for effect in result.effects {
                if let Effect::ExtendAnswer { text } = effect {
                    content.push_str(&text);
                }
            }
            phase = result.next;
        }
        prop_assert_eq!(content, deltas.concat());
    }

    /// Stream events outside `AwaitingAnswer` never produce effects; chunks
    /// from an abandoned stream cannot disturb a fresh session.
    #[test]
    fn late_stream_events_have_no_effect(
        ready in any::<bool>(),
        event in arb_stream_event(),
    ) {
        let phase = if ready { ChatPhase::DocumentReady } else { ChatPhase::NoDocument };
        let result = transition(&phase, ChatEvent::Stream(event)).unwrap();
        prop_assert_eq!(result.next, phase);
        prop_assert!(result.effects.is_empty());
    }
}
