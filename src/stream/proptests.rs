//! Property-based tests for the stream layer
//!
//! The load-bearing invariant: where chunk boundaries fall must never change
//! what the decoder produces.

use super::decoder::{FrameDecoder, StreamFrame};
use super::dispatch::{EventDispatcher, StreamEvent};
use proptest::prelude::*;

// ============================================================================
// Generators
// ============================================================================

/// One wire line, newline-free. Mixes well-formed frames, unknown kinds,
/// comments, and blanks the way a forward-compatible server might.
fn arb_wire_line() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("event: start".to_string()),
        Just("event: end".to_string()),
        Just("event: error".to_string()),
        "[a-z]{1,8}".prop_map(|t| format!("event: {t}")),
        "[^\r\n]{0,40}".prop_map(|p| format!("data: {p}")),
        Just("data: end".to_string()),
        Just(String::new()),
        "[a-z]{1,10}: [a-z0-9 ]{0,20}",
    ]
}

/// A complete wire text: terminated lines plus an optional dangling tail.
fn arb_wire_text() -> impl Strategy<Value = String> {
    (
        proptest::collection::vec(arb_wire_line(), 0..12),
        proptest::option::of("[^\r\n]{0,20}"),
    )
        .prop_map(|(lines, tail)| {
            let mut text = String::new();
            for line in lines {
                text.push_str(&line);
                text.push('\n');
            }
            if let Some(tail) = tail {
                text.push_str(&tail);
            }
            text
        })
}

fn arb_frame() -> impl Strategy<Value = StreamFrame> {
    prop_oneof![
        Just(StreamFrame::EventTag("start".to_string())),
        Just(StreamFrame::EventTag("end".to_string())),
        Just(StreamFrame::EventTag("error".to_string())),
        "[a-z]{1,8}".prop_map(StreamFrame::EventTag),
        "[^\r\n]{0,30}".prop_map(StreamFrame::DataLine),
        Just(StreamFrame::DataLine("end".to_string())),
    ]
}

fn decode_all(bytes: &[u8], cuts: &[usize]) -> Vec<StreamFrame> {
    let mut dec = FrameDecoder::new();
    let mut frames = Vec::new();
    let mut prev = 0;
    for &cut in cuts {
        frames.extend(dec.feed(&bytes[prev..cut]));
        prev = cut;
    }
    frames.extend(dec.feed(&bytes[prev..]));
    frames.extend(dec.finish());
    frames
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// For all chunk boundaries inserted into a given byte stream — including
    /// inside a multi-byte character or the `data:` prefix token — the frame
    /// sequence is identical.
    #[test]
    fn frame_sequence_invariant_under_chunking(
        wire in arb_wire_text(),
        cut_picks in proptest::collection::vec(any::<prop::sample::Index>(), 0..8),
    ) {
        let bytes = wire.as_bytes();
        let baseline = decode_all(bytes, &[]);

        let mut cuts: Vec<usize> = cut_picks
            .iter()
            .map(|ix| ix.index(bytes.len() + 1))
            .collect();
        cuts.sort_unstable();

        let chunked = decode_all(bytes, &cuts);
        prop_assert_eq!(baseline, chunked);
    }

    /// A trailing line without a terminator never becomes a frame.
    #[test]
    fn unterminated_tail_never_surfaces(tail in "[^\r\n]{1,40}") {
        let mut dec = FrameDecoder::new();
        let wire = format!("event: start\ndata: {tail}");
        let mut frames = dec.feed(wire.as_bytes());
        frames.extend(dec.finish());
        prop_assert_eq!(frames, vec![StreamFrame::EventTag("start".to_string())]);
    }

    /// Exactly zero or one terminal event per stream, and nothing after it.
    #[test]
    fn at_most_one_terminal_event_and_nothing_after(
        frames in proptest::collection::vec(arb_frame(), 0..24),
    ) {
        let mut dispatcher = EventDispatcher::new();
        let events: Vec<StreamEvent> = frames
            .into_iter()
            .filter_map(|f| dispatcher.dispatch(f))
            .collect();

        let terminals = events.iter().filter(|e| e.is_terminal()).count();
        prop_assert!(terminals <= 1);
        if let Some(pos) = events.iter().position(StreamEvent::is_terminal) {
            prop_assert_eq!(pos, events.len() - 1);
        }

        // Transport failure reported afterwards must not add a second one.
        let late = dispatcher.fail("socket closed");
        if terminals == 1 {
            prop_assert_eq!(late, None);
        }
    }

    /// Delta payloads surface with line-break markers converted and are never
    /// the reserved sentinel.
    #[test]
    fn deltas_decode_markers(payload in "[a-zA-Z0-9 ]{1,20}") {
        prop_assume!(payload != "end");
        let mut dispatcher = EventDispatcher::new();
        dispatcher.dispatch(StreamFrame::EventTag("start".to_string()));
        let wire_payload = format!("{payload}<br>{payload}");
        let ev = dispatcher.dispatch(StreamFrame::DataLine(wire_payload));
        prop_assert_eq!(
            ev,
            Some(StreamEvent::Delta(format!("{payload}\n{payload}")))
        );
    }
}
