//! Frame-to-event dispatch
//!
//! Interprets the ordered frame sequence of one streaming call as a typed
//! event stream with termination rules: at most one terminal event
//! (`Ended` or `Failed`) per stream, and nothing after it.

use super::StreamFrame;

/// Reserved payload literal marking logical completion of the answer text.
/// Distinct from the terminal `event: end` frame; never forwarded as a delta.
const END_SENTINEL: &str = "end";

/// Marker the wire uses for newlines inside a payload, since a raw newline
/// would itself be a frame separator.
const LINE_BREAK_MARKER: &str = "<br>";

const SERVER_ERROR_REASON: &str = "the server reported an error while generating the answer";

/// Typed events produced from the wire frames of one streaming call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Started,
    Delta(String),
    Ended,
    Failed { reason: String },
}

impl StreamEvent {
    #[allow(dead_code)] // State query utility, exercised by the property tests
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Ended | StreamEvent::Failed { .. })
    }
}

/// Per-stream dispatcher. Created alongside the decoder, discarded with it.
#[derive(Debug, Default)]
pub struct EventDispatcher {
    closed: bool,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a terminal event has been emitted. Once closed the consumer
    /// must stop reading chunks and release the connection; any frame still
    /// in flight is discarded here.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Map one frame to its event, if any.
    ///
    /// Repeated `start` tags are forwarded as-is — deduplication is the
    /// consumer's job, which treats later `Started` events as idempotent.
    pub fn dispatch(&mut self, frame: StreamFrame) -> Option<StreamEvent> {
        if self.closed {
            tracing::trace!(?frame, "frame after terminal event discarded");
            return None;
        }
        match frame {
            StreamFrame::EventTag(tag) => match tag.as_str() {
                "start" => Some(StreamEvent::Started),
                "end" => {
                    self.closed = true;
                    Some(StreamEvent::Ended)
                }
                "error" => {
                    self.closed = true;
                    Some(StreamEvent::Failed {
                        reason: SERVER_ERROR_REASON.to_string(),
                    })
                }
                other => {
                    tracing::trace!(tag = other, "ignoring unknown event tag");
                    None
                }
            },
            StreamFrame::DataLine(payload) => {
                if payload == END_SENTINEL {
                    return None;
                }
                Some(StreamEvent::Delta(
                    payload.replace(LINE_BREAK_MARKER, "\n"),
                ))
            }
        }
    }

    /// Report a transport-level failure (connection error, premature close).
    ///
    /// A no-op if the stream already ended, preserving the one-terminal-event
    /// guarantee.
    pub fn fail(&mut self, reason: impl Into<String>) -> Option<StreamEvent> {
        if self.closed {
            return None;
        }
        self.closed = true;
        Some(StreamEvent::Failed {
            reason: reason.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(name: &str) -> StreamFrame {
        StreamFrame::EventTag(name.to_string())
    }

    fn data(payload: &str) -> StreamFrame {
        StreamFrame::DataLine(payload.to_string())
    }

    #[test]
    fn happy_path_event_order() {
        let mut d = EventDispatcher::new();
        assert_eq!(d.dispatch(tag("start")), Some(StreamEvent::Started));
        assert_eq!(
            d.dispatch(data("Hello world")),
            Some(StreamEvent::Delta("Hello world".to_string()))
        );
        assert_eq!(d.dispatch(tag("end")), Some(StreamEvent::Ended));
        assert!(d.is_closed());
    }

    #[test]
    fn end_sentinel_payload_is_swallowed() {
        let mut d = EventDispatcher::new();
        d.dispatch(tag("start"));
        assert_eq!(d.dispatch(data("end")), None);
        assert!(!d.is_closed());
    }

    #[test]
    fn line_break_markers_become_newlines() {
        let mut d = EventDispatcher::new();
        assert_eq!(
            d.dispatch(data("one<br>two<br><br>three")),
            Some(StreamEvent::Delta("one\ntwo\n\nthree".to_string()))
        );
    }

    #[test]
    fn error_tag_is_terminal_and_server_attributed() {
        let mut d = EventDispatcher::new();
        let ev = d.dispatch(tag("error")).unwrap();
        assert!(matches!(ev, StreamEvent::Failed { ref reason } if reason.contains("server")));
        assert!(d.is_closed());
    }

    #[test]
    fn frames_after_terminal_are_discarded() {
        let mut d = EventDispatcher::new();
        d.dispatch(tag("end"));
        assert_eq!(d.dispatch(data("late")), None);
        assert_eq!(d.dispatch(tag("start")), None);
        assert_eq!(d.dispatch(tag("error")), None);
    }

    #[test]
    fn repeated_start_is_forwarded_not_rejected() {
        let mut d = EventDispatcher::new();
        assert_eq!(d.dispatch(tag("start")), Some(StreamEvent::Started));
        assert_eq!(d.dispatch(tag("start")), Some(StreamEvent::Started));
    }

    #[test]
    fn unknown_tags_ignored() {
        let mut d = EventDispatcher::new();
        assert_eq!(d.dispatch(tag("ping")), None);
        assert!(!d.is_closed());
    }

    #[test]
    fn fail_is_single_shot() {
        let mut d = EventDispatcher::new();
        assert!(d.fail("connection reset").is_some());
        assert_eq!(d.fail("again"), None);
        assert_eq!(d.dispatch(data("late")), None);
    }

    #[test]
    fn fail_after_end_is_noop() {
        let mut d = EventDispatcher::new();
        d.dispatch(tag("end"));
        assert_eq!(d.fail("socket closed"), None);
    }
}
