//! Wire frame decoder
//!
//! Reassembles raw byte chunks into logical lines and classifies them into
//! protocol frames. Chunk boundaries carry no meaning: a chunk may end
//! mid-line, mid-frame, or mid-UTF-8 sequence, and the emitted frame
//! sequence must be identical for every possible chunking of the same bytes.
//!
//! The decoder holds no semantic state across calls beyond raw text
//! reassembly; correlating frames into an event stream is the dispatcher's
//! job.

/// One classified line from the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFrame {
    /// `event: <name>` — announces a new phase of the stream.
    EventTag(String),
    /// `data: <payload>` — one payload fragment, prefix stripped and
    /// surrounding whitespace trimmed.
    DataLine(String),
}

/// Incremental line decoder for one streaming call.
///
/// Created at stream start, fed every chunk in arrival order, discarded at
/// stream end or abort.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Unterminated partial line accumulated across chunk boundaries.
    residual: String,
    /// Trailing bytes of a multi-byte sequence split by a chunk boundary.
    utf8_carry: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk; returns every frame whose line completed in it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamFrame> {
        let text = self.decode(chunk);
        self.residual.push_str(&text);

        let mut frames = Vec::new();
        while let Some(pos) = self.residual.find('\n') {
            let mut line: String = self.residual.drain(..=pos).collect();
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
            if let Some(frame) = classify(&line) {
                frames.push(frame);
            }
        }
        frames
    }

    /// End of stream. A partial final line is not a valid frame and is
    /// discarded rather than surfaced.
    pub fn finish(self) -> Vec<StreamFrame> {
        if !self.residual.is_empty() || !self.utf8_carry.is_empty() {
            tracing::trace!(
                residual = %self.residual,
                carry_bytes = self.utf8_carry.len(),
                "discarding unterminated trailing input"
            );
        }
        Vec::new()
    }

    /// Decode `chunk` as UTF-8, joining it onto any carried partial
    /// sequence. A sequence left incomplete at the end of the chunk is
    /// carried to the next call; genuinely invalid bytes decode to U+FFFD.
    fn decode(&mut self, chunk: &[u8]) -> String {
        let joined;
        let mut rest: &[u8] = if self.utf8_carry.is_empty() {
            chunk
        } else {
            self.utf8_carry.extend_from_slice(chunk);
            joined = std::mem::take(&mut self.utf8_carry);
            &joined
        };

        let mut out = String::with_capacity(rest.len());
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    out.push_str(text);
                    break;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    out.push_str(std::str::from_utf8(&rest[..valid]).unwrap_or_default());
                    match err.error_len() {
                        // Invalid sequence in the middle: replace and move on.
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &rest[valid + bad..];
                        }
                        // Incomplete sequence at the end: carry it.
                        None => {
                            self.utf8_carry = rest[valid..].to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }
}

/// Classify one complete line.
///
/// Unknown frame kinds and blank separator lines are ignored rather than
/// treated as errors, so newer servers can add frames without breaking older
/// clients.
fn classify(line: &str) -> Option<StreamFrame> {
    if let Some(name) = line.strip_prefix("event:") {
        return Some(StreamFrame::EventTag(name.trim().to_string()));
    }
    if let Some(payload) = line.strip_prefix("data:") {
        return Some(StreamFrame::DataLine(payload.trim().to_string()));
    }
    if !line.is_empty() {
        tracing::trace!(line, "ignoring unrecognized frame");
    }
    None
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
    fn single_chunk_full_exchange() {
        let mut dec = FrameDecoder::new();
        let frames = dec.feed(b"event: start\ndata: start\n\ndata: Hello world\n\nevent: end\ndata: end\n\n");
        assert_eq!(
            frames,
            vec![
                tag("start"),
                data("start"),
                data("Hello world"),
                tag("end"),
                data("end"),
            ]
        );
        assert!(dec.finish().is_empty());
    }

    #[test]
    fn line_split_across_chunks() {
        let mut dec = FrameDecoder::new();
        assert_eq!(dec.feed(b"event: start\ndata: Hel"), vec![tag("start")]);
        assert_eq!(dec.feed(b"lo wor"), vec![]);
        assert_eq!(dec.feed(b"ld\n"), vec![data("Hello world")]);
        assert_eq!(dec.feed(b"event: end\n"), vec![tag("end")]);
    }

    #[test]
    fn chunk_without_terminator_only_grows_residual() {
        let mut dec = FrameDecoder::new();
        assert!(dec.feed(b"data: partial answer with no newline").is_empty());
    }

    #[test]
    fn many_terminators_in_one_chunk() {
        let mut dec = FrameDecoder::new();
        let frames = dec.feed(b"data: a\ndata: b\ndata: c\n");
        assert_eq!(frames, vec![data("a"), data("b"), data("c")]);
    }

    #[test]
    fn multibyte_character_split_across_chunks() {
        let text = "data: caf\u{e9} \u{1f4c4}\n";
        let bytes = text.as_bytes();
        // split inside the 4-byte emoji
        let cut = bytes.len() - 3;
        let mut dec = FrameDecoder::new();
        assert!(dec.feed(&bytes[..cut]).is_empty());
        assert_eq!(dec.feed(&bytes[cut..]), vec![data("caf\u{e9} \u{1f4c4}")]);
    }

    #[test]
    fn split_inside_data_prefix_token() {
        let mut dec = FrameDecoder::new();
        assert!(dec.feed(b"da").is_empty());
        assert!(dec.feed(b"ta: pay").is_empty());
        assert_eq!(dec.feed(b"load\n"), vec![data("payload")]);
    }

    #[test]
    fn crlf_terminator_tolerated() {
        let mut dec = FrameDecoder::new();
        assert_eq!(dec.feed(b"data: hi\r\n"), vec![data("hi")]);
    }

    #[test]
    fn unknown_and_blank_lines_ignored() {
        let mut dec = FrameDecoder::new();
        let frames = dec.feed(b": comment\n\nretry: 3000\ndata: kept\n");
        assert_eq!(frames, vec![data("kept")]);
    }

    #[test]
    fn finish_discards_partial_final_line() {
        let mut dec = FrameDecoder::new();
        assert!(dec.feed(b"data: complete\ndata: dangling").len() == 1);
        assert!(dec.finish().is_empty());
    }

    #[test]
    fn invalid_utf8_replaced_not_fatal() {
        let mut dec = FrameDecoder::new();
        let frames = dec.feed(b"data: a\xff b\n");
        assert_eq!(frames, vec![data("a\u{fffd} b")]);
    }
}
