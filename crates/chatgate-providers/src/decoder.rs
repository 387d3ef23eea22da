//! Incremental decoder for `data:`-framed chat completion streams.
//!
//! Network chunks do not respect line boundaries, and a multi-byte UTF-8
//! character may be split across two chunks, so the decoder buffers raw
//! bytes and only decodes lines once their terminating `\n` has arrived.
//!
//! Line classification:
//! - blank lines are skipped
//! - `data: [DONE]` ends the stream
//! - `data: <json>` carries a delta and/or a finish reason
//! - anything else (comments, `event:` lines, keep-alives) is ignored
//!
//! The terminal event is emitted at most once per decoder. Content that
//! arrives after it is logged and dropped.

use tracing::{debug, trace, warn};

use chatgate_core::utils::truncate_string;

use crate::wire::ChatCompletionChunk;

/// Prefix of an event line.
pub const DATA_PREFIX: &str = "data: ";

/// Payload marking explicit stream completion.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Longest payload excerpt included in a decode warning.
const LOG_PAYLOAD_LIMIT: usize = 200;

/// A unit extracted from the stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamEvent {
    /// A non-empty fragment of generated text.
    Delta(String),
    /// No further content will arrive.
    Done,
}

/// Per-call decoder state. Create one for each streaming call.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    /// Bytes after the last complete line.
    partial: Vec<u8>,
    /// Whether [`StreamEvent::Done`] has been emitted.
    finished: bool,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the terminal event has already been emitted.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Feed one chunk of the response body and return the events completed
    /// by it, in order.
    ///
    /// Everything after the last `\n` stays buffered until a later chunk
    /// completes the line.
    pub fn feed(&mut self, chunk: impl AsRef<[u8]>) -> Vec<StreamEvent> {
        let chunk = chunk.as_ref();
        let mut events = Vec::new();
        if chunk.is_empty() {
            return events;
        }

        self.partial.extend_from_slice(chunk);

        let Some(last_newline) = self.partial.iter().rposition(|b| *b == b'\n') else {
            return events;
        };

        let complete: Vec<u8> = self.partial.drain(..=last_newline).collect();
        for line in complete.split(|b| *b == b'\n') {
            self.decode_line(line, &mut events);
        }

        events
    }

    /// Signal end of the body.
    ///
    /// A dangling unterminated line is discarded. Returns the terminal
    /// event if the stream never produced one.
    pub fn finish(&mut self) -> Option<StreamEvent> {
        if !self.partial.is_empty() {
            debug!(
                bytes = self.partial.len(),
                "Discarding unterminated line at end of stream"
            );
            self.partial.clear();
        }

        if self.finished {
            None
        } else {
            self.finished = true;
            Some(StreamEvent::Done)
        }
    }

    fn decode_line(&mut self, raw: &[u8], events: &mut Vec<StreamEvent>) {
        let line = match std::str::from_utf8(raw) {
            Ok(line) => line.trim_end_matches('\r'),
            Err(e) => {
                warn!(error = %e, "Skipping stream line with invalid UTF-8");
                return;
            }
        };

        if line.trim().is_empty() {
            return;
        }

        let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
            trace!(line, "Ignoring non-data stream line");
            return;
        };
        let payload = payload.trim();

        if payload == DONE_SENTINEL {
            self.emit_done(events);
            return;
        }

        let chunk: ChatCompletionChunk = match serde_json::from_str(payload) {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(
                    error = %e,
                    payload = %truncate_string(payload, LOG_PAYLOAD_LIMIT),
                    "Skipping malformed stream payload"
                );
                return;
            }
        };

        if let Some(content) = chunk.content() {
            if self.finished {
                warn!(
                    content = %truncate_string(content, LOG_PAYLOAD_LIMIT),
                    "Dropping content received after stream completion"
                );
            } else {
                events.push(StreamEvent::Delta(content.to_string()));
            }
        }

        if let Some(reason) = chunk.finish_reason() {
            trace!(finish_reason = reason, "Stream finish reason received");
            self.emit_done(events);
        }
    }

    fn emit_done(&mut self, events: &mut Vec<StreamEvent>) {
        if !self.finished {
            self.finished = true;
            events.push(StreamEvent::Done);
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(s: &str) -> StreamEvent {
        StreamEvent::Delta(s.to_string())
    }

    fn data_line(content: &str) -> String {
        format!(
            "data: {}\n",
            serde_json::json!({"choices": [{"delta": {"content": content}, "finish_reason": null}]})
        )
    }

    /// Feed every chunk, then close the stream.
    fn decode_all<I, C>(chunks: I) -> Vec<StreamEvent>
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        let mut decoder = StreamDecoder::new();
        let mut events = Vec::new();
        for chunk in chunks {
            events.extend(decoder.feed(chunk));
        }
        events.extend(decoder.finish());
        events
    }

    #[test]
    fn test_hello_scenario() {
        let events = decode_all([
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n",
            "data: [DONE]\n",
        ]);
        assert_eq!(events, vec![delta("Hel"), delta("lo"), StreamEvent::Done]);
    }

    #[test]
    fn test_malformed_line_is_skipped() {
        let events = decode_all(["data: {not json\n", "data: [DONE]\n"]);
        assert_eq!(events, vec![StreamEvent::Done]);
    }

    #[test]
    fn test_split_points_do_not_change_events() {
        let body = format!(
            "{}: keep-alive\n\n{}{}data: [DONE]\n",
            data_line("안녕"),
            data_line("하세요"),
            data_line(" 🦀"),
        );
        let whole = decode_all([body.as_bytes()]);
        let bytewise = decode_all(body.as_bytes().chunks(1));
        let sevens = decode_all(body.as_bytes().chunks(7));

        assert_eq!(
            whole,
            vec![delta("안녕"), delta("하세요"), delta(" 🦀"), StreamEvent::Done]
        );
        assert_eq!(bytewise, whole);
        assert_eq!(sevens, whole);
    }

    #[test]
    fn test_line_split_across_chunks() {
        let mut decoder = StreamDecoder::new();
        assert!(decoder.feed("data: {\"choices\":[{\"del").is_empty());
        assert!(decoder.feed("ta\":{\"content\":\"Hi\"}}]}").is_empty());
        assert_eq!(decoder.feed("\n"), vec![delta("Hi")]);
    }

    #[test]
    fn test_multiple_lines_in_one_chunk() {
        let chunk = format!("{}{}", data_line("a"), data_line("b"));
        let mut decoder = StreamDecoder::new();
        assert_eq!(decoder.feed(chunk), vec![delta("a"), delta("b")]);
    }

    #[test]
    fn test_empty_chunk_is_noop() {
        let mut decoder = StreamDecoder::new();
        assert!(decoder.feed("").is_empty());
        assert!(!decoder.is_finished());
    }

    #[test]
    fn test_finish_reason_then_done_emits_once() {
        let events = decode_all([
            data_line("x"),
            "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n".to_string(),
            "data: [DONE]\n".to_string(),
        ]);
        assert_eq!(events, vec![delta("x"), StreamEvent::Done]);
    }

    #[test]
    fn test_delta_and_finish_reason_in_same_payload() {
        let events = decode_all([
            "data: {\"choices\":[{\"delta\":{\"content\":\"end\"},\"finish_reason\":\"length\"}]}\n",
        ]);
        assert_eq!(events, vec![delta("end"), StreamEvent::Done]);
    }

    #[test]
    fn test_content_after_terminal_is_dropped() {
        let events = decode_all([
            "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n".to_string(),
            data_line("late"),
            "data: [DONE]\n".to_string(),
        ]);
        assert_eq!(events, vec![StreamEvent::Done]);
    }

    #[test]
    fn test_dangling_partial_line_is_discarded() {
        let mut decoder = StreamDecoder::new();
        let unterminated = data_line("lost");
        let unterminated = unterminated.trim_end_matches('\n');

        assert!(decoder.feed(unterminated).is_empty());
        assert_eq!(decoder.finish(), Some(StreamEvent::Done));
    }

    #[test]
    fn test_finish_without_done_synthesizes_terminal_once() {
        let mut decoder = StreamDecoder::new();
        assert_eq!(decoder.feed(data_line("a")), vec![delta("a")]);
        assert_eq!(decoder.finish(), Some(StreamEvent::Done));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_finish_after_done_is_silent() {
        let mut decoder = StreamDecoder::new();
        assert_eq!(decoder.feed("data: [DONE]\n"), vec![StreamEvent::Done]);
        assert!(decoder.is_finished());
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_crlf_and_non_data_lines() {
        let events = decode_all([
            "event: message\r\n",
            ": OPENROUTER PROCESSING\r\n",
            "\r\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\r\n",
            "data: [DONE]\r\n",
        ]);
        assert_eq!(events, vec![delta("ok"), StreamEvent::Done]);
    }

    #[test]
    fn test_empty_and_missing_deltas_emit_nothing() {
        let events = decode_all([
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\",\"content\":\"\"}}]}\n",
            "data: {\"choices\":[]}\n",
            "data: {\"id\":\"gen-1\"}\n",
        ]);
        assert_eq!(events, vec![StreamEvent::Done]);
    }

    #[test]
    fn test_invalid_utf8_line_is_skipped() {
        let mut decoder = StreamDecoder::new();
        let mut chunk = b"data: \xff\xfe\n".to_vec();
        chunk.extend_from_slice(data_line("fine").as_bytes());

        assert_eq!(decoder.feed(chunk), vec![delta("fine")]);
    }

    #[test]
    fn test_unknown_fields_are_tolerated() {
        let events = decode_all([
            "data: {\"id\":\"x\",\"provider\":\"Groq\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"y\",\"reasoning\":null},\"logprobs\":null}]}\n",
        ]);
        assert_eq!(events, vec![delta("y"), StreamEvent::Done]);
    }
}
