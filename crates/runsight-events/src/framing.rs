// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Stream framing for runner event transports
//!
//! The producer writes UTF-8 JSON records over a socket or a pipe, with no
//! guarantee that one read corresponds to one record: records may arrive
//! back-to-back in a single chunk (`{...}{...}`) or fragmented across many
//! chunks. Both decoders here are push-based: feed raw bytes in, get
//! complete frames out, with any trailing partial frame buffered until the
//! next push.
//!
//! [`JsonFrameDecoder`] scans brace nesting structurally (tracking string
//! and escape state), so a literal `"}{"` inside a JSON string value never
//! splits a frame. A malformed frame is logged and dropped; it never stalls
//! subsequent frames.

use tracing::warn;

use crate::event::RunnerEvent;

/// Extracts complete top-level JSON objects from an unframed byte stream
///
/// Bytes outside any object (whitespace, stray garbage between records) are
/// discarded. The scanner operates on raw bytes: all JSON structural
/// characters are ASCII, so multi-byte UTF-8 sequences inside strings pass
/// through untouched even when split across pushes.
#[derive(Debug, Default)]
pub struct JsonFrameDecoder {
    buf: Vec<u8>,
    /// Byte offset where the current object started, if one is open
    start: Option<usize>,
    depth: usize,
    in_string: bool,
    escaped: bool,
    /// Scan position; bytes before this have already been classified
    pos: usize,
}

impl JsonFrameDecoder {
    /// Create a new decoder with empty state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes, returning every frame completed by it
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut frames = Vec::new();

        while self.pos < self.buf.len() {
            let byte = self.buf[self.pos];

            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if byte == b'\\' {
                    self.escaped = true;
                } else if byte == b'"' {
                    self.in_string = false;
                }
            } else {
                match byte {
                    b'"' if self.start.is_some() => self.in_string = true,
                    b'{' => {
                        if self.start.is_none() {
                            self.start = Some(self.pos);
                        }
                        self.depth += 1;
                    }
                    b'}' if self.start.is_some() => {
                        self.depth -= 1;
                        if self.depth == 0 {
                            let from = self.start.take().expect("open object");
                            let frame = &self.buf[from..=self.pos];
                            frames.push(String::from_utf8_lossy(frame).into_owned());
                        }
                    }
                    _ => {}
                }
            }
            self.pos += 1;
        }

        self.compact();
        frames
    }

    /// Whether a partially received frame is still buffered
    #[must_use]
    pub fn has_partial(&self) -> bool {
        self.start.is_some()
    }

    /// Drop consumed bytes, keeping only the open frame (if any)
    fn compact(&mut self) {
        let keep_from = match self.start {
            Some(start) => start,
            None => self.pos,
        };
        if keep_from > 0 {
            self.buf.drain(..keep_from);
            self.pos -= keep_from;
            if let Some(start) = self.start.as_mut() {
                *start -= keep_from;
            }
        }
    }
}

/// Buffers raw bytes into complete newline-terminated lines
///
/// Used for the newline-delimited transport and for subprocess stdout, where
/// a single read may end mid-line. The trailing fragment is held until its
/// terminator arrives or [`LineDecoder::finish`] is called.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buf: Vec<u8>,
}

impl LineDecoder {
    /// Create a new decoder with an empty buffer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes, returning every line completed by it
    ///
    /// Line terminators are stripped; `\r\n` is handled.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(nl) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=nl).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// Drain the final unterminated line, if any
    pub fn finish(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buf);
        Some(String::from_utf8_lossy(&rest).into_owned())
    }
}

/// Parse extracted frames into events, dropping malformed ones
///
/// A frame that fails to parse is logged at warn level and skipped; it
/// never aborts the stream.
pub fn decode_events<I>(frames: I) -> Vec<RunnerEvent>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut events = Vec::new();
    for frame in frames {
        let frame = frame.as_ref().trim();
        if frame.is_empty() {
            continue;
        }
        match serde_json::from_str::<RunnerEvent>(frame) {
            Ok(event) => events.push(event),
            Err(err) => warn!(error = %err, "dropping malformed event frame"),
        }
    }
    events
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn records_strategy() -> impl Strategy<Value = Vec<String>> {
        proptest::collection::vec(
            proptest::collection::hash_map("[a-zA-Z]{1,6}", "[^\"\\\\]{0,16}", 0..4).prop_map(
                |fields| {
                    serde_json::to_string(&fields).expect("serialize map")
                },
            ),
            1..8,
        )
    }

    proptest! {
        /// Frames survive arbitrary chunking of the concatenated stream
        #[test]
        fn prop_chunking_never_loses_frames(
            records in records_strategy(),
            chunk_size in 1usize..24,
        ) {
            let stream: String = records.concat();
            let mut decoder = JsonFrameDecoder::new();
            let mut frames = Vec::new();
            for chunk in stream.as_bytes().chunks(chunk_size) {
                frames.extend(decoder.push(chunk));
            }
            prop_assert_eq!(frames, records);
        }

        /// Payload strings containing braces never corrupt framing
        #[test]
        fn prop_braces_in_payload_safe(payload in "[{}a-z ]{0,24}") {
            let record = serde_json::to_string(
                &serde_json::json!({ "payload": payload })
            ).expect("serialize");
            let mut decoder = JsonFrameDecoder::new();
            let frames = decoder.push(record.as_bytes());
            prop_assert_eq!(frames, vec![record]);
        }

        /// Line decoder reassembles exactly the original lines
        #[test]
        fn prop_line_decoder_roundtrip(
            lines in proptest::collection::vec("[^\r\n]{0,20}", 0..8),
            chunk_size in 1usize..16,
        ) {
            let mut stream = lines.join("\n");
            stream.push('\n');
            let mut decoder = LineDecoder::new();
            let mut out = Vec::new();
            for chunk in stream.as_bytes().chunks(chunk_size) {
                out.extend(decoder.push(chunk));
            }
            // The trailing newline yields exactly the input lines, except the
            // degenerate all-empty case where join+push produce one extra.
            if lines.is_empty() {
                prop_assert_eq!(out, vec![String::new()]);
            } else {
                prop_assert_eq!(out, lines);
            }
        }
    }
}
