// ABOUTME: Incremental Server-Sent Events decoder for streamed chat completions
// ABOUTME: Carries partial lines across network reads so no event is truncated or lost
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # SSE Stream Decoder
//!
//! Streamed completions arrive as `text/event-stream` bodies made of `data:`
//! lines. TCP does not align network reads with line boundaries, so a
//! `data:` line (or its terminating newline) may be split across two reads.
//! [`SseDecoder`] keeps the unterminated tail of each read and only emits an
//! event once its full line has been seen.
//!
//! Buffering happens on raw bytes, so a multi-byte UTF-8 sequence split
//! between reads is reassembled before it is decoded.
//!
//! ```
//! use llm_chat_core::llm::sse_parser::SseDecoder;
//!
//! let mut decoder = SseDecoder::new();
//! assert!(decoder.feed(b"data: {\"a\":")?.is_empty());
//! let events = decoder.feed(b"1}\n\ndata: [DONE]\n\n")?;
//! assert_eq!(events.len(), 2);
//! assert_eq!(events[0].data, "{\"a\":1}");
//! assert!(events[1].finished);
//! # Ok::<(), llm_chat_core::errors::AppError>(())
//! ```

use std::borrow::Cow;
use std::mem;

use tracing::warn;

use crate::errors::{AppError, AppResult};

/// Payload that marks the end of a completion stream
pub const DONE_TOKEN: &str = "[DONE]";

/// Longest unterminated line [`SseDecoder::feed`] will buffer
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

const DATA_FIELD: &str = "data:";

/// One decoded `data:` event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSentEvent {
    /// Trimmed payload, normally a JSON document
    pub data: String,
    /// `true` only for the `[DONE]` terminator
    pub finished: bool,
}

impl ServerSentEvent {
    fn from_payload(payload: &str) -> Self {
        Self {
            data: payload.to_owned(),
            finished: payload == DONE_TOKEN,
        }
    }
}

/// Line-buffering SSE decoder reused across all reads of one response body
#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Bytes after the last newline seen so far
    pending: Vec<u8>,
}

impl SseDecoder {
    /// Create a decoder with an empty carry-over buffer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Feed the bytes of one network read, returning every event completed by it
    ///
    /// Complete lines are parsed in order. A trailing partial line stays
    /// buffered for the next call.
    ///
    /// # Errors
    ///
    /// Returns a decode error once the unterminated tail exceeds
    /// [`MAX_LINE_BYTES`]; the buffer is discarded.
    pub fn feed(&mut self, bytes: &[u8]) -> AppResult<Vec<ServerSentEvent>> {
        let events = self.push(bytes);
        if self.pending.len() > MAX_LINE_BYTES {
            let buffered = mem::take(&mut self.pending).len();
            return Err(AppError::decode(format!(
                "SSE line exceeds {MAX_LINE_BYTES} bytes without a newline ({buffered} buffered)"
            )));
        }
        Ok(events)
    }

    fn push(&mut self, bytes: &[u8]) -> Vec<ServerSentEvent> {
        // The carried tail holds no newline, so only the new bytes need scanning
        let mut search_from = self.pending.len();
        self.pending.extend_from_slice(bytes);

        let mut events = Vec::new();
        let mut consumed = 0;
        while let Some(offset) = self.pending[search_from..].iter().position(|&b| b == b'\n') {
            let line_end = search_from + offset;
            if let Some(event) = parse_line(&self.pending[consumed..line_end]) {
                events.push(event);
            }
            consumed = line_end + 1;
            search_from = consumed;
        }
        self.pending.drain(..consumed);

        events
    }

    /// Flush the carry-over buffer at end of stream
    ///
    /// A final `data:` line without a trailing newline is still a complete
    /// event once the transport reports end of stream.
    pub fn finish(&mut self) -> Option<ServerSentEvent> {
        let remaining = mem::take(&mut self.pending);
        parse_line(&remaining)
    }

    /// Whether a partial line is waiting for more bytes
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

/// Decode a self-contained chunk in one shot
///
/// Equivalent to feeding `chunk` into a fresh [`SseDecoder`] and flushing it,
/// without the line length cap. Empty or whitespace-only input yields no events.
#[must_use]
pub fn decode_chunk(chunk: &str) -> Vec<ServerSentEvent> {
    let mut decoder = SseDecoder::new();
    let mut events = decoder.push(chunk.as_bytes());
    events.extend(decoder.finish());
    events
}

fn parse_line(raw: &[u8]) -> Option<ServerSentEvent> {
    let line = match std::str::from_utf8(raw) {
        Ok(line) => Cow::Borrowed(line),
        Err(e) => {
            warn!(
                valid_up_to = e.valid_up_to(),
                "Invalid UTF-8 in SSE line, replacing bad bytes"
            );
            String::from_utf8_lossy(raw)
        }
    };
    let line = line.strip_suffix('\r').unwrap_or(line.as_ref());

    // event:, id:, retry: and ":" comments carry nothing we consume
    let value = line.strip_prefix(DATA_FIELD)?;
    let value = value.strip_prefix(' ').unwrap_or(value);
    let payload = value.trim();

    // Keep-alive
    if payload.is_empty() {
        return None;
    }
    Some(ServerSentEvent::from_payload(payload))
}
