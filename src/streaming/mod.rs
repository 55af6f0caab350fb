//! Streaming relay utilities
//!
//! The upstream `streamGenerateContent` call answers with Server-Sent
//! Events. This module reassembles event lines from arbitrary byte chunks
//! and maps each `data:` event to one relayed text fragment. Fragments are
//! produced in upstream order, one in flight at a time, and the stream is
//! finite and not restartable.

use async_stream::stream;
use bytes::Bytes;
use futures::{pin_mut, Stream, StreamExt};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::gemini::types::StreamChunk;

/// Buffer for reassembling SSE lines across chunk boundaries.
///
/// Upstream bytes arrive in chunks that need not align with line
/// boundaries. Feeding a chunk returns the lines it completed; a trailing
/// partial line is held back until a later chunk finishes it.
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    pending: String,
}

impl SseLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return the lines it completed.
    ///
    /// Lines are terminated by `\n`; a preceding `\r` is stripped so both
    /// `\n` and `\r\n` framed events parse the same way. Blank lines (the
    /// SSE event separator) are dropped.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.push_str(&String::from_utf8_lossy(bytes));

        let mut lines = Vec::new();
        while let Some(newline) = self.pending.find('\n') {
            let rest = self.pending.split_off(newline + 1);
            let mut line = std::mem::replace(&mut self.pending, rest);
            line.truncate(line.len() - 1);
            if line.ends_with('\r') {
                line.truncate(line.len() - 1);
            }
            if !line.is_empty() {
                lines.push(line);
            }
        }
        lines
    }

    /// Unterminated data held back for the next chunk
    pub fn remaining(&self) -> &str {
        &self.pending
    }
}

/// Extract the relayed text fragment from one SSE line, if it carries any.
fn event_text(line: &str) -> Option<String> {
    let data = line.strip_prefix("data:")?.trim_start();
    match serde_json::from_str::<StreamChunk>(data) {
        Ok(event) => {
            let text = event.text();
            (!text.is_empty()).then_some(text)
        }
        Err(e) => {
            warn!(error = %e, "Skipping unparseable stream event");
            None
        }
    }
}

/// Map an upstream SSE byte stream into relay text fragments.
///
/// One fragment per `data:` event carrying text, in the order received. A
/// mid-stream failure cannot change the already-sent status code, so it is
/// relayed as one inline error fragment and the stream ends. The returned
/// stream never yields `Err`.
pub fn text_fragments<S, E>(upstream: S) -> impl Stream<Item = Result<Bytes, AppError>>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::fmt::Display,
{
    stream! {
        let mut lines = SseLineBuffer::new();
        let mut fragments = 0usize;
        pin_mut!(upstream);

        while let Some(chunk) = upstream.next().await {
            match chunk {
                Ok(bytes) => {
                    for line in lines.feed(&bytes) {
                        if let Some(text) = event_text(&line) {
                            fragments += 1;
                            yield Ok(Bytes::from(text));
                        }
                    }
                }
                Err(reason) => {
                    warn!(error = %reason, fragments, "Upstream stream failed mid-flight");
                    yield Ok(Bytes::from(format!("\n[stream error: {reason}]")));
                    return;
                }
            }
        }

        if !lines.remaining().is_empty() {
            warn!(fragments, "Upstream stream closed with a truncated event");
        }
        debug!(fragments, "Upstream stream closed");
    }
}
