//! Incremental accumulation of a streamed answer.
//!
//! The transport hands over raw byte chunks; [`Utf8ChunkDecoder`] turns them
//! into text without splitting code points, and [`StreamAccumulator`] keeps
//! the full answer so far and re-renders it from scratch on every chunk.
//! Re-rendering the whole buffer is what makes chunk boundaries irrelevant:
//! a chunk may end in the middle of `**` or `[label](` and the next frame
//! simply tokenizes the longer text again.

use serde::Serialize;

use crate::brain::intensity;
use crate::markdown::{self, Segment};

/// Decodes UTF-8 across chunk boundaries.
///
/// An incomplete multi-byte sequence at the end of a chunk is held back until
/// the next chunk completes it. Bytes that can never form a valid sequence
/// are replaced with U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes as much of `pending + bytes` as possible.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);

        let mut out = String::new();
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(std::str::from_utf8(&self.pending[..valid]).unwrap_or_default());
                    match e.error_len() {
                        // Truncated sequence: wait for more bytes.
                        None => {
                            self.pending.drain(..valid);
                            break;
                        }
                        Some(invalid) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + invalid);
                        }
                    }
                }
            }
        }
        out
    }

    /// Flushes whatever is still held back at end-of-stream.
    pub fn finish(self) -> String {
        String::from_utf8_lossy(&self.pending).into_owned()
    }
}

/// What the view shows for a given answer text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderFrame {
    pub display_text: String,
    pub is_intense: bool,
    pub segments: Vec<Segment>,
}

impl RenderFrame {
    /// Runs the intensity detector, then the tokenizer on the display text.
    pub fn render(text: &str) -> Self {
        let signal = intensity::process(text);
        let segments = markdown::tokenize(&signal.display_text);
        Self {
            display_text: signal.display_text,
            is_intense: signal.is_intense,
            segments,
        }
    }
}

/// A finished answer ready for the conversation history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedAnswer {
    /// Answer text with the intensity marker removed.
    pub text: String,
    pub is_intense: bool,
}

/// Buffer for one answer stream.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    buffer: String,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `chunk` and renders the whole buffer.
    pub fn push(&mut self, chunk: &str) -> RenderFrame {
        self.buffer.push_str(chunk);
        self.frame()
    }

    pub fn frame(&self) -> RenderFrame {
        RenderFrame::render(&self.buffer)
    }

    /// Raw text received so far, marker included.
    pub fn raw(&self) -> &str {
        &self.buffer
    }

    /// Strips the marker once more and returns the answer, or `None` when
    /// nothing but whitespace (or a bare marker) came back.
    pub fn finish(self) -> Option<CommittedAnswer> {
        let is_intense = intensity::strip_marker(&self.buffer).is_some();
        let text = intensity::clean(&self.buffer);
        if text.trim().is_empty() {
            return None;
        }
        Some(CommittedAnswer {
            text: text.to_string(),
            is_intense,
        })
    }
}
