//! Line framing for the response byte stream.
//!
//! Network reads split the body at arbitrary byte offsets, including in the
//! middle of a line or of a multi-byte UTF-8 sequence. [`LineDecoder`] keeps
//! undecoded bytes across reads and only hands out lines once their
//! terminator has arrived.

use tracing::debug;

/// Buffers raw bytes and yields complete `\n`-terminated lines.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
    /// Leading bytes of `buffer` already known to hold no `\n`.
    scanned: usize,
}

impl LineDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a byte batch and iterate over the lines it completes.
    ///
    /// Lines not consumed from the returned iterator stay buffered and are
    /// yielded by the next call.
    pub fn push(&mut self, bytes: &[u8]) -> Lines<'_> {
        self.buffer.extend_from_slice(bytes);
        Lines {
            buffer: &mut self.buffer,
            scanned: &mut self.scanned,
        }
    }

    /// Number of buffered bytes not yet part of a complete line.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// End of stream. Any unterminated trailing data is discarded.
    pub fn finish(self) {
        if !self.buffer.is_empty() {
            debug!(
                bytes = self.buffer.len(),
                "Discarding unterminated data at end of stream"
            );
        }
    }
}

/// Iterator over the complete lines currently buffered in a [`LineDecoder`].
///
/// The terminator and a preceding `\r` are stripped. Invalid UTF-8 is decoded
/// lossily.
#[derive(Debug)]
pub struct Lines<'a> {
    buffer: &'a mut Vec<u8>,
    scanned: &'a mut usize,
}

impl Iterator for Lines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let start = *self.scanned;
        let Some(offset) = self.buffer[start..].iter().position(|&b| b == b'\n') else {
            *self.scanned = self.buffer.len();
            return None;
        };
        let newline = start + offset;
        let mut line: Vec<u8> = self.buffer.drain(..=newline).collect();
        *self.scanned = 0;

        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }

        Some(String::from_utf8_lossy(&line).into_owned())
    }
}
