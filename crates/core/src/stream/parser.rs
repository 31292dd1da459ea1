//! Buffered line splitter over raw bytes.

use tracing::{debug, trace};

use crate::event::{decode_line_bytes, Event};

/// Counters describing what a parser has seen so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserStats {
    /// Complete lines split off the buffer.
    pub lines: u64,
    /// Lines that decoded into an event.
    pub events: u64,
    /// Non-empty lines that produced no event.
    pub skipped: u64,
}

/// Splits a byte stream into lines and decodes each line into an [`Event`].
///
/// One parser serves exactly one job stream; start a new job with a new
/// parser.
#[derive(Debug, Default)]
pub struct StreamParser {
    buffer: Vec<u8>,
    /// Bytes at the front of `buffer` already known to contain no newline.
    scanned: usize,
    stats: ParserStats,
}

impl StreamParser {
    /// Creates an empty parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk and returns the events completed by it.
    ///
    /// The returned iterator is lazy. Lines it does not get to (because the
    /// caller stopped early) stay buffered and come out of the next `feed`.
    pub fn feed(&mut self, chunk: &[u8]) -> Events<'_> {
        self.buffer.extend_from_slice(chunk);
        Events { parser: self }
    }

    /// Number of bytes waiting for a newline.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn stats(&self) -> ParserStats {
        self.stats
    }

    /// Ends the stream, dropping any unterminated trailing bytes.
    ///
    /// Returns how many bytes were discarded.
    pub fn finish(self) -> usize {
        let discarded = self.buffer.len();
        if discarded > 0 {
            debug!(
                "Discarding {} bytes of unterminated input at end of stream",
                discarded
            );
        }
        discarded
    }

    /// Splits the next complete line off the buffer, without its newline.
    fn next_line(&mut self) -> Option<Vec<u8>> {
        let offset = self.buffer[self.scanned..]
            .iter()
            .position(|&b| b == b'\n');

        let Some(offset) = offset else {
            self.scanned = self.buffer.len();
            return None;
        };

        let end = self.scanned + offset;
        let mut line: Vec<u8> = self.buffer.drain(..=end).collect();
        line.pop();
        self.scanned = 0;
        self.stats.lines += 1;
        Some(line)
    }
}

/// Lazy sequence of events produced by one [`StreamParser::feed`] call.
pub struct Events<'a> {
    parser: &'a mut StreamParser,
}

impl Iterator for Events<'_> {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        while let Some(line) = self.parser.next_line() {
            if let Some(event) = decode_line_bytes(&line) {
                self.parser.stats.events += 1;
                return Some(event);
            }
            if !line.is_empty() && line != b"\r" {
                trace!("No event decoded from {} byte line", line.len());
                self.parser.stats.skipped += 1;
            }
        }
        None
    }
}
