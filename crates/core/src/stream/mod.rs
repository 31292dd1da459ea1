//! Incremental decoding of a chunked job stream.
//!
//! Network reads hand over bytes at arbitrary boundaries: a chunk may hold
//! several events, end in the middle of a line, or even split a multi-byte
//! UTF-8 sequence. [`StreamParser`] keeps raw bytes until a newline shows up
//! and only then decodes the line, so the events it yields do not depend on
//! how the body was chunked.

mod parser;

pub use parser::{Events, ParserStats, StreamParser};
