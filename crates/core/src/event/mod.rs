//! Wire schema for job progress notifications.
//!
//! The job service answers a job request with a line-oriented body. Every
//! notification is one UTF-8 line made of the `data:` marker followed by a
//! JSON object whose `type` field selects the event kind:
//!
//! ```text
//! data: {"type": "download", "progress": 42.5, "eta": 30.0}
//! data: {"type": "conversion", "progress": 10, "eta": 120}
//! data: {"type": "complete", "file_path": "Song Title.mp3"}
//! data: {"type": "error", "message": "Video unavailable"}
//! ```
//!
//! Lines that do not carry the marker, do not hold valid JSON, or name an
//! unknown `type` decode to nothing so that the service can add new event
//! kinds without breaking older clients.

mod codec;
mod types;

pub use codec::{decode_line, decode_line_bytes, EVENT_MARKER};
pub use types::Event;
