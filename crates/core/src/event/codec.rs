//! Line decoding for the job stream.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::types::Event;

/// Prefix every event line starts with.
pub const EVENT_MARKER: &str = "data:";

/// Message used when the service reports a failure without any text.
const UNDESCRIBED_FAILURE: &str = "The job failed without an error message";

/// Decodes one complete line (without its newline) into an event.
///
/// Returns `None` for blank lines, lines without the marker, invalid JSON,
/// unknown `type` values and payloads that do not fit their variant.
pub fn decode_line(line: &str) -> Option<Event> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.is_empty() {
        return None;
    }

    let payload = line.strip_prefix(EVENT_MARKER)?;
    let payload = payload.strip_prefix(' ').unwrap_or(payload);

    let value: Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(e) => {
            debug!("Skipping event line with invalid JSON: {}", e);
            return None;
        }
    };

    let Some(kind) = value.get("type").and_then(Value::as_str) else {
        debug!("Skipping event line without a type discriminator");
        return None;
    };

    match kind {
        "download" | "conversion" | "complete" | "error" => {}
        other => {
            debug!("Skipping event with unknown type: {}", other);
            return None;
        }
    }

    match Event::deserialize(&value) {
        Ok(event) => normalize(event),
        Err(e) => {
            debug!("Skipping malformed {} event: {}", kind, e);
            None
        }
    }
}

/// Decodes a raw line, rejecting bytes that are not valid UTF-8.
pub fn decode_line_bytes(line: &[u8]) -> Option<Event> {
    match std::str::from_utf8(line) {
        Ok(text) => decode_line(text),
        Err(e) => {
            debug!("Skipping event line with invalid UTF-8: {}", e);
            None
        }
    }
}

/// Brings decoded values into their documented ranges.
fn normalize(event: Event) -> Option<Event> {
    match event {
        Event::DownloadProgress { percent, eta_secs } => {
            let (percent, eta_secs) = normalize_progress(percent, eta_secs)?;
            Some(Event::DownloadProgress { percent, eta_secs })
        }
        Event::ConversionProgress { percent, eta_secs } => {
            let (percent, eta_secs) = normalize_progress(percent, eta_secs)?;
            Some(Event::ConversionProgress { percent, eta_secs })
        }
        Event::Complete { file_path } => {
            if file_path.is_empty() {
                debug!("Skipping complete event with an empty file path");
                None
            } else {
                Some(Event::Complete { file_path })
            }
        }
        Event::Failure { message } => {
            let message = if message.trim().is_empty() {
                UNDESCRIBED_FAILURE.to_string()
            } else {
                message
            };
            Some(Event::Failure { message })
        }
    }
}

/// The service reports a negative ETA while progress is still at zero.
fn normalize_progress(percent: f64, eta_secs: f64) -> Option<(f64, f64)> {
    if !percent.is_finite() || !eta_secs.is_finite() {
        debug!("Skipping progress event with non-finite values");
        return None;
    }
    Some((percent.clamp(0.0, 100.0), eta_secs.max(0.0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_download_progress() {
        let event = decode_line(r#"data: {"type": "download", "progress": 42.5, "eta": 30}"#);
        assert_eq!(
            event,
            Some(Event::DownloadProgress {
                percent: 42.5,
                eta_secs: 30.0
            })
        );
    }

    #[test]
    fn test_decode_conversion_progress_with_integer_fields() {
        let event = decode_line(r#"data: {"type": "conversion", "progress": 10, "eta": 120}"#);
        assert_eq!(
            event,
            Some(Event::ConversionProgress {
                percent: 10.0,
                eta_secs: 120.0
            })
        );
    }

    #[test]
    fn test_decode_complete() {
        let event = decode_line(r#"data: {"type": "complete", "file_path": "out.mp3"}"#);
        assert_eq!(
            event,
            Some(Event::Complete {
                file_path: "out.mp3".to_string()
            })
        );
    }

    #[test]
    fn test_decode_failure() {
        let event = decode_line(r#"data: {"type": "error", "message": "Video unavailable"}"#);
        assert_eq!(
            event,
            Some(Event::Failure {
                message: "Video unavailable".to_string()
            })
        );
    }

    #[test]
    fn test_marker_without_space() {
        let event = decode_line(r#"data:{"type":"complete","file_path":"a.mp4"}"#);
        assert!(matches!(event, Some(Event::Complete { .. })));
    }

    #[test]
    fn test_trailing_carriage_return_is_stripped() {
        let event = decode_line("data: {\"type\":\"complete\",\"file_path\":\"a.mp4\"}\r");
        assert!(matches!(event, Some(Event::Complete { .. })));
    }

    #[test]
    fn test_ignored_lines() {
        assert_eq!(decode_line(""), None);
        assert_eq!(decode_line("\r"), None);
        assert_eq!(decode_line(": keep-alive"), None);
        assert_eq!(decode_line("event: progress"), None);
        assert_eq!(decode_line(r#"{"type":"complete","file_path":"a"}"#), None);
        assert_eq!(decode_line("data: not json"), None);
        assert_eq!(decode_line("data: [1, 2, 3]"), None);
        assert_eq!(decode_line(r#"data: {"progress": 5}"#), None);
    }

    #[test]
    fn test_unknown_type_is_ignored() {
        assert_eq!(
            decode_line(r#"data: {"type": "thumbnail", "url": "http://x"}"#),
            None
        );
    }

    #[test]
    fn test_known_type_with_wrong_shape_is_ignored() {
        assert_eq!(decode_line(r#"data: {"type": "download", "eta": 3}"#), None);
        assert_eq!(
            decode_line(r#"data: {"type": "complete", "file_path": 7}"#),
            None
        );
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let event = decode_line(
            r#"data: {"type": "download", "progress": 1, "eta": 2, "speed": "1.2MiB/s"}"#,
        );
        assert!(matches!(event, Some(Event::DownloadProgress { .. })));
    }

    #[test]
    fn test_negative_eta_is_clamped() {
        let event = decode_line(r#"data: {"type": "conversion", "progress": 0, "eta": -0.25}"#);
        assert_eq!(
            event,
            Some(Event::ConversionProgress {
                percent: 0.0,
                eta_secs: 0.0
            })
        );
    }

    #[test]
    fn test_percent_is_clamped() {
        let event = decode_line(r#"data: {"type": "download", "progress": 100.0001, "eta": 0}"#);
        assert_eq!(
            event,
            Some(Event::DownloadProgress {
                percent: 100.0,
                eta_secs: 0.0
            })
        );
    }

    #[test]
    fn test_empty_file_path_is_ignored() {
        assert_eq!(
            decode_line(r#"data: {"type": "complete", "file_path": ""}"#),
            None
        );
    }

    #[test]
    fn test_empty_failure_message_gets_generic_text() {
        let event = decode_line(r#"data: {"type": "error", "message": ""}"#);
        assert_eq!(
            event,
            Some(Event::Failure {
                message: UNDESCRIBED_FAILURE.to_string()
            })
        );
    }

    #[test]
    fn test_decode_line_bytes_rejects_invalid_utf8() {
        let mut line = b"data: {\"type\":\"error\",\"message\":\"".to_vec();
        line.extend_from_slice(&[0xff, 0xfe]);
        line.extend_from_slice(b"\"}");
        assert_eq!(decode_line_bytes(&line), None);
    }

    #[test]
    fn test_wire_line_decodes_back() {
        let event = Event::Failure {
            message: "Ünïcødé 🎵".to_string(),
        };
        let wire = event.to_wire_line();
        let line = wire.lines().next().unwrap();
        assert_eq!(decode_line(line), Some(event));
    }
}
