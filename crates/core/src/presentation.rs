//! Human-readable rendering of job state fields.

use crate::job::JobPhase;

/// Formats a remaining-time estimate.
///
/// `0` renders as `"0s"`; otherwise `"{m}m {s}s"`, with the minutes part
/// left out when it is zero. The whole duration is rounded to seconds
/// before splitting, so `119.6` renders as `"2m 0s"`.
pub fn format_eta(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0s".to_string();
    }

    let total = seconds.round() as u64;
    let minutes = total / 60;
    let remaining = total % 60;

    if minutes > 0 {
        format!("{}m {}s", minutes, remaining)
    } else {
        format!("{}s", remaining)
    }
}

/// Formats a percentage with two decimals, e.g. `"42.50%"`.
pub fn format_percent(percent: f64) -> String {
    format!("{:.2}%", percent)
}

/// Label shown to users for a phase.
pub fn phase_label(phase: JobPhase) -> &'static str {
    match phase {
        JobPhase::Idle => "Waiting",
        JobPhase::Downloading => "Downloading",
        JobPhase::Converting => "Converting",
        JobPhase::Succeeded => "Done",
        JobPhase::Failed => "Error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_eta() {
        assert_eq!(format_eta(0.0), "0s");
        assert_eq!(format_eta(45.0), "45s");
        assert_eq!(format_eta(90.0), "1m 30s");
        assert_eq!(format_eta(61.6), "1m 2s");
        assert_eq!(format_eta(3600.0), "60m 0s");
    }

    #[test]
    fn test_format_eta_rounding_edges() {
        assert_eq!(format_eta(0.4), "0s");
        assert_eq!(format_eta(0.6), "1s");
        assert_eq!(format_eta(59.6), "1m 0s");
        assert_eq!(format_eta(119.6), "2m 0s");
    }

    #[test]
    fn test_format_eta_invalid_input() {
        assert_eq!(format_eta(-3.0), "0s");
        assert_eq!(format_eta(f64::NAN), "0s");
        assert_eq!(format_eta(f64::INFINITY), "0s");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(42.5), "42.50%");
        assert_eq!(format_percent(100.0), "100.00%");
        assert_eq!(format_percent(0.0), "0.00%");
    }

    #[test]
    fn test_phase_label() {
        assert_eq!(phase_label(JobPhase::Converting), "Converting");
        assert_eq!(phase_label(JobPhase::Failed), "Error");
    }
}
