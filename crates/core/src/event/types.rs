//! Event types carried on the job stream.

use serde::{Deserialize, Serialize};

/// One decoded notification from a job stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Progress of the download phase.
    #[serde(rename = "download")]
    DownloadProgress {
        /// Percentage complete (0.0 - 100.0).
        #[serde(rename = "progress")]
        percent: f64,
        /// Estimated seconds remaining for this phase.
        #[serde(rename = "eta")]
        eta_secs: f64,
    },
    /// Progress of the conversion phase.
    #[serde(rename = "conversion")]
    ConversionProgress {
        /// Percentage complete (0.0 - 100.0).
        #[serde(rename = "progress")]
        percent: f64,
        /// Estimated seconds remaining for this phase.
        #[serde(rename = "eta")]
        eta_secs: f64,
    },
    /// The job produced an artifact.
    #[serde(rename = "complete")]
    Complete {
        /// Opaque server-side identifier of the artifact.
        file_path: String,
    },
    /// The job failed on the service side.
    #[serde(rename = "error")]
    Failure { message: String },
}

impl Event {
    /// The wire discriminator for this event.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::DownloadProgress { .. } => "download",
            Self::ConversionProgress { .. } => "conversion",
            Self::Complete { .. } => "complete",
            Self::Failure { .. } => "error",
        }
    }

    /// Whether this event ends the job.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Failure { .. })
    }

    /// Renders the event as it appears on the wire, including the blank
    /// separator line the service emits after each event.
    pub fn to_wire_line(&self) -> String {
        // Serializing a plain enum of strings and floats cannot fail.
        let json = serde_json::to_string(self).unwrap_or_default();
        format!("{} {}\n\n", super::EVENT_MARKER, json)
    }
}
