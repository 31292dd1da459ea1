//! Terminal rendering of job progress.

use anyhow::{Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tubefetch_core::{format_eta, format_percent, phase_label, JobPhase, JobState};

/// Shows job state either as progress bars or as JSON lines on stdout.
pub enum ProgressView {
    Bars {
        // Keeps the bars drawn together.
        _multi: MultiProgress,
        download: ProgressBar,
        conversion: ProgressBar,
    },
    Json,
}

impl ProgressView {
    pub fn bars() -> Result<Self> {
        let style = ProgressStyle::default_bar()
            .template("{prefix:>11} [{bar:40.cyan/blue}] {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("█▓░");

        let multi = MultiProgress::new();
        let download = multi.add(ProgressBar::new(100));
        download.set_style(style.clone());
        download.set_prefix("Download");
        let conversion = multi.add(ProgressBar::new(100));
        conversion.set_style(style);
        conversion.set_prefix("Conversion");

        Ok(Self::Bars {
            _multi: multi,
            download,
            conversion,
        })
    }

    pub fn json() -> Self {
        Self::Json
    }

    pub fn render(&self, state: &JobState) -> Result<()> {
        match self {
            Self::Bars {
                download,
                conversion,
                ..
            } => {
                update_bar(download, state.download_progress, state.download_eta_secs);
                update_bar(
                    conversion,
                    state.conversion_progress,
                    state.conversion_eta_secs,
                );
                Ok(())
            }
            Self::Json => {
                println!("{}", serde_json::to_string(state)?);
                Ok(())
            }
        }
    }

    /// Final render once the job is over.
    ///
    /// JSON output only repeats the final state when the last rendered
    /// update was not already it.
    pub fn finish(&self, state: &JobState, already_shown: bool) -> Result<()> {
        match self {
            Self::Bars {
                download,
                conversion,
                ..
            } => {
                update_bar(download, state.download_progress, state.download_eta_secs);
                update_bar(
                    conversion,
                    state.conversion_progress,
                    state.conversion_eta_secs,
                );
                let label = phase_label(state.phase);
                if state.phase == JobPhase::Succeeded {
                    download.finish();
                    conversion.finish_with_message(label);
                } else {
                    download.abandon();
                    conversion.abandon_with_message(label);
                }
                Ok(())
            }
            Self::Json if already_shown => Ok(()),
            Self::Json => self.render(state),
        }
    }
}

fn update_bar(bar: &ProgressBar, percent: f64, eta_secs: f64) {
    bar.set_position(percent.round() as u64);
    bar.set_message(format!(
        "{:>7}  ETA {}",
        format_percent(percent),
        format_eta(eta_secs)
    ));
}
