use std::path::PathBuf;

use clap::Parser;
use tubefetch_core::OutputFormat;

/// Config file used when neither `--config` nor `TUBEFETCH_CONFIG` is set.
pub const DEFAULT_CONFIG_PATH: &str = "tubefetch.toml";

/// Download a video through a media conversion service and save the result.
#[derive(Parser, Debug)]
#[command(name = "tubefetch")]
#[command(version)]
pub struct Args {
    /// Video URL to fetch
    pub url: String,

    /// Output format (mp3 or mp4). Defaults to `output.default_format`.
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// Directory the converted file is saved to
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, env = "TUBEFETCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Job service base URL, overriding the configured one
    #[arg(long)]
    pub server: Option<String>,

    /// Only report the server-side file name; do not download it
    #[arg(long)]
    pub no_save: bool,

    /// Print each state change as a JSON line instead of progress bars
    #[arg(long)]
    pub json: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,
}

impl Args {
    /// An explicitly chosen config file must exist; the default one may not.
    pub fn config_path(&self) -> (PathBuf, bool) {
        match &self.config {
            Some(path) => (path.clone(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        }
    }
}
