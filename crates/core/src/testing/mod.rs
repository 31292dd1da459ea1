//! Testing utilities and mock implementations.
//!
//! # Example
//!
//! ```rust,ignore
//! use tubefetch_core::testing::{MockChunk, MockJobService};
//!
//! let service = MockJobService::new();
//! service.push_script(vec![
//!     MockChunk::event(&Event::DownloadProgress { percent: 50.0, eta_secs: 3.0 }),
//!     MockChunk::event(&Event::Complete { file_path: "song.mp3".into() }),
//! ]).await;
//! ```

mod mock_job_service;

pub use mock_job_service::{MockChunk, MockJobService};
