//! Retrieval of finished artifacts.

mod downloader;

pub use downloader::{local_file_name, ArtifactDownloader, ArtifactError, SavedArtifact};
