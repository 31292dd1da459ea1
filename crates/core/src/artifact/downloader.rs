//! Saves artifacts from the job service to a local directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::StreamExt;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::service::{JobService, ServiceError};

/// Errors that can occur while saving an artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The file path cannot be turned into a safe local file name.
    #[error("Invalid artifact name: {0:?}")]
    InvalidName(String),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Failed to write artifact to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An artifact written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArtifact {
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Local file name for a service-side file path: its last component.
///
/// Returns `None` when nothing usable remains (empty, `.` or `..`).
pub fn local_file_name(file_path: &str) -> Option<String> {
    let name = file_path
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    match name {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}

/// Fetches artifacts and stores them in an output directory.
pub struct ArtifactDownloader {
    service: Arc<dyn JobService>,
    output_dir: PathBuf,
}

impl ArtifactDownloader {
    pub fn new(service: Arc<dyn JobService>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            service,
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Downloads `file_path` into the output directory.
    ///
    /// Data goes to a `.part` file first, renamed once the body is complete,
    /// so an interrupted transfer never leaves a truncated file under the
    /// final name.
    pub async fn save(&self, file_path: &str) -> Result<SavedArtifact, ArtifactError> {
        let name = local_file_name(file_path)
            .ok_or_else(|| ArtifactError::InvalidName(file_path.to_string()))?;
        let final_path = self.output_dir.join(&name);
        let part_path = self.output_dir.join(format!("{}.part", name));

        fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| ArtifactError::Write {
                path: self.output_dir.clone(),
                source,
            })?;

        let mut body = self.service.fetch_artifact(file_path).await?;

        let write_err = |source| ArtifactError::Write {
            path: part_path.clone(),
            source,
        };
        let mut file = fs::File::create(&part_path).await.map_err(write_err)?;

        let mut size_bytes = 0u64;
        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    drop(file);
                    let _ = fs::remove_file(&part_path).await;
                    return Err(e.into());
                }
            };
            file.write_all(&chunk).await.map_err(write_err)?;
            size_bytes += chunk.len() as u64;
        }
        file.flush().await.map_err(write_err)?;
        drop(file);

        fs::rename(&part_path, &final_path)
            .await
            .map_err(|source| ArtifactError::Write {
                path: final_path.clone(),
                source,
            })?;

        debug!("Wrote {} bytes to {:?}", size_bytes, final_path);
        info!("Saved artifact {}", final_path.display());

        Ok(SavedArtifact {
            path: final_path,
            size_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockJobService;
    use tempfile::TempDir;

    #[test]
    fn test_local_file_name() {
        assert_eq!(local_file_name("song.mp3").as_deref(), Some("song.mp3"));
        assert_eq!(
            local_file_name("temp_downloads/song.mp3").as_deref(),
            Some("song.mp3")
        );
        assert_eq!(
            local_file_name("C:\\temp\\clip.mp4").as_deref(),
            Some("clip.mp4")
        );
        assert_eq!(local_file_name("../../.."), None);
        assert_eq!(local_file_name("dir/"), None);
        assert_eq!(local_file_name(""), None);
        assert_eq!(local_file_name("."), None);
    }

    #[tokio::test]
    async fn test_save_writes_file() {
        let temp_dir = TempDir::new().unwrap();
        let service = Arc::new(MockJobService::new());
        let content = vec![7u8; 10_000];
        service.set_artifact("Song Title.mp3", &content).await;

        let downloader = ArtifactDownloader::new(service, temp_dir.path().join("out"));
        assert_eq!(downloader.output_dir(), temp_dir.path().join("out"));
        let saved = downloader.save("Song Title.mp3").await.unwrap();

        assert_eq!(saved.path, temp_dir.path().join("out").join("Song Title.mp3"));
        assert_eq!(saved.size_bytes, 10_000);
        assert_eq!(std::fs::read(&saved.path).unwrap(), content);
        assert!(!temp_dir.path().join("out").join("Song Title.mp3.part").exists());
    }

    #[tokio::test]
    async fn test_save_strips_directories() {
        let temp_dir = TempDir::new().unwrap();
        let service = Arc::new(MockJobService::new());
        service.set_artifact("../secret/clip.mp4", b"video").await;

        let downloader = ArtifactDownloader::new(service, temp_dir.path());
        let saved = downloader.save("../secret/clip.mp4").await.unwrap();

        assert_eq!(saved.path, temp_dir.path().join("clip.mp4"));
    }

    #[tokio::test]
    async fn test_save_missing_artifact() {
        let temp_dir = TempDir::new().unwrap();
        let service = Arc::new(MockJobService::new());

        let downloader = ArtifactDownloader::new(service, temp_dir.path());
        let result = downloader.save("gone.mp3").await;

        assert!(matches!(
            result,
            Err(ArtifactError::Service(ServiceError::ArtifactNotFound(_)))
        ));
        assert!(!temp_dir.path().join("gone.mp3.part").exists());
    }

    #[tokio::test]
    async fn test_save_rejects_unusable_name() {
        let temp_dir = TempDir::new().unwrap();
        let service = Arc::new(MockJobService::new());

        let downloader = ArtifactDownloader::new(service.clone(), temp_dir.path());
        let result = downloader.save("..").await;

        assert!(matches!(result, Err(ArtifactError::InvalidName(_))));
        assert!(service.recorded_artifact_requests().await.is_empty());
    }
}
