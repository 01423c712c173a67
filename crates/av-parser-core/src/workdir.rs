//! Scratch directories shared by the pipeline stages

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// The two temp directories one run works in.
///
/// Every stage receives these explicitly, so two runs with distinct
/// directories never touch each other's files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkDirs {
    pub video: PathBuf,
    pub audio: PathBuf,
}

impl WorkDirs {
    pub fn new(video: PathBuf, audio: PathBuf) -> Self {
        Self { video, audio }
    }

    /// Both directories under a common root.
    pub fn under(root: &Path) -> Self {
        Self::new(root.join("yt-tmp"), root.join("audio-tmp"))
    }

    pub async fn create_video_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.video).await
    }

    pub async fn create_audio_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.audio).await
    }

    /// Remove both directories recursively. Missing directories are fine.
    pub async fn cleanup(&self) {
        info!("Cleaning up temp directories");
        for dir in [&self.audio, &self.video] {
            match fs::remove_dir_all(dir).await {
                Ok(()) => debug!("Removed {}", dir.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove {}: {}", dir.display(), e),
            }
        }
    }
}

/// Entries of `dir`, sorted by file name.
pub async fn list_entries(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    let mut read_dir = fs::read_dir(dir).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        entries.push(entry.path());
    }
    entries.sort();
    Ok(entries)
}
