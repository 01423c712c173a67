//! MP3 audio extraction using FFmpeg

use crate::config::PathsConfig;
use crate::error::ExtractError;
use crate::process::{run_cancellable, ProcessOutcome};
use crate::workdir::{list_entries, WorkDirs};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug)]
pub struct Extractor {
    ffmpeg_path: PathBuf,
    audio_quality: String,
}

impl Extractor {
    pub fn new(ffmpeg_path: PathBuf, audio_quality: String) -> Self {
        Self {
            ffmpeg_path,
            audio_quality,
        }
    }

    /// Extract the audio track of the single downloaded video into `dirs.audio`.
    pub async fn extract(
        &self,
        dirs: &WorkDirs,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, ExtractError> {
        info!("Parsing audio from video");

        dirs.create_audio_dir().await?;

        let input = single_entry(&dirs.video).await?;
        let output = dirs.audio.join(audio_file_name(&input)?);

        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.args(self.args(&input, &output));

        let outcome = run_cancellable(&mut cmd, cancel, |line| debug!("ffmpeg: {}", line))
            .await
            .map_err(|source| ExtractError::Spawn {
                path: self.ffmpeg_path.clone(),
                source,
            })?;

        match outcome {
            ProcessOutcome::Cancelled => Err(ExtractError::Cancelled),
            ProcessOutcome::Exited { status, .. } if status.success() => {
                info!("Audio extracted to {}", output.display());
                Ok(output)
            }
            ProcessOutcome::Exited { status, stderr } => {
                debug!("ffmpeg stderr: {}", stderr);
                Err(ExtractError::FfmpegFailed(status.code()))
            }
        }
    }

    fn args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-i".into(),
            input.into(),
            // audio streams only
            "-map".into(),
            "a".into(),
            "-q:a".into(),
            self.audio_quality.clone().into(),
            "-y".into(),
            output.into(),
        ]
    }
}

/// Configured ffmpeg, else the one on `PATH`.
pub fn find_ffmpeg(paths: &PathsConfig) -> Option<PathBuf> {
    paths
        .ffmpeg
        .clone()
        .or_else(|| which::which("ffmpeg").ok())
}

/// The one file in `dir`; zero or several is an error.
async fn single_entry(dir: &Path) -> Result<PathBuf, ExtractError> {
    let mut entries = list_entries(dir).await?;
    match entries.len() {
        0 => Err(ExtractError::NoFiles(dir.to_path_buf())),
        1 => Ok(entries.remove(0)),
        count => Err(ExtractError::AmbiguousInput {
            dir: dir.to_path_buf(),
            count,
        }),
    }
}

/// `<stem>.mp3` for a video file, dropping only the last extension.
pub fn audio_file_name(video: &Path) -> Result<String, ExtractError> {
    let stem = video
        .file_stem()
        .map(|s| s.to_string_lossy())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ExtractError::InvalidFileName(video.to_path_buf()))?;
    Ok(format!("{}.mp3", stem))
}
