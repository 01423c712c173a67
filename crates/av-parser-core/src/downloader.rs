//! Video downloader using yt-dlp

use crate::config::DownloadConfig;
use crate::error::DownloadError;
use crate::process::{run_cancellable, ProcessOutcome};
use std::ffi::OsString;
use std::path::PathBuf;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug)]
pub struct Downloader {
    yt_dlp_path: PathBuf,
    video_dir: PathBuf,
    options: DownloadConfig,
}

impl Downloader {
    pub fn new(yt_dlp_path: PathBuf, video_dir: PathBuf, options: DownloadConfig) -> Self {
        Self {
            yt_dlp_path,
            video_dir,
            options,
        }
    }

    /// yt-dlp arguments for `url`.
    ///
    /// Keeping the video pins an H.264/MP4 selection and recodes into the
    /// configured container; otherwise yt-dlp picks its own best format.
    pub fn args(&self, url: &str, keep_video: bool) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();

        if keep_video {
            args.push("--format-sort".into());
            args.push(self.options.format_sort.clone().into());
            args.push("--recode-video".into());
            args.push(self.options.recode_video.clone().into());
        }

        args.push("-o".into());
        args.push(self.video_dir.join(&self.options.output_template).into());

        args.push(url.into());
        args.push("--no-playlist".into());
        args.push("--progress".into());
        // one progress update per line when stdout is a pipe
        args.push("--newline".into());

        args
    }

    /// Download `url` into the temp video directory
    pub async fn download<F>(
        &self,
        url: &str,
        keep_video: bool,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> Result<(), DownloadError>
    where
        F: FnMut(f32),
    {
        info!("Retrieving video file from url {}", url);

        tokio::fs::create_dir_all(&self.video_dir).await?;

        let mut cmd = Command::new(&self.yt_dlp_path);
        cmd.args(self.args(url, keep_video));

        let outcome = run_cancellable(&mut cmd, cancel, |line| {
            debug!("yt-dlp: {}", line);
            if let Some(pct) = parse_progress(line) {
                on_progress(pct / 100.0);
            }
        })
        .await
        .map_err(|source| DownloadError::Spawn {
            path: self.yt_dlp_path.clone(),
            source,
        })?;

        match outcome {
            ProcessOutcome::Cancelled => Err(DownloadError::Cancelled),
            ProcessOutcome::Exited { status, .. } if status.success() => {
                info!("Video download complete");
                Ok(())
            }
            ProcessOutcome::Exited { status, stderr } => {
                debug!("yt-dlp stderr: {}", stderr);
                Err(classify_failure(url, status.code(), &stderr))
            }
        }
    }
}

fn classify_failure(url: &str, code: Option<i32>, stderr: &str) -> DownloadError {
    if stderr.contains("Video unavailable") || stderr.contains("Private video") {
        return DownloadError::VideoUnavailable(url.to_string());
    }
    if stderr.contains("is not a valid URL") || stderr.contains("Unsupported URL") {
        return DownloadError::InvalidUrl(url.to_string());
    }
    DownloadError::YtDlpFailed(code)
}

/// Percentage from a `[download]  42.3% of ...` line
fn parse_progress(line: &str) -> Option<f32> {
    let rest = line.trim_start().strip_prefix("[download]")?;
    let token = rest.split_whitespace().next()?;
    token.strip_suffix('%')?.parse().ok()
}
