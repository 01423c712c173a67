//! Pipeline orchestration: download, extract, transfer, cleanup

use crate::config::{Config, DownloadConfig, ExtractConfig, PathsConfig};
use crate::downloader::Downloader;
use crate::error::{AvParserError, ConfigError, DownloadError, ExtractError};
use crate::extractor::{self, Extractor};
use crate::installer;
use crate::transfer::{copy_dir_files, ArchiveDirs};
use crate::workdir::{list_entries, WorkDirs};

use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Which outputs a run keeps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    #[default]
    Both,
    AudioOnly,
    VideoOnly,
}

impl OutputMode {
    pub fn keep_audio(&self) -> bool {
        !matches!(self, OutputMode::VideoOnly)
    }

    pub fn keep_video(&self) -> bool {
        !matches!(self, OutputMode::AudioOnly)
    }
}

impl std::fmt::Display for OutputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputMode::Both => write!(f, "audio and video"),
            OutputMode::AudioOnly => write!(f, "audio only"),
            OutputMode::VideoOnly => write!(f, "video only"),
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub url: String,
    pub mode: OutputMode,
    pub work_dirs: WorkDirs,
    pub archive: ArchiveDirs,
    pub paths: PathsConfig,
    pub download: DownloadConfig,
    pub extract: ExtractConfig,
    pub keep_temp: bool,
}

impl PipelineConfig {
    /// Build from loaded settings, validating the archive directories.
    pub fn from_config(url: &str, mode: OutputMode, config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            url: url.to_string(),
            mode,
            work_dirs: config.work_dirs(),
            archive: config.archive_dirs()?,
            paths: config.paths.clone(),
            download: config.download.clone(),
            extract: config.extract.clone(),
            keep_temp: !config.temp.cleanup,
        })
    }
}

/// Pipeline progress stages
#[derive(Debug, Clone)]
pub enum PipelineStage {
    Preparing,
    Downloading { progress: f32 },
    Extracting,
    Transferring { kind: &'static str },
    Skipped { stage: &'static str },
    CleaningUp,
    Complete { archived: usize, duration: Duration },
    Failed { stage: &'static str, error: String },
}

/// Files archived by a successful run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub video: Vec<PathBuf>,
    pub audio: Vec<PathBuf>,
    pub duration: Duration,
}

impl RunReport {
    pub fn archived(&self) -> usize {
        self.video.len() + self.audio.len()
    }
}

/// Main processing pipeline
pub struct Pipeline {
    config: PipelineConfig,
    progress_tx: mpsc::Sender<PipelineStage>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, progress_tx: mpsc::Sender<PipelineStage>) -> Self {
        Self {
            config,
            progress_tx,
        }
    }

    /// Run every stage, then clean up whatever the outcome.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<RunReport, AvParserError> {
        let start_time = Instant::now();
        info!("Starting pipeline for {} ({})", self.config.url, self.config.mode);

        let result = self.run_stages(cancel).await;

        if self.config.keep_temp {
            debug!(
                "Temp files kept at: {}, {}",
                self.config.work_dirs.video.display(),
                self.config.work_dirs.audio.display()
            );
        } else {
            let _ = self.progress_tx.send(PipelineStage::CleaningUp).await;
            self.config.work_dirs.cleanup().await;
        }

        // an interrupt after the last checkpoint still ends the run
        let result = match result {
            Ok(_) if cancel.is_cancelled() => Err(AvParserError::Cancelled),
            other => other,
        };

        match result {
            Ok(mut report) => {
                report.duration = start_time.elapsed();
                info!(
                    "Pipeline complete: {} file(s) archived ({:.1}s)",
                    report.archived(),
                    report.duration.as_secs_f32()
                );
                let _ = self
                    .progress_tx
                    .send(PipelineStage::Complete {
                        archived: report.archived(),
                        duration: report.duration,
                    })
                    .await;
                Ok(report)
            }
            Err(e) => {
                let _ = self
                    .progress_tx
                    .send(PipelineStage::Failed {
                        stage: stage_of(&e),
                        error: e.to_string(),
                    })
                    .await;
                Err(e)
            }
        }
    }

    async fn run_stages(&self, cancel: &CancellationToken) -> Result<RunReport, AvParserError> {
        let config = &self.config;
        let dirs = &config.work_dirs;
        let mode = config.mode;

        // Resolve both tools before touching the network for the video.
        let _ = self.progress_tx.send(PipelineStage::Preparing).await;

        let yt_dlp_path =
            installer::ensure_yt_dlp(&config.paths, config.download.auto_install, cancel)
                .await?
                .ok_or(DownloadError::YtDlpNotFound)?;

        let ffmpeg_path = if mode.keep_audio() {
            Some(extractor::find_ffmpeg(&config.paths).ok_or(ExtractError::FfmpegNotFound)?)
        } else {
            None
        };

        if let Ok(stale) = list_entries(&dirs.video).await {
            if !stale.is_empty() {
                warn!(
                    "{} already holds {} file(s) from an earlier run",
                    dirs.video.display(),
                    stale.len()
                );
            }
        }

        // 1. Download
        let _ = self
            .progress_tx
            .send(PipelineStage::Downloading { progress: 0.0 })
            .await;

        let downloader =
            Downloader::new(yt_dlp_path, dirs.video.clone(), config.download.clone());
        downloader
            .download(&config.url, mode.keep_video(), cancel, |progress| {
                let _ = self
                    .progress_tx
                    .try_send(PipelineStage::Downloading { progress });
            })
            .await?;

        // 2. Extract audio
        if let Some(ffmpeg_path) = ffmpeg_path {
            let _ = self.progress_tx.send(PipelineStage::Extracting).await;
            Extractor::new(ffmpeg_path, config.extract.audio_quality.clone())
                .extract(dirs, cancel)
                .await?;
        } else {
            info!("Audio parsing skipped");
            let _ = self
                .progress_tx
                .send(PipelineStage::Skipped { stage: "extract" })
                .await;
        }

        // 3. Transfer
        let mut report = RunReport::default();

        if mode.keep_audio() {
            info!("Transferring audio files");
            let _ = self
                .progress_tx
                .send(PipelineStage::Transferring { kind: "audio" })
                .await;
            report.audio = copy_dir_files(&dirs.audio, &config.archive.audio, cancel).await?;
        }

        if mode.keep_video() {
            info!("Transferring video files");
            let _ = self
                .progress_tx
                .send(PipelineStage::Transferring { kind: "video" })
                .await;
            report.video = copy_dir_files(&dirs.video, &config.archive.video, cancel).await?;
        }

        info!("Transfer complete");
        Ok(report)
    }
}

fn stage_of(err: &AvParserError) -> &'static str {
    match err {
        AvParserError::Download(_) | AvParserError::Install(_) => "download",
        AvParserError::Extract(_) => "extract",
        AvParserError::Transfer(_) => "transfer",
        AvParserError::Config(_) => "config",
        AvParserError::Io(_) => "io",
        AvParserError::Cancelled => "interrupt",
    }
}
