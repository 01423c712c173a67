//! Error types for av-parser-core

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AvParserError>;

/// Exit code for a run stopped by the user (128 + SIGINT).
pub const EXIT_INTERRUPTED: u8 = 130;

#[derive(Error, Debug)]
pub enum AvParserError {
    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),

    #[error("yt-dlp install failed: {0}")]
    Install(#[from] InstallError),

    #[error("Audio extraction failed: {0}")]
    Extract(#[from] ExtractError),

    #[error("Transfer failed: {0}")]
    Transfer(#[from] TransferError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Program terminated by user")]
    Cancelled,
}

impl AvParserError {
    /// Process exit code for this error class (sysexits.h values).
    pub fn exit_code(&self) -> u8 {
        match self {
            AvParserError::Config(_) => 78,
            AvParserError::Download(DownloadError::Cancelled)
            | AvParserError::Install(InstallError::Cancelled)
            | AvParserError::Extract(ExtractError::Cancelled)
            | AvParserError::Transfer(TransferError::Cancelled)
            | AvParserError::Cancelled => EXIT_INTERRUPTED,
            AvParserError::Download(DownloadError::Io(_))
            | AvParserError::Extract(ExtractError::Io(_))
            | AvParserError::Transfer(_)
            | AvParserError::Io(_) => 74,
            AvParserError::Extract(ExtractError::NoFiles(_))
            | AvParserError::Extract(ExtractError::AmbiguousInput { .. })
            | AvParserError::Extract(ExtractError::InvalidFileName(_)) => 65,
            AvParserError::Download(_) | AvParserError::Install(_) | AvParserError::Extract(_) => 69,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.exit_code() == EXIT_INTERRUPTED
    }
}

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("yt-dlp not found. Install it or enable download.auto_install")]
    YtDlpNotFound,

    #[error("yt-dlp failed with exit code: {0:?}")]
    YtDlpFailed(Option<i32>),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Video unavailable or private: {0}")]
    VideoUnavailable(String),

    #[error("Failed to run {}: {source}", .path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Download cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum InstallError {
    #[error("Could not determine cache directory")]
    NoCacheDir,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Release download returned status {0}")]
    BadStatus(u16),

    #[error("Install cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("ffmpeg not found. Install with your package manager or set paths.ffmpeg")]
    FfmpegNotFound,

    #[error("ffmpeg failed with exit code: {0:?}")]
    FfmpegFailed(Option<i32>),

    #[error("no files in dir {}", .0.display())]
    NoFiles(PathBuf),

    #[error("expected exactly one file in {}, found {count}", .dir.display())]
    AmbiguousInput { dir: PathBuf, count: usize },

    #[error("Cannot derive audio file name from {}", .0.display())]
    InvalidFileName(PathBuf),

    #[error("Failed to run {}: {source}", .path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Extraction cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create {}: {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy {}: {source}", .path.display())]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read dir {}: {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Transfer cancelled")]
    Cancelled,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadError(String),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),

    #[error("Missing required settings: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
