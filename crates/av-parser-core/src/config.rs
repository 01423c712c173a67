//! Configuration management for av-parser

use crate::error::ConfigError;
use crate::transfer::ArchiveDirs;
use crate::workdir::WorkDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the video archive directory.
pub const VIDEO_ARCHIVE_ENV: &str = "AV_VIDEO_STORAGE_DIR";
/// Environment variable naming the audio archive directory.
pub const AUDIO_ARCHIVE_ENV: &str = "AV_AUDIO_STORAGE_DIR";

/// Prefix for every other override, e.g. `AV_PARSER_PATHS__FFMPEG`.
pub const ENV_PREFIX: &str = "AV_PARSER_";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub paths: PathsConfig,
    pub archive: ArchiveConfig,
    pub temp: TempConfig,
    pub download: DownloadConfig,
    pub extract: ExtractConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Path to yt-dlp binary (auto-detected if not set)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yt_dlp: Option<PathBuf>,
    /// Path to FFmpeg binary (auto-detected if not set)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ffmpeg: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Persistent destination for downloaded videos
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<PathBuf>,
    /// Persistent destination for extracted MP3s
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TempConfig {
    /// Scratch directory for the downloaded video
    pub video_dir: PathBuf,
    /// Scratch directory for the extracted audio
    pub audio_dir: PathBuf,
    /// Remove both scratch directories when the run ends
    pub cleanup: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// `--format-sort` value used when the video is kept
    pub format_sort: String,
    /// `--recode-video` container used when the video is kept
    pub recode_video: String,
    /// yt-dlp output template, relative to the temp video directory
    pub output_template: String,
    /// Fetch a managed yt-dlp binary when none is found
    pub auto_install: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// `-q:a` value passed to ffmpeg (0 is best VBR quality)
    pub audio_quality: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            archive: ArchiveConfig::default(),
            temp: TempConfig {
                video_dir: PathBuf::from("./yt-tmp"),
                audio_dir: PathBuf::from("./audio-tmp"),
                cleanup: true,
            },
            download: DownloadConfig {
                format_sort: "vcodec:h264,res,ext:mp4:m4a".to_string(),
                recode_video: "mp4".to_string(),
                output_template: "%(extractor)s - %(title)s.%(ext)s".to_string(),
                auto_install: true,
            },
            extract: ExtractConfig {
                audio_quality: "0".to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::figment(config_file)
            .extract()
            .map_err(|e| ConfigError::LoadError(e.to_string()))
    }

    /// Layered providers, later ones win: defaults, user config, `--config`, env.
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(default_config) = user_config_path() {
            if default_config.exists() {
                figment = figment.merge(Toml::file(&default_config));
            }
        }

        if let Some(path) = config_file {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        // The archive variables predate the prefixed scheme and keep their names.
        let archive_env = Env::raw()
            .only(&[VIDEO_ARCHIVE_ENV, AUDIO_ARCHIVE_ENV])
            .map(|key| {
                if key.as_str().eq_ignore_ascii_case(VIDEO_ARCHIVE_ENV) {
                    "archive.video".into()
                } else {
                    "archive.audio".into()
                }
            });

        figment.merge(archive_env)
    }

    /// Validate both archive directories up front, reporting every missing key at once.
    pub fn archive_dirs(&self) -> Result<ArchiveDirs, ConfigError> {
        let video = non_empty(self.archive.video.as_ref());
        let audio = non_empty(self.archive.audio.as_ref());

        let mut missing = Vec::new();
        if video.is_none() {
            missing.push(VIDEO_ARCHIVE_ENV);
        }
        if audio.is_none() {
            missing.push(AUDIO_ARCHIVE_ENV);
        }

        match (video, audio) {
            (Some(video), Some(audio)) => Ok(ArchiveDirs { video, audio }),
            _ => Err(ConfigError::Missing(missing)),
        }
    }

    pub fn work_dirs(&self) -> WorkDirs {
        WorkDirs::new(self.temp.video_dir.clone(), self.temp.audio_dir.clone())
    }

    /// Get FFmpeg path, auto-detecting if not configured
    pub fn ffmpeg_path(&self) -> Option<PathBuf> {
        crate::extractor::find_ffmpeg(&self.paths)
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidValue(e.to_string()))
    }
}

/// `<config_dir>/av-parser/config.toml`
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("av-parser").join("config.toml"))
}

fn non_empty(path: Option<&PathBuf>) -> Option<PathBuf> {
    path.filter(|p| !p.as_os_str().is_empty()).cloned()
}
