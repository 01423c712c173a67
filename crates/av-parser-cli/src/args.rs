use av_parser_core::OutputMode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "av-parser")]
#[command(author, version, about = "Download a video, extract its audio and archive both")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Video URL to download
    #[arg(value_name = "URL")]
    pub url: Option<String>,

    #[command(flatten)]
    pub mode: ModeArgs,

    /// Keep the temp directories after the run (for debugging)
    #[arg(long)]
    pub keep_temp: bool,

    /// Verbose output (--verbose, repeat for more)
    #[arg(long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file path
    #[arg(long, global = true, env = "AV_PARSER_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Output selection; both are kept when neither flag is given.
#[derive(clap::Args, Clone, Copy, Debug, Default)]
#[group(multiple = false)]
pub struct ModeArgs {
    /// Save audio only
    #[arg(short = 'a', long, short_alias = 's')]
    pub audio_only: bool,

    /// Save video only
    #[arg(short = 'v', long)]
    pub video_only: bool,
}

impl ModeArgs {
    pub fn output_mode(&self) -> OutputMode {
        if self.audio_only {
            OutputMode::AudioOnly
        } else if self.video_only {
            OutputMode::VideoOnly
        } else {
            OutputMode::Both
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that yt-dlp, ffmpeg and the archive directories are usable
    Doctor,

    /// Show configuration
    Config,

    /// Install or refresh the managed yt-dlp binary
    Install {
        /// Download even if a yt-dlp is already available
        #[arg(long)]
        force: bool,
    },
}
