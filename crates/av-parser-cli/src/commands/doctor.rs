use anyhow::Result;
use std::path::Path;
use tokio::process::Command;

use av_parser_core::config::{AUDIO_ARCHIVE_ENV, VIDEO_ARCHIVE_ENV};
use av_parser_core::{installer, AvParserError, Config};

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path).map_err(AvParserError::from)?;

    println!("av-parser dependency check\n");

    let mut all_ok = true;

    // Check yt-dlp
    print!("yt-dlp:        ");
    match installer::find_yt_dlp(&config.paths) {
        Some(path) => match tool_version(&path, "--version").await {
            Some(v) => println!("OK ({})", v),
            None => {
                println!("FOUND at {} but failed to get version", path.display());
                all_ok = false;
            }
        },
        None if config.download.auto_install => {
            println!("NOT FOUND (will be installed on first run)");
            println!("               Or run: av-parser install");
        }
        None => {
            println!("NOT FOUND");
            println!("               Run: av-parser install");
            all_ok = false;
        }
    }

    // Check FFmpeg
    print!("ffmpeg:        ");
    match config.ffmpeg_path() {
        Some(path) => match tool_version(&path, "-version").await {
            Some(first_line) => {
                // "ffmpeg version 6.1.1 Copyright ..." -> "6.1.1"
                let version = first_line.split_whitespace().nth(2).unwrap_or("unknown");
                println!("OK ({})", version);
            }
            None => {
                println!("FOUND at {} but failed to get version", path.display());
                all_ok = false;
            }
        },
        None => {
            println!("NOT FOUND");
            println!("               Install with your package manager, or set paths.ffmpeg");
            all_ok = false;
        }
    }

    // Check archive directories
    for (label, env, dir) in [
        ("video archive: ", VIDEO_ARCHIVE_ENV, config.archive.video.as_deref()),
        ("audio archive: ", AUDIO_ARCHIVE_ENV, config.archive.audio.as_deref()),
    ] {
        print!("{}", label);
        match dir {
            Some(dir) if dir.is_dir() => println!("OK ({})", dir.display()),
            Some(dir) => {
                println!("MISSING DIRECTORY ({})", dir.display());
                all_ok = false;
            }
            None => {
                println!("NOT SET");
                println!("               Set {}", env);
                all_ok = false;
            }
        }
    }

    println!();
    if all_ok {
        println!("All dependencies OK!");
    } else {
        println!("Some dependencies are missing. See above for details.");
    }

    Ok(())
}

/// First line of `<tool> <flag>` output
async fn tool_version(path: &Path, flag: &str) -> Option<String> {
    let out = Command::new(path).arg(flag).output().await.ok()?;
    if !out.status.success() {
        return None;
    }
    String::from_utf8_lossy(&out.stdout)
        .lines()
        .next()
        .map(|l| l.trim().to_string())
}
