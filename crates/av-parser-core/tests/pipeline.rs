//! End-to-end pipeline runs against stand-in yt-dlp and ffmpeg scripts.

#![cfg(unix)]

use av_parser_core::error::{DownloadError, ExtractError};
use av_parser_core::shutdown::InterruptListener;
use av_parser_core::workdir::WorkDirs;
use av_parser_core::{AvParserError, Config, OutputMode, Pipeline, PipelineConfig, PipelineStage};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

const URL: &str = "https://example.com/watch?v=abc";

/// Records its arguments and drops one video next to the `-o` template.
const YT_DLP_OK: &str = r#"
out=""
prev=""
for a in "$@"; do
  if [ "$prev" = "-o" ]; then out="$a"; fi
  prev="$a"
done
echo "[download]  50.0% of 1.00MiB"
printf 'fake video bytes' > "$(dirname "$out")/Generic - clip.mp4"
echo "[download] 100% of 1.00MiB"
"#;

const YT_DLP_NOTHING: &str = "exit 0\n";

const YT_DLP_PRIVATE: &str = r#"
echo "ERROR: [youtube] abc: Private video. Sign in if you've been granted access" >&2
exit 1
"#;

const YT_DLP_HANGS: &str = "exec sleep 30\n";

/// Writes fixed bytes to its last argument.
const FFMPEG_OK: &str = r#"
for a in "$@"; do last="$a"; done
printf 'fake mp3 bytes' > "$last"
"#;

const FFMPEG_HANGS: &str = "exec sleep 30\n";

struct Fixture {
    _root: TempDir,
    tools: PathBuf,
    work: WorkDirs,
    video_archive: PathBuf,
    audio_archive: PathBuf,
}

impl Fixture {
    fn new(yt_dlp_body: &str) -> Self {
        let root = tempfile::tempdir().unwrap();
        let tools = root.path().join("tools");
        let video_archive = root.path().join("archive/video");
        let audio_archive = root.path().join("archive/audio");
        for dir in [&tools, &video_archive, &audio_archive] {
            std::fs::create_dir_all(dir).unwrap();
        }

        write_tool(&tools, "yt-dlp", yt_dlp_body);
        write_tool(&tools, "ffmpeg", FFMPEG_OK);

        Self {
            work: WorkDirs::under(&root.path().join("work")),
            _root: root,
            tools,
            video_archive,
            audio_archive,
        }
    }

    fn config(&self, mode: OutputMode) -> PipelineConfig {
        let mut config = Config::default();
        config.paths.yt_dlp = Some(self.tools.join("yt-dlp"));
        config.paths.ffmpeg = Some(self.tools.join("ffmpeg"));
        config.archive.video = Some(self.video_archive.clone());
        config.archive.audio = Some(self.audio_archive.clone());
        config.temp.video_dir = self.work.video.clone();
        config.temp.audio_dir = self.work.audio.clone();
        config.download.auto_install = false;

        PipelineConfig::from_config(URL, mode, &config).unwrap()
    }

    fn with_ffmpeg(self, body: &str) -> Self {
        write_tool(&self.tools, "ffmpeg", body);
        self
    }

    /// Arguments a tool was last invoked with, or `None` if it never ran.
    fn invocation(&self, tool: &str) -> Option<Vec<String>> {
        let log = self.tools.join(format!("{}.args", tool));
        std::fs::read_to_string(log)
            .ok()
            .map(|s| s.lines().map(String::from).collect())
    }
}

fn write_tool(dir: &Path, name: &str, body: &str) {
    let path = dir.join(name);
    let log = dir.join(format!("{}.args", name));
    let script = format!(
        "#!/bin/sh\nprintf '%s\\n' \"$@\" > '{}'\n{}",
        log.display(),
        body
    );
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

async fn run(
    config: PipelineConfig,
    cancel: &CancellationToken,
) -> (Result<av_parser_core::RunReport, AvParserError>, Vec<PipelineStage>) {
    run_cancelling_at(config, cancel, |_| false).await
}

/// Run the pipeline, cancelling `cancel` as soon as a stage matching `at` is reported.
async fn run_cancelling_at(
    config: PipelineConfig,
    cancel: &CancellationToken,
    at: fn(&PipelineStage) -> bool,
) -> (Result<av_parser_core::RunReport, AvParserError>, Vec<PipelineStage>) {
    let (tx, mut rx) = mpsc::channel(64);
    let trigger = cancel.clone();
    let collector = tokio::spawn(async move {
        let mut stages = Vec::new();
        while let Some(stage) = rx.recv().await {
            if at(&stage) {
                trigger.cancel();
            }
            stages.push(stage);
        }
        stages
    });

    let result = Pipeline::new(config, tx).run(cancel).await;
    (result, collector.await.unwrap())
}

#[tokio::test]
async fn default_run_archives_video_and_audio() {
    let fx = Fixture::new(YT_DLP_OK);

    let (result, stages) = run(fx.config(OutputMode::Both), &CancellationToken::new()).await;
    let report = result.unwrap();

    assert_eq!(report.video, vec![fx.video_archive.join("Generic - clip.mp4")]);
    assert_eq!(report.audio, vec![fx.audio_archive.join("Generic - clip.mp3")]);
    assert_eq!(
        std::fs::read(&report.video[0]).unwrap(),
        b"fake video bytes"
    );
    assert_eq!(std::fs::read(&report.audio[0]).unwrap(), b"fake mp3 bytes");

    assert!(!fx.work.video.exists());
    assert!(!fx.work.audio.exists());

    let yt_args = fx.invocation("yt-dlp").unwrap();
    assert!(yt_args.contains(&URL.to_string()));
    assert!(yt_args.windows(2).any(|w| w == ["--recode-video", "mp4"]));
    assert!(yt_args.iter().any(|a| a == "--no-playlist"));

    let ff_args = fx.invocation("ffmpeg").unwrap();
    assert!(ff_args.windows(2).any(|w| w == ["-map", "a"]));
    assert!(ff_args.windows(2).any(|w| w == ["-q:a", "0"]));
    assert!(ff_args.iter().any(|a| a == "-y"));

    assert!(stages
        .iter()
        .any(|s| matches!(s, PipelineStage::Downloading { progress } if (*progress - 0.5).abs() < 1e-6)));
    assert!(matches!(
        stages.last(),
        Some(PipelineStage::Complete { archived: 2, .. })
    ));
}

#[tokio::test]
async fn audio_only_skips_video_transfer() {
    let fx = Fixture::new(YT_DLP_OK);

    let (result, _) = run(fx.config(OutputMode::AudioOnly), &CancellationToken::new()).await;
    let report = result.unwrap();

    assert!(report.video.is_empty());
    assert!(file_names(&fx.video_archive).is_empty());
    assert_eq!(file_names(&fx.audio_archive), ["Generic - clip.mp3"]);

    let yt_args = fx.invocation("yt-dlp").unwrap();
    assert!(!yt_args.iter().any(|a| a == "--recode-video"));
    assert!(!fx.work.video.exists());
}

#[tokio::test]
async fn video_only_skips_extraction() {
    let fx = Fixture::new(YT_DLP_OK);

    let (result, stages) = run(fx.config(OutputMode::VideoOnly), &CancellationToken::new()).await;
    let report = result.unwrap();

    assert!(report.audio.is_empty());
    assert_eq!(file_names(&fx.video_archive), ["Generic - clip.mp4"]);
    assert!(file_names(&fx.audio_archive).is_empty());
    assert!(fx.invocation("ffmpeg").is_none());
    assert!(stages
        .iter()
        .any(|s| matches!(s, PipelineStage::Skipped { stage: "extract" })));
}

#[tokio::test]
async fn empty_download_never_invokes_transcoder() {
    let fx = Fixture::new(YT_DLP_NOTHING);

    let (result, stages) = run(fx.config(OutputMode::Both), &CancellationToken::new()).await;
    let err = result.unwrap_err();

    assert!(matches!(err, AvParserError::Extract(ExtractError::NoFiles(_))));
    assert!(err.to_string().contains("no files in dir"));
    assert_eq!(err.exit_code(), 65);
    assert!(fx.invocation("ffmpeg").is_none());
    assert!(!fx.work.video.exists());
    assert!(!fx.work.audio.exists());
    assert!(matches!(
        stages.last(),
        Some(PipelineStage::Failed { stage: "extract", .. })
    ));
}

#[tokio::test]
async fn downloader_failure_is_classified() {
    let fx = Fixture::new(YT_DLP_PRIVATE);

    let (result, _) = run(fx.config(OutputMode::Both), &CancellationToken::new()).await;
    let err = result.unwrap_err();

    assert!(matches!(
        err,
        AvParserError::Download(DownloadError::VideoUnavailable(_))
    ));
    assert_eq!(err.exit_code(), 69);
    assert!(file_names(&fx.video_archive).is_empty());
}

#[tokio::test]
async fn interrupt_during_download_cleans_up() {
    let fx = Fixture::new(YT_DLP_HANGS);
    let cancel = CancellationToken::new();

    let (interrupt_tx, interrupt_rx) = oneshot::channel::<()>();
    let listener = InterruptListener::spawn_with(cancel.clone(), async move {
        interrupt_rx.await.map_err(std::io::Error::other)
    });
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        let _ = interrupt_tx.send(());
    });

    let started = Instant::now();
    let (result, stages) = run(fx.config(OutputMode::Both), &cancel).await;
    let err = result.unwrap_err();

    assert!(listener.finish().await);
    assert!(err.is_cancelled());
    assert_eq!(err.exit_code(), 130);
    assert!(started.elapsed() < Duration::from_secs(10));

    assert!(!fx.work.video.exists());
    assert!(!fx.work.audio.exists());
    assert!(file_names(&fx.video_archive).is_empty());
    assert!(file_names(&fx.audio_archive).is_empty());
    assert!(!stages
        .iter()
        .any(|s| matches!(s, PipelineStage::Transferring { .. })));
}

#[tokio::test]
async fn keep_temp_leaves_work_dirs() {
    let fx = Fixture::new(YT_DLP_OK);
    let mut config = fx.config(OutputMode::Both);
    config.keep_temp = true;

    let (result, _) = run(config, &CancellationToken::new()).await;
    result.unwrap();

    assert_eq!(file_names(&fx.work.video), ["Generic - clip.mp4"]);
    assert_eq!(file_names(&fx.work.audio), ["Generic - clip.mp3"]);
}

#[tokio::test]
async fn interrupt_during_extraction_cleans_up() {
    let fx = Fixture::new(YT_DLP_OK).with_ffmpeg(FFMPEG_HANGS);
    let cancel = CancellationToken::new();

    let started = Instant::now();
    let (result, stages) = run_cancelling_at(fx.config(OutputMode::Both), &cancel, |s| {
        matches!(s, PipelineStage::Extracting)
    })
    .await;
    let err = result.unwrap_err();

    assert!(matches!(err, AvParserError::Extract(ExtractError::Cancelled)));
    assert_eq!(err.exit_code(), 130);
    assert!(started.elapsed() < Duration::from_secs(10));

    assert!(!fx.work.video.exists());
    assert!(!fx.work.audio.exists());
    assert!(file_names(&fx.audio_archive).is_empty());
    assert!(file_names(&fx.video_archive).is_empty());
    assert!(!stages
        .iter()
        .any(|s| matches!(s, PipelineStage::Transferring { .. })));
}

#[tokio::test]
async fn interrupt_during_cleanup_is_not_success() {
    let fx = Fixture::new(YT_DLP_OK);
    let cancel = CancellationToken::new();

    let (result, stages) = run_cancelling_at(fx.config(OutputMode::Both), &cancel, |s| {
        matches!(s, PipelineStage::CleaningUp)
    })
    .await;
    let err = result.unwrap_err();

    assert!(matches!(err, AvParserError::Cancelled));
    assert_eq!(err.exit_code(), 130);
    assert!(!fx.work.video.exists());
    assert!(!fx.work.audio.exists());
    assert!(matches!(
        stages.last(),
        Some(PipelineStage::Failed { stage: "interrupt", .. })
    ));
}
