use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use av_parser_core::{
    shutdown::InterruptListener, AvParserError, Config, OutputMode, Pipeline, PipelineConfig,
    PipelineStage,
};

pub async fn run(
    url: &str,
    mode: OutputMode,
    keep_temp: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = Config::load(config_path).map_err(AvParserError::from)?;

    // Archive settings are checked before anything is downloaded.
    let mut pipeline_config =
        PipelineConfig::from_config(url, mode, &config).map_err(AvParserError::from)?;
    pipeline_config.keep_temp |= keep_temp;

    if mode != OutputMode::Both {
        info!("Saving {}", mode);
    }
    println!("press 'Ctrl+C' to terminate.");

    let cancel = CancellationToken::new();
    let listener = InterruptListener::spawn(cancel.clone());

    // Create progress channel
    let (tx, mut rx) = mpsc::channel(32);

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} [{elapsed_precise}] {bar:40.cyan/blue} {msg}",
        )?
        .progress_chars("=>-"),
    );

    let progress_handle = tokio::spawn(async move {
        while let Some(stage) = rx.recv().await {
            match stage {
                PipelineStage::Preparing => {
                    pb.set_message("Locating yt-dlp and ffmpeg...");
                }
                PipelineStage::Downloading { progress } => {
                    pb.set_position((progress * 60.0) as u64);
                    pb.set_message("Downloading video...");
                }
                PipelineStage::Extracting => {
                    pb.set_position(60);
                    pb.set_message("Extracting audio...");
                }
                PipelineStage::Skipped { stage } => {
                    pb.set_message(format!("Skipped {}", stage));
                }
                PipelineStage::Transferring { kind } => {
                    pb.set_position(80);
                    pb.set_message(format!("Transferring {} files...", kind));
                }
                PipelineStage::CleaningUp => {
                    pb.set_position(95);
                    pb.set_message("Cleaning up...");
                }
                PipelineStage::Complete { archived, duration } => {
                    pb.set_position(100);
                    pb.finish_with_message(format!(
                        "Done: {} file(s) archived ({:.1}s)",
                        archived,
                        duration.as_secs_f32()
                    ));
                }
                PipelineStage::Failed { stage, error } => {
                    pb.abandon_with_message(format!("Failed at {}: {}", stage, error));
                }
            }
        }
    });

    let pipeline = Pipeline::new(pipeline_config, tx);
    let result = pipeline.run(&cancel).await;

    // Closing the channel lets the progress task finish
    drop(pipeline);
    progress_handle.await?;
    let interrupted = listener.finish().await;
    if interrupted && result.is_ok() {
        return Err(AvParserError::Cancelled.into());
    }

    let report = result?;

    for path in report.video.iter().chain(&report.audio) {
        println!("Archived: {}", path.display());
    }
    println!("fin.");

    Ok(())
}
