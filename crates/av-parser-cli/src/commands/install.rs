use anyhow::{Context, Result};
use std::path::Path;
use tokio_util::sync::CancellationToken;

use av_parser_core::{installer, shutdown::InterruptListener, AvParserError, Config};

pub async fn run(force: bool, config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path).map_err(AvParserError::from)?;

    if !force {
        if let Some(path) = installer::find_yt_dlp(&config.paths) {
            println!("yt-dlp already available at {}", path.display());
            println!("Use --force to install the managed copy anyway.");
            return Ok(());
        }
    }

    let target = installer::managed_path().context("Could not determine cache directory")?;
    println!("Installing yt-dlp to {}...", target.display());

    let cancel = CancellationToken::new();
    let listener = InterruptListener::spawn(cancel.clone());
    let result = installer::install(&target, &cancel).await;
    listener.finish().await;

    let path = result.map_err(AvParserError::from)?;
    println!("Installed: {}", path.display());
    Ok(())
}
