use anyhow::Result;
use std::path::Path;

use av_parser_core::config::{
    user_config_path, Config, AUDIO_ARCHIVE_ENV, ENV_PREFIX, VIDEO_ARCHIVE_ENV,
};
use av_parser_core::AvParserError;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path).map_err(AvParserError::from)?;

    println!("av-parser configuration\n");
    print!("{}", config.to_toml().map_err(AvParserError::from)?);

    if config.archive_dirs().is_err() {
        println!("\n# archive directories are not fully configured");
    }

    // Show config file locations
    println!("\nConfig sources (later entries win):");
    if let Some(user_config) = user_config_path() {
        println!("  1. {}", user_config.display());
    }
    if let Some(p) = config_path {
        println!("  2. {} (specified)", p.display());
    }
    println!("  3. Environment variables ({}*, section and key joined by __)", ENV_PREFIX);
    println!("  4. {} and {}", VIDEO_ARCHIVE_ENV, AUDIO_ARCHIVE_ENV);

    Ok(())
}
