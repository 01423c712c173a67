//! av-parser-core: download a video, extract its audio, archive both

pub mod config;
pub mod downloader;
pub mod error;
pub mod extractor;
pub mod installer;
pub mod pipeline;
mod process;
pub mod shutdown;
pub mod transfer;
pub mod workdir;

pub use config::Config;
pub use error::{AvParserError, Result};
pub use pipeline::{OutputMode, Pipeline, PipelineConfig, PipelineStage, RunReport};
