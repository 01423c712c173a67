mod args;
mod commands;

use anyhow::Result;
use av_parser_core::AvParserError;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use args::{Cli, Commands};

/// Exit code for bad usage, matching clap's own parse errors.
const EXIT_USAGE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let filter = match cli.verbose {
        0 => "av_parser=info,av_parser_core=info",
        1 => "av_parser=debug,av_parser_core=debug",
        2 => "av_parser=trace,av_parser_core=trace",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("\nError: {:#}", e);
            let code = e
                .downcast_ref::<AvParserError>()
                .map(AvParserError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

async fn dispatch(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Some(Commands::Doctor) => commands::doctor::run(cli.config.as_deref()).await?,
        Some(Commands::Config) => commands::config::run(cli.config.as_deref()).await?,
        Some(Commands::Install { force }) => {
            commands::install::run(force, cli.config.as_deref()).await?
        }
        None => match cli.url {
            Some(url) => {
                commands::run::run(
                    &url,
                    cli.mode.output_mode(),
                    cli.keep_temp,
                    cli.config.as_deref(),
                )
                .await?
            }
            None => {
                use clap::CommandFactory;
                eprintln!("Missing URL\n");
                eprintln!("{}", Cli::command().render_help());
                return Ok(ExitCode::from(EXIT_USAGE));
            }
        },
    }

    Ok(ExitCode::SUCCESS)
}
