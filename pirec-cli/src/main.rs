//! pirec CLI
//!
//! Constant-frame-rate recording from a Raspberry Pi camera module.
//!
//! # Usage
//!
//! ```bash
//! # Record 10 seconds with the default preset
//! pirec record clip.mp4 --dur 10
//!
//! # Record until Ctrl+C at 1536x864
//! pirec record clip.mp4 --mode wide1536p60
//!
//! # Locked-exposure 60 fps recording through the camera handle
//! pirec direct video_60fps.mp4 30
//! ```

mod commands;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// pirec - 60 fps constant-frame-rate Pi camera capture
#[derive(Parser)]
#[command(name = "pirec")]
#[command(version)]
#[command(about = "Constant-frame-rate Raspberry Pi camera capture", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture a raw stream with rpicam-vid, then remux it to MP4
    #[command(alias = "rec")]
    Record(commands::RecordArgs),

    /// Record through the camera handle with exposure locked
    Direct(commands::DirectArgs),

    /// List the capture presets
    Presets(commands::PresetsArgs),

    /// Manage the configuration file
    Config(commands::ConfigArgs),

    /// Check that the capture and mux tools are installed
    Info,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("pirec={}", level).parse()?)
                .add_directive(format!("pirec_core={}", level).parse()?),
        )
        .with_target(false)
        .init();

    // Recording commands report their own failures and only return the code
    let code = match cli.command {
        Commands::Record(args) => commands::record(args).await?,
        Commands::Direct(args) => commands::direct(args).await?,
        Commands::Presets(args) => {
            commands::presets(args)?;
            ExitCode::SUCCESS
        }
        Commands::Config(args) => {
            commands::config(args).await?;
            ExitCode::SUCCESS
        }
        Commands::Info => {
            commands::info().await?;
            ExitCode::SUCCESS
        }
    };

    Ok(code)
}
