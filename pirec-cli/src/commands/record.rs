//! Record command - raw capture followed by a stream-copy remux

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use pirec_core::config::{resolve, CaptureOverrides, ConfigFile};
use pirec_core::pipeline::RawPipeline;
use pirec_core::session::{ctrl_c, StopCondition};
use tracing::debug;

use super::report_failure;

/// Arguments for the record command
#[derive(Args)]
pub struct RecordArgs {
    /// Output container path (e.g. clip.mp4)
    output: PathBuf,

    /// Duration in seconds (0 = until Ctrl+C)
    #[arg(long, allow_negative_numbers = true)]
    dur: Option<i64>,

    /// Capture preset (wide60, wide60-lowbuf, wide50, wide1536p60, full30, 1080p60)
    #[arg(short, long)]
    mode: Option<String>,

    /// Frame size as WIDTHxHEIGHT
    #[arg(short, long)]
    size: Option<String>,

    /// Frame rate
    #[arg(long, allow_negative_numbers = true)]
    fps: Option<i64>,

    /// Bitrate in bits per second
    #[arg(short, long, allow_negative_numbers = true)]
    bitrate: Option<i64>,

    /// Capture buffer count
    #[arg(long, allow_negative_numbers = true)]
    buffers: Option<i64>,

    /// Video codec (h264, hevc)
    #[arg(short, long)]
    codec: Option<String>,

    /// Sensor denoise (on, off)
    #[arg(long)]
    denoise: Option<String>,
}

impl RecordArgs {
    fn overrides(&self) -> CaptureOverrides {
        CaptureOverrides {
            mode: self.mode.clone(),
            size: self.size.clone(),
            fps: self.fps,
            bitrate: self.bitrate,
            buffers: self.buffers,
            codec: self.codec.clone(),
            denoise: self.denoise.clone(),
            duration_secs: self.dur,
        }
    }
}

/// Record a raw stream, then mux it into the output container
pub async fn record(args: RecordArgs) -> Result<ExitCode> {
    let file = ConfigFile::load_or_default();
    let overrides = args.overrides().or_defaults(&file.defaults);

    let resolved = match resolve(&overrides) {
        Ok(resolved) => resolved,
        Err(e) => return Ok(report_failure(&e)),
    };
    let config = &resolved.config;

    for warning in config.validate() {
        println!("Warning: {}", warning);
    }

    let pipeline = RawPipeline::new(&file.tools, &resolved, &args.output);
    debug!("Capture command: {}", pipeline.capture().command());
    debug!("Mux command: {}", pipeline.muxer().command());

    println!("pirec - Raw Capture\n");
    println!("Configuration:");
    println!("  Preset:      {}", resolved.preset);
    println!("  Resolution:  {}", config.resolution);
    println!("  Framerate:   {} fps", config.frame_rate_hz);
    println!("  Bitrate:     {} bps", config.bitrate_bps);
    println!("  Buffers:     {}", config.buffer_count);
    println!("  Denoise:     {}", config.denoise);
    println!("  Duration:    {}", resolved.stop);
    println!();
    println!(
        "Recording raw ({}) → {}",
        config.codec.display_name(),
        pipeline.intermediate().display()
    );
    if resolved.stop == StopCondition::Manual {
        println!("Press Ctrl+C to stop...");
    }

    match pipeline.run(ctrl_c()).await {
        Ok(outcome) => {
            println!("Muxed → {}", outcome.output.display());
            println!(
                "Finished. File saved: {} ({:.1}s)",
                outcome.output.display(),
                outcome.elapsed.as_secs_f64()
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => Ok(report_failure(&e)),
    }
}
