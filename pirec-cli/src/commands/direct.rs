//! Direct command - record through the camera handle with locked exposure

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use pirec_core::camera::{Controls, RpicamCamera};
use pirec_core::config::{CaptureConfig, ConfigFile};
use pirec_core::pipeline::DirectPipeline;
use pirec_core::session::{ctrl_c, StopCondition};

use super::report_failure;

/// Arguments for the direct command
#[derive(Args)]
pub struct DirectArgs {
    /// Output container path (default from config, video_60fps.mp4)
    output: Option<PathBuf>,

    /// Duration in seconds (omit or 0 = until Ctrl+C)
    duration: Option<u64>,

    /// Camera index
    #[arg(long, default_value = "0")]
    camera: u32,
}

/// Record at a pinned frame duration until the duration elapses or Ctrl+C
pub async fn direct(args: DirectArgs) -> Result<ExitCode> {
    let file = ConfigFile::load_or_default();
    let output = args.output.unwrap_or_else(|| file.direct.output.clone());
    let stop = StopCondition::after_secs(args.duration.unwrap_or(0));

    let config = CaptureConfig::direct_default()
        .with_bitrate(file.direct.bitrate)
        .with_exposure_time_us(file.direct.exposure_time_us)
        .with_analogue_gain(file.direct.analogue_gain);
    let controls = Controls::constant_frame_rate(&config);

    println!("pirec - Direct Capture\n");
    println!("Configuration:");
    println!("  Resolution:  {}", config.resolution);
    println!("  Framerate:   {} fps (constant)", config.frame_rate_hz);
    println!(
        "  Frame time:  {} ns",
        controls.frame_duration_limits.0
    );
    println!("  Exposure:    {} us", controls.exposure_time_us);
    println!("  Gain:        {}", controls.analogue_gain);
    println!("  Bitrate:     {} bps", config.bitrate_bps);
    println!("  Duration:    {}", stop);
    println!();

    let camera = RpicamCamera::open(file.tools, args.camera);
    let pipeline = DirectPipeline::new(camera, config, &output, stop);

    println!("Recording → {}", output.display());
    if stop == StopCondition::Manual {
        println!("Press Ctrl+C to stop...");
    }

    match pipeline.run(ctrl_c()).await {
        Ok(outcome) => {
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
