//! Raw elementary-stream capture with `rpicam-vid`

use std::future::Future;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::classify_failure;
use crate::config::{CaptureConfig, Codec};
use crate::error::Result;
use crate::process::{run_to_completion, ExternalCommand};
use crate::session::StopCondition;

/// Raw stream path next to `output`: same base name, codec extension
pub fn intermediate_path(output: &Path, codec: Codec) -> PathBuf {
    output.with_extension(codec.extension())
}

/// One `rpicam-vid` run writing a raw stream file
#[derive(Debug, Clone)]
pub struct RawCapture {
    command: ExternalCommand,
    es_path: PathBuf,
}

/// How a successful capture ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOutcome {
    /// The run was cut short by the caller's interrupt
    pub interrupted: bool,
}

impl RawCapture {
    /// Build the capture command for `config`
    ///
    /// The time limit is `stop` in milliseconds; 0 leaves the run unlimited.
    pub fn new(
        binary: &str,
        config: &CaptureConfig,
        stop: StopCondition,
        es_path: impl Into<PathBuf>,
    ) -> Self {
        let es_path = es_path.into();
        let command = ExternalCommand::new(binary)
            .flag("-t", stop.timeout_ms())
            .arg("--nopreview")
            .arg("--inline")
            .flag("--buffer-count", config.buffer_count)
            .flag("--codec", config.codec.rpicam_name())
            .flag("--bitrate", config.bitrate_bps)
            .flag("--framerate", config.frame_rate_hz)
            .flag("--width", config.resolution.width)
            .flag("--height", config.resolution.height)
            .flag("--denoise", config.denoise.rpicam_name())
            .arg("-o")
            .arg(es_path.as_os_str());

        Self { command, es_path }
    }

    pub fn command(&self) -> &ExternalCommand {
        &self.command
    }

    pub fn es_path(&self) -> &Path {
        &self.es_path
    }

    /// Run the capture until it exits by itself or `interrupt` fires
    pub async fn run<I>(&self, interrupt: I) -> Result<CaptureOutcome>
    where
        I: Future<Output = ()>,
    {
        info!("Capturing raw stream: {}", self.command);
        let output = run_to_completion(&self.command, interrupt).await?;

        if output.status.success() {
            return Ok(CaptureOutcome {
                interrupted: output.interrupted,
            });
        }

        // rpicam-vid may report a signal exit after Ctrl+C; whatever it
        // already wrote is still a usable stream.
        if output.interrupted && has_data(&self.es_path) {
            warn!(
                "Capture exited with {} after interrupt; keeping recorded stream",
                output.status
            );
            return Ok(CaptureOutcome { interrupted: true });
        }

        Err(classify_failure(output.status, output.stderr))
    }
}

fn has_data(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false)
}
