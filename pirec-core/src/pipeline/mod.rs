//! Recording pipelines
//!
//! Orchestrates one capture session from start to a finalized container.
//!
//! ```text
//! raw:     rpicam-vid ──▶ clip.h264 ──▶ ffmpeg -c copy ──▶ clip.mp4
//! direct:  rpicam-vid ──(stdout)──▶ ffmpeg -c copy ──▶ clip.mp4
//! ```
//!
//! Both pipelines take the interrupt trigger as a future so that Ctrl+C and
//! tests stop them the same way, and both finalize on every exit path.

mod direct;
mod raw;

pub use direct::DirectPipeline;
pub use raw::RawPipeline;

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::error::{PirecError, Result, ResultExt};
use crate::session::{CaptureSession, SessionStatus, StopReason};

/// Summary of a finished recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutcome {
    /// Final container path
    pub output: PathBuf,
    /// What ended the recording
    pub reason: StopReason,
    /// Wall-clock recording time
    pub elapsed: Duration,
    /// Terminal session status
    pub status: SessionStatus,
}

impl RecordOutcome {
    fn from_session(session: &CaptureSession) -> Self {
        Self {
            output: session.output_path().to_path_buf(),
            reason: session.stop_reason().unwrap_or(StopReason::ProcessExited),
            elapsed: session.elapsed(),
            status: session.status().unwrap_or(SessionStatus::StoppedNormally),
        }
    }
}

/// Create the output's parent directory if it does not exist
pub fn ensure_parent_dir(output: &Path) -> Result<()> {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            debug!("Creating output directory {}", parent.display());
            std::fs::create_dir_all(parent)
                .map_err(PirecError::from)
                .context(format!("Creating output directory {}", parent.display()))
        }
        _ => Ok(()),
    }
}
