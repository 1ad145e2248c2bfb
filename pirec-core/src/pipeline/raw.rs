//! Raw capture then remux

use std::future::Future;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use super::{ensure_parent_dir, RecordOutcome};
use crate::capture::{intermediate_path, RawCapture};
use crate::config::{ResolvedCapture, ToolSettings};
use crate::error::Result;
use crate::mux::Muxer;
use crate::process::remove_best_effort;
use crate::session::{CaptureSession, StopCondition, StopReason};

/// External-process strategy: `rpicam-vid` to a raw file, then `ffmpeg`
pub struct RawPipeline {
    capture: RawCapture,
    muxer: Muxer,
    session: CaptureSession,
}

impl RawPipeline {
    /// Plan a recording of `resolved` into `output`
    pub fn new(tools: &ToolSettings, resolved: &ResolvedCapture, output: impl Into<PathBuf>) -> Self {
        let output = output.into();
        let config = &resolved.config;
        let es_path = intermediate_path(&output, config.codec);

        let capture = RawCapture::new(&tools.rpicam_vid, config, resolved.stop, &es_path);
        let muxer = Muxer::new(&tools.ffmpeg, &es_path, config.frame_rate_hz, &output);
        let session = CaptureSession::new(&output, resolved.stop).with_intermediate(&es_path);

        Self {
            capture,
            muxer,
            session,
        }
    }

    pub fn capture(&self) -> &RawCapture {
        &self.capture
    }

    pub fn muxer(&self) -> &Muxer {
        &self.muxer
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    pub fn intermediate(&self) -> &Path {
        self.capture.es_path()
    }

    /// Record until the time limit or `interrupt`, then mux
    ///
    /// A capture failure skips the mux and removes the partial raw stream.
    /// A mux failure keeps the raw stream and removes the partial container.
    pub async fn run<I>(mut self, interrupt: I) -> Result<RecordOutcome>
    where
        I: Future<Output = ()>,
    {
        ensure_parent_dir(self.session.output_path())?;
        self.session.start()?;

        let outcome = match self.capture.run(interrupt).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Capture failed: {}", e);
                self.session.fail();
                remove_best_effort(self.capture.es_path());
                return Err(e);
            }
        };

        let reason = if outcome.interrupted {
            StopReason::Interrupted
        } else if matches!(self.session.stop_condition(), StopCondition::Duration(_)) {
            StopReason::DurationElapsed
        } else {
            StopReason::ProcessExited
        };
        self.session.begin_stop(reason)?;

        if let Err(e) = self.muxer.run().await {
            error!("Mux failed: {}", e);
            self.session.fail();
            remove_best_effort(self.muxer.output());
            return Err(e);
        }

        self.session.finish()?;
        info!(
            "Saved {} after {:.1?}",
            self.session.output_path().display(),
            self.session.elapsed()
        );
        Ok(RecordOutcome::from_session(&self.session))
    }
}
