//! Recording through a [`CameraHandle`]

use std::future::Future;
use std::path::PathBuf;

use tracing::{error, info, warn};

use super::{ensure_parent_dir, RecordOutcome};
use crate::camera::{CameraHandle, Controls, EncoderSettings};
use crate::config::CaptureConfig;
use crate::error::Result;
use crate::process::remove_best_effort;
use crate::session::{wait_for_stop, CaptureSession, StopCondition, StopTrigger};

/// Library-driven strategy: configure, start, wait, stop, close
pub struct DirectPipeline<C: CameraHandle> {
    camera: C,
    config: CaptureConfig,
    session: CaptureSession,
}

impl<C: CameraHandle> DirectPipeline<C> {
    pub fn new(camera: C, config: CaptureConfig, output: impl Into<PathBuf>, stop: StopCondition) -> Self {
        Self {
            camera,
            config,
            session: CaptureSession::new(output, stop),
        }
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    /// Record until the duration elapses or `interrupt` fires
    ///
    /// The camera is closed on every path, including failures. A failed
    /// recording that got as far as starting also loses its partial container.
    pub async fn run<I>(mut self, interrupt: I) -> Result<RecordOutcome>
    where
        I: Future<Output = ()>,
    {
        let result = self.record(interrupt).await;
        self.camera.close().await;

        match result {
            Ok(()) => Ok(RecordOutcome::from_session(&self.session)),
            Err(e) => {
                error!("Direct recording failed: {}", e);
                // Before start nothing was written, so an existing file stays
                if self.session.started_at().is_some() {
                    remove_best_effort(self.session.output_path());
                }
                self.session.fail();
                Err(e)
            }
        }
    }

    async fn record<I>(&mut self, interrupt: I) -> Result<()>
    where
        I: Future<Output = ()>,
    {
        ensure_parent_dir(self.session.output_path())?;

        let controls = Controls::constant_frame_rate(&self.config);
        self.camera.configure(&self.config)?;
        self.camera.set_controls(&controls)?;

        for warning in self.config.validate() {
            warn!("{}", warning);
        }

        let encoder = EncoderSettings::from_config(&self.config);
        self.camera
            .start_recording(&encoder, self.session.output_path())
            .await?;
        self.session.start()?;

        let trigger = wait_for_stop(
            self.session.stop_condition(),
            interrupt,
            self.camera.wait_exit(),
        )
        .await;

        let reason = trigger.reason();
        if let StopTrigger::ProcessExited(Err(e)) = trigger {
            return Err(e);
        }

        self.session.begin_stop(reason)?;
        self.camera.stop_recording().await?;
        self.session.finish()?;

        info!(
            "Saved {} after {:.1?}",
            self.session.output_path().display(),
            self.session.elapsed()
        );
        Ok(())
    }
}
