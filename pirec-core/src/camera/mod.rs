//! In-process camera handle abstraction
//!
//! A [`CameraHandle`] is configured, given a [`Controls`] map, bound to an
//! encoder and a file sink, then started and stopped. The production handle
//! is [`RpicamCamera`]; tests drive the pipeline with a mock.

pub mod rpicam;

pub use rpicam::RpicamCamera;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{CaptureConfig, Codec};
use crate::error::Result;

/// Sensor controls applied before recording
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Controls {
    /// Let the ISP adjust exposure and gain
    pub ae_enable: bool,
    /// (min, max) frame duration in nanoseconds
    pub frame_duration_limits: (u64, u64),
    /// Exposure time in microseconds
    pub exposure_time_us: u32,
    /// Analogue gain multiplier
    pub analogue_gain: f32,
}

impl Controls {
    /// Controls that hold `config.frame_rate_hz` exactly
    ///
    /// Both frame-duration bounds are pinned to the same value and
    /// auto-exposure is locked off, so low light cannot stretch frames.
    pub fn constant_frame_rate(config: &CaptureConfig) -> Self {
        let frame_ns = config.frame_duration_ns();
        Self {
            ae_enable: false,
            frame_duration_limits: (frame_ns, frame_ns),
            exposure_time_us: config.exposure_time_us,
            analogue_gain: config.analogue_gain,
        }
    }

    /// Whether min and max frame duration coincide
    pub fn is_constant_frame_rate(&self) -> bool {
        self.frame_duration_limits.0 == self.frame_duration_limits.1
    }

    /// Highest frame rate the duration window allows
    pub fn max_frame_rate(&self) -> f64 {
        crate::config::NANOS_PER_SECOND / self.frame_duration_limits.0.max(1) as f64
    }
}

/// Encoder bound to a recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderSettings {
    pub codec: Codec,
    pub bitrate_bps: u32,
}

impl EncoderSettings {
    pub fn from_config(config: &CaptureConfig) -> Self {
        Self {
            codec: config.codec,
            bitrate_bps: config.bitrate_bps,
        }
    }
}

/// Camera lifecycle used by the direct pipeline
///
/// `close` must be safe to call in any state and more than once; the
/// pipeline calls it on every exit path.
#[allow(async_fn_in_trait)]
pub trait CameraHandle {
    /// Apply stream configuration (size, rate, buffers)
    fn configure(&mut self, config: &CaptureConfig) -> Result<()>;

    /// Apply sensor controls
    fn set_controls(&mut self, controls: &Controls) -> Result<()>;

    /// Start encoding into `output`
    async fn start_recording(&mut self, encoder: &EncoderSettings, output: &Path) -> Result<()>;

    /// Resolve when the recording ends without being asked to
    ///
    /// `Ok` means the camera finished cleanly; errors carry the failure.
    async fn wait_exit(&mut self) -> Result<()>;

    /// Stop capturing, flush the encoder and close the sink
    async fn stop_recording(&mut self) -> Result<()>;

    /// Release the camera
    async fn close(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Preset;

    #[test]
    fn test_cfr_controls_pin_both_bounds() {
        for preset in Preset::ALL {
            let config = preset.values().to_config();
            let controls = Controls::constant_frame_rate(&config);
            let expected = (1e9 / f64::from(config.frame_rate_hz)).round() as u64;

            assert_eq!(controls.frame_duration_limits, (expected, expected));
            assert!(controls.is_constant_frame_rate());
            assert!(!controls.ae_enable);
        }
    }

    #[test]
    fn test_cfr_ignores_auto_exposure_request() {
        let mut config = CaptureConfig::direct_default();
        config.auto_exposure_enabled = true;
        assert!(!Controls::constant_frame_rate(&config).ae_enable);
    }

    #[test]
    fn test_max_frame_rate() {
        let controls = Controls::constant_frame_rate(&CaptureConfig::direct_default());
        assert!((controls.max_frame_rate() - 60.0).abs() < 1e-3);
    }
}
