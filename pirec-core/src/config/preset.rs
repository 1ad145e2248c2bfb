//! Named capture presets
//!
//! The table is fixed at compile time and never mutated.

use serde::{Deserialize, Serialize};

use super::{
    CaptureConfig, Codec, Denoise, Resolution, DEFAULT_ANALOGUE_GAIN, DEFAULT_EXPOSURE_TIME_US,
};
use crate::error::{PirecError, Result};

/// Preset applied before any named preset or override
pub const BASELINE_PRESET: Preset = Preset::Wide60;

/// Capture parameters carried by a preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetValues {
    pub resolution: Resolution,
    pub frame_rate_hz: u32,
    pub bitrate_bps: u32,
    pub buffer_count: u32,
    pub denoise: Denoise,
}

impl PresetValues {
    /// Expand into a full config with default codec and locked exposure
    pub fn to_config(self) -> CaptureConfig {
        CaptureConfig {
            resolution: self.resolution,
            frame_rate_hz: self.frame_rate_hz,
            bitrate_bps: self.bitrate_bps,
            buffer_count: self.buffer_count,
            codec: Codec::default(),
            denoise: self.denoise,
            exposure_time_us: DEFAULT_EXPOSURE_TIME_US,
            analogue_gain: DEFAULT_ANALOGUE_GAIN,
            auto_exposure_enabled: false,
        }
    }
}

/// Capture mode preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Preset {
    /// 2304x1296 @ 60fps, 2x2 binned wide field of view (baseline)
    #[default]
    #[serde(rename = "wide60")]
    Wide60,
    /// 2304x1296 @ 60fps with two buffers for low-memory boards
    #[serde(rename = "wide60-lowbuf")]
    Wide60LowBuf,
    /// 2304x1296 @ 50fps
    #[serde(rename = "wide50")]
    Wide50,
    /// 1536x864 @ 60fps
    #[serde(rename = "wide1536p60")]
    Wide1536p60,
    /// 4608x2592 @ 30fps, full sensor
    #[serde(rename = "full30")]
    Full30,
    /// 1920x1080 @ 60fps, cropped
    #[serde(rename = "1080p60")]
    P1080_60,
}

impl Preset {
    /// Every preset, in table order
    pub const ALL: [Preset; 6] = [
        Self::Wide60,
        Self::Wide60LowBuf,
        Self::Wide50,
        Self::Wide1536p60,
        Self::Full30,
        Self::P1080_60,
    ];

    /// Name accepted by `--mode`
    pub fn name(&self) -> &'static str {
        match self {
            Self::Wide60 => "wide60",
            Self::Wide60LowBuf => "wide60-lowbuf",
            Self::Wide50 => "wide50",
            Self::Wide1536p60 => "wide1536p60",
            Self::Full30 => "full30",
            Self::P1080_60 => "1080p60",
        }
    }

    /// The preset's capture parameters
    pub fn values(&self) -> PresetValues {
        let (w, h, fps, bitrate, buffers) = match self {
            Self::Wide60 => (2304, 1296, 60, 6_000_000, 4),
            Self::Wide60LowBuf => (2304, 1296, 60, 5_000_000, 2),
            Self::Wide50 => (2304, 1296, 50, 6_000_000, 2),
            Self::Wide1536p60 => (1536, 864, 60, 5_000_000, 3),
            Self::Full30 => (4608, 2592, 30, 25_000_000, 4),
            Self::P1080_60 => (1920, 1080, 60, 5_000_000, 3),
        };

        PresetValues {
            resolution: Resolution::new(w, h),
            frame_rate_hz: fps,
            bitrate_bps: bitrate,
            buffer_count: buffers,
            denoise: Denoise::Off,
        }
    }

    /// Comma-separated preset names for error messages
    pub fn names() -> String {
        Self::ALL
            .iter()
            .map(Preset::name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Preset {
    type Err = PirecError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| {
                PirecError::invalid(
                    "mode",
                    format!("unknown preset '{}' (valid: {})", s, Self::names()),
                )
            })
    }
}
