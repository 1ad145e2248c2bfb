//! Configuration types for pirec
//!
//! Provides the capture preset table, per-field override resolution and the
//! on-disk user configuration.

mod file;
mod preset;
mod resolve;

pub use file::{sample_config, ConfigFile, DefaultSettings, DirectSettings, ToolSettings};
pub use preset::{Preset, PresetValues, BASELINE_PRESET};
pub use resolve::{resolve, CaptureOverrides, ResolvedCapture};

use serde::{Deserialize, Serialize};

use crate::error::{PirecError, Result};

/// Nanoseconds per second, used for frame-duration math
pub const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// Video codec produced by the capture binary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    /// H.264 / AVC
    #[default]
    H264,
    /// H.265 / HEVC
    Hevc,
}

impl Codec {
    /// Value passed to `rpicam-vid --codec`
    pub fn rpicam_name(&self) -> &'static str {
        match self {
            Self::H264 => "h264",
            Self::Hevc => "hevc",
        }
    }

    /// FFmpeg demuxer name for the raw elementary stream
    pub fn ffmpeg_format(&self) -> &'static str {
        match self {
            Self::H264 => "h264",
            Self::Hevc => "hevc",
        }
    }

    /// File extension of the raw elementary stream
    pub fn extension(&self) -> &'static str {
        match self {
            Self::H264 => "h264",
            Self::Hevc => "hevc",
        }
    }

    /// Get the codec name for display
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::H264 => "H.264",
            Self::Hevc => "HEVC",
        }
    }
}

impl std::fmt::Display for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for Codec {
    type Err = PirecError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "h264" => Ok(Self::H264),
            "hevc" => Ok(Self::Hevc),
            _ => Err(PirecError::invalid(
                "codec",
                format!("unknown codec '{}' (expected h264 or hevc)", s),
            )),
        }
    }
}

/// ISP noise-reduction toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Denoise {
    /// Denoise enabled (more memory pressure)
    On,
    /// Denoise disabled
    #[default]
    Off,
}

impl Denoise {
    /// Value passed to `rpicam-vid --denoise`
    pub fn rpicam_name(&self) -> &'static str {
        match self {
            Self::On => "auto",
            Self::Off => "off",
        }
    }
}

impl std::fmt::Display for Denoise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::On => write!(f, "on"),
            Self::Off => write!(f, "off"),
        }
    }
}

impl std::str::FromStr for Denoise {
    type Err = PirecError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            _ => Err(PirecError::invalid(
                "denoise",
                format!("unknown value '{}' (expected on or off)", s),
            )),
        }
    }
}

/// Sensor output size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl std::str::FromStr for Resolution {
    type Err = PirecError;

    /// Parse `<width>x<height>` with both sides positive integers
    fn from_str(s: &str) -> Result<Self> {
        let malformed = || {
            PirecError::invalid(
                "size",
                format!("'{}' is not WIDTHxHEIGHT with positive integers", s),
            )
        };

        let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(malformed)?;
        let width: u32 = w.trim().parse().map_err(|_| malformed())?;
        let height: u32 = h.trim().parse().map_err(|_| malformed())?;

        if width == 0 || height == 0 {
            return Err(malformed());
        }

        Ok(Self { width, height })
    }
}

/// Fully-resolved capture parameters
///
/// Built by [`resolve`] or [`CaptureConfig::direct_default`]; treated as
/// immutable once a recording has started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Sensor output size
    pub resolution: Resolution,
    /// Target constant frame rate
    pub frame_rate_hz: u32,
    /// Encoder bitrate in bits per second
    pub bitrate_bps: u32,
    /// Number of capture buffers
    pub buffer_count: u32,
    /// Elementary stream codec
    pub codec: Codec,
    /// ISP denoise stage
    pub denoise: Denoise,
    /// Fixed exposure in microseconds
    pub exposure_time_us: u32,
    /// Fixed analogue gain
    pub analogue_gain: f32,
    /// Whether the ISP may adjust exposure (off for CFR)
    pub auto_exposure_enabled: bool,
}

/// Default fixed exposure (1/1000 s)
pub const DEFAULT_EXPOSURE_TIME_US: u32 = 1000;

/// Default fixed analogue gain
pub const DEFAULT_ANALOGUE_GAIN: f32 = 4.0;

/// Bitrate used by the direct recording strategy
pub const DIRECT_BITRATE_BPS: u32 = 10_000_000;

impl CaptureConfig {
    /// Configuration used by `pirec direct`: wide 60 fps CFR, 10 Mb/s H.264
    pub fn direct_default() -> Self {
        BASELINE_PRESET.values().to_config().with_bitrate(DIRECT_BITRATE_BPS)
    }

    /// Set the bitrate in bits per second
    pub fn with_bitrate(mut self, bitrate_bps: u32) -> Self {
        self.bitrate_bps = bitrate_bps;
        self
    }

    /// Set the fixed exposure time
    pub fn with_exposure_time_us(mut self, exposure_time_us: u32) -> Self {
        self.exposure_time_us = exposure_time_us;
        self
    }

    /// Set the fixed analogue gain
    pub fn with_analogue_gain(mut self, gain: f32) -> Self {
        self.analogue_gain = gain;
        self
    }

    /// Frame duration for the target rate, rounded to whole nanoseconds
    pub fn frame_duration_ns(&self) -> u64 {
        (NANOS_PER_SECOND / f64::from(self.frame_rate_hz.max(1))).round() as u64
    }

    /// Pixels per second at this size and rate
    pub fn pixel_rate(&self) -> u64 {
        u64::from(self.resolution.width)
            * u64::from(self.resolution.height)
            * u64::from(self.frame_rate_hz)
    }

    /// Hard checks for values that can never produce a recording
    pub fn validate_strict(&self) -> Result<()> {
        if self.resolution.width == 0 || self.resolution.height == 0 {
            return Err(PirecError::invalid("size", "resolution cannot be zero"));
        }
        if self.frame_rate_hz == 0 {
            return Err(PirecError::invalid("fps", "frame rate must be positive"));
        }
        if self.bitrate_bps == 0 {
            return Err(PirecError::invalid("bitrate", "bitrate must be positive"));
        }
        if self.buffer_count == 0 {
            return Err(PirecError::invalid("buffers", "buffer count must be positive"));
        }
        if !(self.analogue_gain.is_finite() && self.analogue_gain > 0.0) {
            return Err(PirecError::invalid(
                "analogue_gain",
                "analogue gain must be a positive number",
            ));
        }
        Ok(())
    }

    /// Soft warnings for settings that are likely to drop frames
    ///
    /// An empty list means the configuration looks fine.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        let frame_us = self.frame_duration_ns() / 1000;
        if !self.auto_exposure_enabled && u64::from(self.exposure_time_us) > frame_us {
            warnings.push(format!(
                "Exposure {} us is longer than the {} us frame time; the sensor cannot hold {} fps.",
                self.exposure_time_us, frame_us, self.frame_rate_hz
            ));
        }

        // 2304x1296@60 is roughly the limit of the binned sensor modes
        if self.pixel_rate() > 180_000_000 {
            warnings.push(format!(
                "{}@{} exceeds what the camera can stream; expect a lower real frame rate.",
                self.resolution, self.frame_rate_hz
            ));
        }

        if self.buffer_count > 6 {
            warnings.push(format!(
                "{} buffers may exhaust CMA memory on small boards.",
                self.buffer_count
            ));
        }

        if self.denoise == Denoise::On {
            warnings.push("Denoise on increases memory use; turn it off if capture fails.".to_string());
        }

        warnings
    }
}
