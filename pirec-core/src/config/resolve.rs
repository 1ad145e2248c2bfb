//! Merge preset defaults with explicit overrides
//!
//! Precedence, lowest first: baseline preset, named preset, per-field
//! override. Resolution either yields a complete config or fails on the first
//! offending field; nothing partial escapes.

use super::{CaptureConfig, Codec, DefaultSettings, Denoise, Preset, Resolution, BASELINE_PRESET};
use crate::error::{PirecError, Result};
use crate::session::StopCondition;

/// Raw user-supplied values, as typed on the command line
///
/// Numbers are signed so that zero and negative input is reported as an
/// invalid field rather than a parse error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureOverrides {
    pub mode: Option<String>,
    pub size: Option<String>,
    pub fps: Option<i64>,
    pub bitrate: Option<i64>,
    pub buffers: Option<i64>,
    pub codec: Option<String>,
    pub denoise: Option<String>,
    pub duration_secs: Option<i64>,
}

impl CaptureOverrides {
    /// Fill unset mode/codec from the user's config file
    pub fn or_defaults(mut self, defaults: &DefaultSettings) -> Self {
        if self.mode.is_none() {
            self.mode = defaults.mode.clone();
        }
        if self.codec.is_none() {
            self.codec = defaults.codec.clone();
        }
        self
    }
}

/// Outcome of resolution: the config plus when to stop
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCapture {
    pub preset: Preset,
    pub config: CaptureConfig,
    pub stop: StopCondition,
}

fn positive(field: &'static str, value: i64) -> Result<u32> {
    if value <= 0 {
        return Err(PirecError::invalid(
            field,
            format!("must be a positive integer, got {}", value),
        ));
    }
    u32::try_from(value).map_err(|_| PirecError::invalid(field, format!("{} is too large", value)))
}

/// Resolve overrides into a complete capture configuration
pub fn resolve(overrides: &CaptureOverrides) -> Result<ResolvedCapture> {
    let preset = match overrides.mode.as_deref() {
        Some(name) => name.parse::<Preset>()?,
        None => BASELINE_PRESET,
    };

    // Every preset row is complete, so applying the named preset over the
    // baseline replaces every field.
    let mut config = preset.values().to_config();

    if let Some(size) = overrides.size.as_deref() {
        config.resolution = size.parse::<Resolution>()?;
    }
    if let Some(fps) = overrides.fps {
        config.frame_rate_hz = positive("fps", fps)?;
    }
    if let Some(bitrate) = overrides.bitrate {
        config.bitrate_bps = positive("bitrate", bitrate)?;
    }
    if let Some(buffers) = overrides.buffers {
        config.buffer_count = positive("buffers", buffers)?;
    }
    if let Some(codec) = overrides.codec.as_deref() {
        config.codec = codec.parse::<Codec>()?;
    }
    if let Some(denoise) = overrides.denoise.as_deref() {
        config.denoise = denoise.parse::<Denoise>()?;
    }

    let stop = match overrides.duration_secs {
        None | Some(0) => StopCondition::Manual,
        Some(secs) if secs < 0 => {
            return Err(PirecError::invalid(
                "dur",
                format!("duration cannot be negative, got {}", secs),
            ));
        }
        Some(secs) => StopCondition::after_secs(secs.unsigned_abs()),
    };

    config.validate_strict()?;

    Ok(ResolvedCapture {
        preset,
        config,
        stop,
    })
}
