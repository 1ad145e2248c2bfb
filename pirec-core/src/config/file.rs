//! Configuration file loading
//!
//! Loads user configuration from `~/.config/pirec/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::{DEFAULT_ANALOGUE_GAIN, DEFAULT_EXPOSURE_TIME_US, DIRECT_BITRATE_BPS};
use crate::error::{PirecError, Result};

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Defaults for `pirec record`
    #[serde(default)]
    pub defaults: DefaultSettings,

    /// External binaries
    #[serde(default)]
    pub tools: ToolSettings,

    /// Settings for `pirec direct`
    #[serde(default)]
    pub direct: DirectSettings,
}

/// Defaults applied when the matching flag is omitted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultSettings {
    /// Preset used when `--mode` is omitted (baseline if unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    /// Codec used when `--codec` is omitted (h264 if unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
}

/// Paths of the external collaborators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSettings {
    /// Capture binary
    #[serde(default = "default_rpicam_vid")]
    pub rpicam_vid: String,

    /// Remux binary
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,
}

/// Direct recording settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectSettings {
    /// Output file when no path is given
    #[serde(default = "default_direct_output")]
    pub output: PathBuf,

    /// Fixed exposure time in microseconds
    #[serde(default = "default_exposure_time_us")]
    pub exposure_time_us: u32,

    /// Fixed analogue gain
    #[serde(default = "default_analogue_gain")]
    pub analogue_gain: f32,

    /// Encoder bitrate in bits per second
    #[serde(default = "default_direct_bitrate")]
    pub bitrate: u32,
}

// Default value functions
fn default_rpicam_vid() -> String {
    "rpicam-vid".to_string()
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_direct_output() -> PathBuf {
    PathBuf::from("video_60fps.mp4")
}

fn default_exposure_time_us() -> u32 {
    DEFAULT_EXPOSURE_TIME_US
}

fn default_analogue_gain() -> f32 {
    DEFAULT_ANALOGUE_GAIN
}

fn default_direct_bitrate() -> u32 {
    DIRECT_BITRATE_BPS
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            rpicam_vid: default_rpicam_vid(),
            ffmpeg: default_ffmpeg(),
        }
    }
}

impl Default for DirectSettings {
    fn default() -> Self {
        Self {
            output: default_direct_output(),
            exposure_time_us: default_exposure_time_us(),
            analogue_gain: default_analogue_gain(),
            bitrate: default_direct_bitrate(),
        }
    }
}

impl ConfigFile {
    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("pirec").join("config.toml")
        } else if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("pirec")
                .join("config.toml")
        } else {
            PathBuf::from("/etc/pirec/config.toml")
        }
    }

    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_path())
    }

    /// Load configuration from a specific path
    pub fn load_from(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| PirecError::config(format!("Failed to read config file: {}", e)))?;

        let config: ConfigFile = toml::from_str(&content)
            .map_err(|e| PirecError::config(format!("Failed to parse config file: {}", e)))?;

        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Load configuration, logging warnings but returning defaults on error
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to load config file: {}, using defaults", e);
                Self::default()
            }
        }
    }
}

/// Generate a sample configuration file
pub fn sample_config() -> String {
    r#"# pirec configuration

[defaults]
# Preset used when --mode is omitted:
#   wide60, wide60-lowbuf, wide50, wide1536p60, full30, 1080p60
# mode = "wide60"

# Codec used when --codec is omitted: h264, hevc
# codec = "h264"

[tools]
# Capture binary (rpicam-apps; older images ship libcamera-vid)
rpicam_vid = "rpicam-vid"

# Remux binary
ffmpeg = "ffmpeg"

[direct]
# Output file for 'pirec direct' when no path is given
output = "video_60fps.mp4"

# Fixed exposure in microseconds; must stay below the frame time
# (16666 us at 60 fps). Gain compensates for brightness.
exposure_time_us = 1000

# Fixed analogue gain
analogue_gain = 4.0

# H.264 bitrate in bits per second
bitrate = 10000000
"#
    .to_string()
}
