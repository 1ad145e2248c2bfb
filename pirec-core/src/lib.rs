//! pirec core library
//!
//! Constant-frame-rate recording from a Raspberry Pi camera module.
//!
//! This library provides:
//! - A preset table and override resolution for capture parameters
//! - Raw elementary-stream capture through `rpicam-vid`
//! - Stream-copy remuxing into MP4 through `ffmpeg`
//! - A camera handle that pins the frame duration and locks exposure
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ Config       │───▶│ Capture      │───▶│ Mux /        │
//! │ (presets)    │    │ (rpicam-vid) │    │ Finalize     │
//! └──────────────┘    └──────────────┘    └──────────────┘
//! ```

pub mod camera;
pub mod capture;
pub mod config;
pub mod error;
pub mod mux;
pub mod pipeline;
pub mod process;
pub mod session;

pub use camera::{CameraHandle, Controls, EncoderSettings, RpicamCamera};
pub use config::{CaptureConfig, CaptureOverrides, Codec, ConfigFile, Denoise, Preset, Resolution};
pub use error::{PirecError, Result};
pub use pipeline::{DirectPipeline, RawPipeline, RecordOutcome};
pub use session::{CaptureSession, SessionState, SessionStatus, StopCondition, StopReason};
