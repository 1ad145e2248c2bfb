//! Camera capture via `rpicam-vid`
//!
//! This module handles:
//! - Building the raw elementary-stream capture command
//! - Running it to completion with interrupt forwarding
//! - Classifying capture failures (busy camera vs. generic failure)

pub mod rpicam;

pub use rpicam::{intermediate_path, RawCapture};

use std::process::ExitStatus;

use crate::error::PirecError;

/// Stderr fragments libcamera prints when the sensor is held or missing
const DEVICE_UNAVAILABLE_MARKERS: &[&str] = &[
    "device or resource busy",
    "failed to acquire camera",
    "no cameras available",
    "camera is in use",
];

/// Turn a non-zero capture exit into the most specific error
pub fn classify_failure(status: ExitStatus, stderr: String) -> PirecError {
    let lower = stderr.to_lowercase();
    if let Some(line) = stderr.lines().find(|line| {
        let line = line.to_lowercase();
        DEVICE_UNAVAILABLE_MARKERS.iter().any(|m| line.contains(m))
    }) {
        return PirecError::device_unavailable(line.trim());
    }

    // Some builds only print the errno name
    if lower.contains("ebusy") {
        return PirecError::device_unavailable(stderr.trim());
    }

    PirecError::CaptureProcessFailure { status, stderr }
}
