//! Error types for pirec

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

use crate::session::SessionState;

/// Result type alias using PirecError
pub type Result<T> = std::result::Result<T, PirecError>;

/// Hint printed when the capture binary exits non-zero
pub const CAPTURE_REMEDIATION_HINT: &str = "Hints: set gpu_mem=256 and cma=256M, reduce resolution/fps/bitrate, --buffers 2, --denoise off.";

/// Main error type for pirec operations
#[derive(Debug, Error)]
pub enum PirecError {
    /// Bad CLI value, preset name or config field
    #[error("Invalid configuration for '{field}': {message}")]
    InvalidConfiguration { field: &'static str, message: String },

    /// Camera is busy (held by another process) or absent
    #[error("Camera unavailable: {0}")]
    DeviceUnavailable(String),

    /// External capture process exited non-zero
    #[error("Recording failed ({status})")]
    CaptureProcessFailure { status: ExitStatus, stderr: String },

    /// External remux process exited non-zero
    #[error("Muxing failed ({status}); raw stream kept at {}", .intermediate.display())]
    MuxFailure {
        status: ExitStatus,
        stderr: String,
        intermediate: PathBuf,
    },

    /// Output sink (stream-copy muxer) exited non-zero during a direct recording
    #[error("Output sink failed ({status})")]
    SinkFailure { status: ExitStatus, stderr: String },

    /// Operation needs a recording that has not been started
    #[error("No active recording")]
    NoActiveRecording,

    /// An external binary could not be started at all
    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Config file read/parse/write error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session state machine misuse
    #[error("Illegal session transition: {from:?} -> {to:?}")]
    IllegalTransition { from: SessionState, to: SessionState },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PirecError>,
    },
}

impl PirecError {
    /// Create an invalid-configuration error for a named field
    pub fn invalid(field: &'static str, msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field,
            message: msg.into(),
        }
    }

    /// Create a device-unavailable error
    pub fn device_unavailable(msg: impl Into<String>) -> Self {
        Self::DeviceUnavailable(msg.into())
    }

    /// Create a config file error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping context wrappers
    pub fn root(&self) -> &PirecError {
        match self {
            Self::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Diagnostic text captured from the failing child process, if any
    pub fn diagnostics(&self) -> Option<&str> {
        match self.root() {
            Self::CaptureProcessFailure { stderr, .. }
            | Self::MuxFailure { stderr, .. }
            | Self::SinkFailure { stderr, .. } => {
                let trimmed = stderr.trim();
                (!trimmed.is_empty()).then_some(trimmed)
            }
            _ => None,
        }
    }

    /// Suggestion for the user on how to fix the problem
    pub fn user_hint(&self) -> Option<&'static str> {
        match self.root() {
            Self::InvalidConfiguration { .. } => {
                Some("Run 'pirec presets' to list modes; sizes are WIDTHxHEIGHT, numbers must be positive.")
            }
            Self::DeviceUnavailable(_) => Some(
                "Check the ribbon cable and 'rpicam-hello --list-cameras'; stop any other process using the camera.",
            ),
            Self::CaptureProcessFailure { .. } => Some(CAPTURE_REMEDIATION_HINT),
            Self::MuxFailure { .. } => {
                Some("The raw stream was kept; re-run ffmpeg on it manually to inspect the failure.")
            }
            Self::SinkFailure { .. } => {
                Some("Check free disk space and that the output directory is writable.")
            }
            Self::Spawn { .. } => Some(
                "Install rpicam-apps and ffmpeg, or point [tools] in config.toml at the binaries.",
            ),
            Self::Config(_) => Some("Check ~/.config/pirec/config.toml, or run 'pirec config init --force'."),
            _ => None,
        }
    }

    /// Whether the user can fix this without code changes
    pub fn is_user_recoverable(&self) -> bool {
        matches!(
            self.root(),
            Self::InvalidConfiguration { .. }
                | Self::DeviceUnavailable(_)
                | Self::CaptureProcessFailure { .. }
                | Self::Spawn { .. }
                | Self::Config(_)
        )
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}
