//! Integration tests for error handling

use pirec_core::error::{PirecError, ResultExt, CAPTURE_REMEDIATION_HINT};

#[cfg(unix)]
fn exit_status(code: i32) -> std::process::ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    std::process::ExitStatus::from_raw(code << 8)
}

#[test]
fn test_error_context_chaining() {
    let base_error = PirecError::device_unavailable("Device or resource busy");
    let with_context = base_error.with_context("Starting camera");

    let msg = format!("{}", with_context);
    assert!(msg.contains("Starting camera"));
    assert!(msg.contains("Device or resource busy"));
}

#[test]
fn test_error_context_preserves_hint() {
    let base_error = PirecError::invalid("fps", "must be a positive integer, got 0");
    let hint_before = base_error.user_hint();

    let with_context = base_error.with_context("Resolving capture");
    assert_eq!(hint_before, with_context.user_hint());
}

#[test]
fn test_result_ext_context() {
    let result: Result<(), PirecError> = Err(PirecError::config("bad toml"));
    let err = result.context("Loading config").unwrap_err();
    assert!(format!("{}", err).contains("Loading config"));
}

#[test]
fn test_invalid_configuration_names_field() {
    let err = PirecError::invalid("size", "'bad' is not WIDTHxHEIGHT with positive integers");
    assert_eq!(
        err.to_string(),
        "Invalid configuration for 'size': 'bad' is not WIDTHxHEIGHT with positive integers"
    );
    assert!(err.is_user_recoverable());
    assert!(err.user_hint().unwrap().contains("pirec presets"));
}

#[cfg(unix)]
#[test]
fn test_capture_failure_carries_stderr_and_hint() {
    let err = PirecError::CaptureProcessFailure {
        status: exit_status(1),
        stderr: "ERR\n".to_string(),
    };

    assert_eq!(err.diagnostics(), Some("ERR"));
    assert_eq!(err.user_hint(), Some(CAPTURE_REMEDIATION_HINT));
    assert!(CAPTURE_REMEDIATION_HINT.contains("--denoise off"));
    assert!(CAPTURE_REMEDIATION_HINT.contains("--buffers 2"));
    assert!(err.is_user_recoverable());
}

#[cfg(unix)]
#[test]
fn test_mux_failure_mentions_kept_stream() {
    let err = PirecError::MuxFailure {
        status: exit_status(1),
        stderr: "Invalid data found when processing input".to_string(),
        intermediate: "/media/run.h264".into(),
    };

    assert!(err.to_string().contains("/media/run.h264"));
    assert!(err.diagnostics().unwrap().contains("Invalid data"));
    assert!(!err.is_user_recoverable());
}

#[test]
fn test_diagnostics_absent_for_empty_stderr() {
    assert_eq!(PirecError::device_unavailable("busy").diagnostics(), None);
}

#[test]
fn test_io_error_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only filesystem");
    let err: PirecError = io_err.into();

    let msg = format!("{}", err);
    assert!(msg.contains("I/O error"));
    assert!(msg.contains("read-only filesystem"));
}

#[test]
fn test_spawn_error_hint() {
    let err = PirecError::Spawn {
        program: "rpicam-vid".to_string(),
        source: std::io::Error::from(std::io::ErrorKind::NotFound),
    };
    assert!(err.to_string().contains("rpicam-vid"));
    assert!(err.user_hint().unwrap().contains("[tools]"));
}
