//! Mock infrastructure for testing
//!
//! Provides a scripted camera handle and fake `rpicam-vid` / `ffmpeg`
//! binaries written as shell scripts into a temp directory.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pirec_core::camera::{CameraHandle, Controls, EncoderSettings};
use pirec_core::config::{CaptureConfig, ToolSettings};
use pirec_core::error::{PirecError, Result};

/// Camera handle that records every call
#[derive(Clone, Default)]
pub struct MockCamera {
    events: Arc<Mutex<Vec<&'static str>>>,
    controls: Arc<Mutex<Option<Controls>>>,
    fail_after: Option<Duration>,
}

impl MockCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the recording die with a busy-device error after `after`
    pub fn failing_after(after: Duration) -> Self {
        Self {
            fail_after: Some(after),
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().clone()
    }

    pub fn controls(&self) -> Option<Controls> {
        *self.controls.lock().unwrap()
    }

    fn push(&self, event: &'static str) {
        self.events.lock().unwrap().push(event);
    }
}

impl CameraHandle for MockCamera {
    fn configure(&mut self, _config: &CaptureConfig) -> Result<()> {
        self.push("configure");
        Ok(())
    }

    fn set_controls(&mut self, controls: &Controls) -> Result<()> {
        self.push("set_controls");
        *self.controls.lock().unwrap() = Some(*controls);
        Ok(())
    }

    async fn start_recording(&mut self, _encoder: &EncoderSettings, _output: &Path) -> Result<()> {
        self.push("start_recording");
        Ok(())
    }

    async fn wait_exit(&mut self) -> Result<()> {
        match self.fail_after {
            Some(after) => {
                tokio::time::sleep(after).await;
                Err(PirecError::device_unavailable("Device or resource busy"))
            }
            None => std::future::pending().await,
        }
    }

    async fn stop_recording(&mut self) -> Result<()> {
        self.push("stop_recording");
        Ok(())
    }

    async fn close(&mut self) {
        self.push("close");
    }
}

/// Write an executable `#!/bin/sh` script
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("write script");
    let mut perms = std::fs::metadata(&path).expect("stat script").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("chmod script");
    path
}

/// Writes its args to `rpicam.args`, then sleeps for `-t` ms after
/// writing a few bytes to the `-o` path. `-t 0` waits for SIGINT.
pub const FAKE_RPICAM_OK: &str = r#"
echo "$@" > "$(dirname "$0")/rpicam.args"
t=0; out=""
while [ $# -gt 0 ]; do
  case "$1" in
    -t) t="$2"; shift ;;
    -o) out="$2"; shift ;;
  esac
  shift
done
printf 'raw-elementary-stream' > "$out"
if [ "$t" -eq 0 ]; then
  trap 'exit 0' INT
  while :; do sleep 0.05; done
fi
sleep "$(( (t + 999) / 1000 ))"
"#;

/// Capture binary that fails immediately
pub const FAKE_RPICAM_ERR: &str = r#"
echo "$@" > "$(dirname "$0")/rpicam.args"
echo ERR >&2
exit 1
"#;

/// Capture binary that reports a held camera
pub const FAKE_RPICAM_BUSY: &str = r#"
echo "ERROR: *** failed to acquire camera /base/soc/i2c0mux/i2c@1/imx708@1a ***" >&2
exit 255
"#;

/// Streams bytes on stdout until SIGINT (direct strategy)
pub const FAKE_RPICAM_STREAM: &str = r#"
echo "$@" > "$(dirname "$0")/rpicam.args"
trap 'exit 0' INT
while :; do printf 'frame'; sleep 0.05; done
"#;

/// Streams a few frames, then dies the way a camera claimed mid-run does
pub const FAKE_RPICAM_STREAM_THEN_BUSY: &str = r#"
echo "$@" > "$(dirname "$0")/rpicam.args"
for i in 1 2 3 4; do printf 'frame'; done
sleep 0.3
echo "ERROR: *** failed to acquire camera /base/soc/i2c0mux/i2c@1/imx708@1a ***" >&2
exit 255
"#;

/// Copies `-i` (or stdin for `-i -`) into the last argument
pub const FAKE_FFMPEG_OK: &str = r#"
echo "$@" > "$(dirname "$0")/ffmpeg.args"
in=""; prev=""
for a; do
  [ "$prev" = "-i" ] && in="$a"
  prev="$a"
done
out="$prev"
if [ "$in" = "-" ]; then cat > "$out"; else cat "$in" > "$out"; fi
"#;

/// Like [`FAKE_FFMPEG_OK`], but exits 255 on SIGINT as ffmpeg does
pub const FAKE_FFMPEG_EXITS_ON_INT: &str = r#"
echo "$@" > "$(dirname "$0")/ffmpeg.args"
trap 'exit 255' INT
in=""; prev=""
for a; do
  [ "$prev" = "-i" ] && in="$a"
  prev="$a"
done
out="$prev"
if [ "$in" = "-" ]; then cat > "$out"; else cat "$in" > "$out"; fi
"#;

/// Remux binary that fails after touching its output
pub const FAKE_FFMPEG_ERR: &str = r#"
echo "$@" > "$(dirname "$0")/ffmpeg.args"
for last; do :; done
printf 'partial' > "$last"
echo "mux broke" >&2
exit 1
"#;

/// Install fake tools in `dir` and point a [`ToolSettings`] at them
#[cfg(unix)]
pub fn fake_tools(dir: &Path, rpicam: &str, ffmpeg: &str) -> ToolSettings {
    let rpicam_vid = write_script(dir, "rpicam-vid", rpicam);
    let ffmpeg = write_script(dir, "ffmpeg", ffmpeg);
    ToolSettings {
        rpicam_vid: rpicam_vid.to_string_lossy().into_owned(),
        ffmpeg: ffmpeg.to_string_lossy().into_owned(),
    }
}

/// Args a fake tool was invoked with, if it ran at all
pub fn recorded_args(dir: &Path, tool: &str) -> Option<String> {
    std::fs::read_to_string(dir.join(format!("{}.args", tool))).ok()
}
