//! Camera handle backed by an `rpicam-vid` process
//!
//! The camera streams encoded video to stdout, which is piped straight into
//! an `ffmpeg -c copy` sink writing the container. Both children are
//! `kill_on_drop`, so dropping the handle can never leave the sensor held.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Child;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{CameraHandle, Controls, EncoderSettings};
use crate::capture::classify_failure;
use crate::config::{CaptureConfig, ToolSettings};
use crate::error::{PirecError, Result};
use crate::process::{drain, reap_after_interrupt, send_interrupt, ExternalCommand, INTERRUPT_GRACE};

/// How long the sink gets to finish the container after capture ends
pub const SINK_FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

struct Recording {
    capture: Child,
    sink: Child,
    capture_stderr: Option<JoinHandle<String>>,
    sink_stderr: Option<JoinHandle<String>>,
    output: PathBuf,
}

/// Pi camera driven through `rpicam-vid`
pub struct RpicamCamera {
    tools: ToolSettings,
    camera_index: u32,
    config: Option<CaptureConfig>,
    controls: Option<Controls>,
    recording: Option<Recording>,
}

/// Frame rate as rpicam-vid expects it, without float noise
fn format_rate(rate: f64) -> String {
    let text = format!("{:.3}", rate);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

impl RpicamCamera {
    /// Open camera `camera_index` using the configured binaries
    pub fn open(tools: ToolSettings, camera_index: u32) -> Self {
        debug!("Opening camera {} via {}", camera_index, tools.rpicam_vid);
        Self {
            tools,
            camera_index,
            config: None,
            controls: None,
            recording: None,
        }
    }

    /// Capture command for the current configuration, streaming to stdout
    pub fn capture_command(&self, encoder: &EncoderSettings) -> Result<ExternalCommand> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| PirecError::config("camera not configured"))?;
        let controls = self
            .controls
            .unwrap_or_else(|| Controls::constant_frame_rate(config));

        let mut cmd = ExternalCommand::new(&self.tools.rpicam_vid)
            .flag("-t", 0)
            .arg("--nopreview")
            .arg("--inline")
            .flag("--camera", self.camera_index)
            .flag("--buffer-count", config.buffer_count)
            .flag("--codec", encoder.codec.rpicam_name())
            .flag("--bitrate", encoder.bitrate_bps)
            .flag("--width", config.resolution.width)
            .flag("--height", config.resolution.height)
            .flag("--framerate", format_rate(controls.max_frame_rate()))
            .flag("--denoise", config.denoise.rpicam_name());

        // A fixed shutter plus fixed gain is how rpicam-apps disables AE/AGC
        if !controls.ae_enable {
            cmd = cmd
                .flag("--shutter", controls.exposure_time_us)
                .flag("--gain", controls.analogue_gain);
        }

        Ok(cmd.flag("-o", "-"))
    }

    /// Stream-copy sink reading the encoded stream from stdin
    pub fn sink_command(&self, encoder: &EncoderSettings, output: &Path) -> Result<ExternalCommand> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| PirecError::config("camera not configured"))?;

        Ok(ExternalCommand::new(&self.tools.ffmpeg)
            .arg("-hide_banner")
            .arg("-y")
            .flag("-f", encoder.codec.ffmpeg_format())
            .flag("-r", config.frame_rate_hz)
            .flag("-i", "-")
            .flag("-c", "copy")
            .arg(output.as_os_str()))
    }

    async fn shutdown_children(recording: &mut Recording) {
        for child in [&mut recording.capture, &mut recording.sink] {
            if let Err(e) = child.kill().await {
                debug!("Kill during close: {}", e);
            }
        }
    }
}

impl CameraHandle for RpicamCamera {
    fn configure(&mut self, config: &CaptureConfig) -> Result<()> {
        if self.recording.is_some() {
            return Err(PirecError::config("cannot reconfigure while recording"));
        }
        config.validate_strict()?;
        debug!(
            "Configured {}@{} {} buffers",
            config.resolution, config.frame_rate_hz, config.buffer_count
        );
        self.config = Some(config.clone());
        Ok(())
    }

    fn set_controls(&mut self, controls: &Controls) -> Result<()> {
        if controls.frame_duration_limits.0 == 0 {
            return Err(PirecError::invalid(
                "frame_duration_limits",
                "frame duration must be positive",
            ));
        }
        if !controls.is_constant_frame_rate() {
            warn!(
                "Frame duration window {:?} is not fixed; recording at the upper rate",
                controls.frame_duration_limits
            );
        }
        debug!("Controls: {:?}", controls);
        self.controls = Some(*controls);
        Ok(())
    }

    async fn start_recording(&mut self, encoder: &EncoderSettings, output: &Path) -> Result<()> {
        if self.recording.is_some() {
            return Err(PirecError::config("recording already started"));
        }

        let capture_cmd = self.capture_command(encoder)?;
        let sink_cmd = self.sink_command(encoder, output)?;

        info!("Camera: {}", capture_cmd);
        let mut capture = capture_cmd.spawn(Stdio::null(), Stdio::piped(), Stdio::piped())?;
        let capture_stderr = drain(capture.stderr.take());

        let stream: Stdio = match capture.stdout.take() {
            Some(stdout) => stdout.try_into()?,
            None => {
                let _ = capture.kill().await;
                return Err(PirecError::Io(std::io::Error::other("capture stdout not piped")));
            }
        };

        info!("Sink: {}", sink_cmd);
        let mut sink = match sink_cmd.spawn(stream, Stdio::null(), Stdio::piped()) {
            Ok(sink) => sink,
            Err(e) => {
                let _ = capture.kill().await;
                return Err(e);
            }
        };
        let sink_stderr = drain(sink.stderr.take());

        self.recording = Some(Recording {
            capture,
            sink,
            capture_stderr: Some(capture_stderr),
            sink_stderr: Some(sink_stderr),
            output: output.to_path_buf(),
        });
        Ok(())
    }

    async fn wait_exit(&mut self) -> Result<()> {
        let recording = self.recording.as_mut().ok_or(PirecError::NoActiveRecording)?;
        let status = recording.capture.wait().await?;

        if status.success() {
            return Ok(());
        }

        let stderr = match recording.capture_stderr.take() {
            Some(handle) => handle.await.unwrap_or_default(),
            None => String::new(),
        };
        Err(classify_failure(status, stderr))
    }

    async fn stop_recording(&mut self) -> Result<()> {
        let mut recording = self.recording.take().ok_or(PirecError::NoActiveRecording)?;

        // Let rpicam-vid flush its encoder; the sink then sees EOF
        send_interrupt(&mut recording.capture);
        let capture_status = reap_after_interrupt(&mut recording.capture, INTERRUPT_GRACE).await?;
        debug!("Capture exited with {}", capture_status);

        let sink_status = match tokio::time::timeout(SINK_FLUSH_TIMEOUT, recording.sink.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                warn!("Sink did not finish within {:?}, killing it", SINK_FLUSH_TIMEOUT);
                recording.sink.kill().await?;
                recording.sink.wait().await?
            }
        };

        if !sink_status.success() {
            let stderr = match recording.sink_stderr.take() {
                Some(handle) => handle.await.unwrap_or_default(),
                None => String::new(),
            };
            return Err(PirecError::SinkFailure {
                status: sink_status,
                stderr,
            });
        }

        info!("Recording closed: {}", recording.output.display());
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(mut recording) = self.recording.take() {
            warn!("Closing camera with a live recording; terminating capture");
            Self::shutdown_children(&mut recording).await;
        }
        self.controls = None;
        self.config = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> RpicamCamera {
        let mut camera = RpicamCamera::open(ToolSettings::default(), 0);
        let config = CaptureConfig::direct_default();
        camera.configure(&config).unwrap();
        camera
            .set_controls(&Controls::constant_frame_rate(&config))
            .unwrap();
        camera
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(60.0), "60");
        assert_eq!(format_rate(59.999_998_8), "60");
        assert_eq!(format_rate(29.97), "29.97");
    }

    #[test]
    fn test_capture_command_locks_exposure() {
        let camera = configured();
        let encoder = EncoderSettings::from_config(&CaptureConfig::direct_default());
        let cmd = camera.capture_command(&encoder).unwrap();

        assert_eq!(cmd.flag_value("--framerate").as_deref(), Some("60"));
        assert_eq!(cmd.flag_value("--shutter").as_deref(), Some("1000"));
        assert_eq!(cmd.flag_value("--gain").as_deref(), Some("4"));
        assert_eq!(cmd.flag_value("--bitrate").as_deref(), Some("10000000"));
        assert_eq!(cmd.flag_value("-o").as_deref(), Some("-"));
    }

    #[test]
    fn test_auto_exposure_drops_fixed_shutter() {
        let mut camera = configured();
        let mut controls = Controls::constant_frame_rate(&CaptureConfig::direct_default());
        controls.ae_enable = true;
        camera.set_controls(&controls).unwrap();

        let encoder = EncoderSettings::from_config(&CaptureConfig::direct_default());
        let cmd = camera.capture_command(&encoder).unwrap();
        assert_eq!(cmd.flag_value("--shutter"), None);
        assert_eq!(cmd.flag_value("--gain"), None);
    }

    #[test]
    fn test_sink_command_reads_stdin() {
        let camera = configured();
        let encoder = EncoderSettings::from_config(&CaptureConfig::direct_default());
        let cmd = camera.sink_command(&encoder, Path::new("out.mp4")).unwrap();
        assert_eq!(cmd.flag_value("-f").as_deref(), Some("h264"));
        assert_eq!(cmd.flag_value("-i").as_deref(), Some("-"));
        assert_eq!(cmd.flag_value("-c").as_deref(), Some("copy"));
    }

    #[test]
    fn test_unconfigured_camera() {
        let camera = RpicamCamera::open(ToolSettings::default(), 0);
        let encoder = EncoderSettings::from_config(&CaptureConfig::direct_default());
        assert!(camera.capture_command(&encoder).is_err());
    }

    #[tokio::test]
    async fn test_stop_without_start() {
        let mut camera = configured();
        assert!(matches!(
            camera.stop_recording().await,
            Err(PirecError::NoActiveRecording)
        ));
        camera.close().await;
        camera.close().await;
    }
}
