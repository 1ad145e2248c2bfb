//! Remux a raw elementary stream into a container with `ffmpeg -c copy`

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tracing::{debug, info};

use crate::error::{PirecError, Result, ResultExt};
use crate::process::{drain, remove_if_exists, ExternalCommand};

/// Stream-copy remux of one raw stream into `output`
#[derive(Debug, Clone)]
pub struct Muxer {
    command: ExternalCommand,
    input: PathBuf,
    output: PathBuf,
}

impl Muxer {
    /// `ffmpeg -y -r <fps> -i <input> -c copy <output>`
    pub fn new(
        binary: &str,
        input: impl Into<PathBuf>,
        frame_rate_hz: u32,
        output: impl Into<PathBuf>,
    ) -> Self {
        let input = input.into();
        let output = output.into();
        let command = ExternalCommand::new(binary)
            .arg("-hide_banner")
            .arg("-y")
            .flag("-r", frame_rate_hz)
            .arg("-i")
            .arg(input.as_os_str())
            .flag("-c", "copy")
            .arg(output.as_os_str());

        Self {
            command,
            input,
            output,
        }
    }

    pub fn command(&self) -> &ExternalCommand {
        &self.command
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Remux, then delete the raw stream
    ///
    /// On failure the raw stream is left in place for inspection.
    pub async fn run(&self) -> Result<()> {
        info!("Muxing {} -> {}", self.input.display(), self.output.display());

        let mut child = self
            .command
            .spawn(Stdio::null(), Stdio::null(), Stdio::piped())?;
        let stderr = drain(child.stderr.take());
        let status = child.wait().await?;
        let stderr = stderr.await.unwrap_or_default();

        if !status.success() {
            return Err(PirecError::MuxFailure {
                status,
                stderr,
                intermediate: self.input.clone(),
            });
        }

        let removed = remove_if_exists(&self.input)
            .map_err(PirecError::from)
            .context(format!("Deleting intermediate {}", self.input.display()))?;
        if removed {
            debug!("Deleted intermediate {}", self.input.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mux_command() {
        let muxer = Muxer::new("ffmpeg", "/tmp/run.h264", 60, "/tmp/run.mp4");
        let cmd = muxer.command();
        assert_eq!(cmd.flag_value("-r").as_deref(), Some("60"));
        assert_eq!(cmd.flag_value("-i").as_deref(), Some("/tmp/run.h264"));
        assert_eq!(cmd.flag_value("-c").as_deref(), Some("copy"));
        assert!(cmd.args_lossy().contains(&"-y".to_string()));
        assert_eq!(cmd.args_lossy().last().map(String::as_str), Some("/tmp/run.mp4"));
    }

    #[test]
    fn test_frame_rate_precedes_input() {
        // -r before -i sets the input rate of the headerless stream
        let args = Muxer::new("ffmpeg", "a.h264", 50, "a.mp4").command().args_lossy();
        let r = args.iter().position(|a| a == "-r").unwrap();
        let i = args.iter().position(|a| a == "-i").unwrap();
        assert!(r < i);
    }
}
