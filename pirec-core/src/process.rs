//! External process plumbing
//!
//! Commands are built as argument vectors and executed directly, never via a
//! shell. Interrupts are forwarded to the child as SIGINT so the capture
//! binary can close its output cleanly.

use std::ffi::OsString;
use std::future::Future;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{PirecError, Result};
use crate::session::{wait_for_stop, StopCondition, StopTrigger};

/// How long a child gets to exit after SIGINT before it is killed
pub const INTERRUPT_GRACE: Duration = Duration::from_secs(5);

/// A program plus its argument list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    program: OsString,
    args: Vec<OsString>,
}

impl ExternalCommand {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append a flag followed by its value
    pub fn flag(self, name: &str, value: impl ToString) -> Self {
        self.arg(name).arg(value.to_string())
    }

    pub fn program(&self) -> &OsString {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Arguments as lossy strings, for assertions and logs
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// Value following `name`, if the flag is present
    pub fn flag_value(&self, name: &str) -> Option<String> {
        let pos = self.args.iter().position(|a| a == name)?;
        self.args
            .get(pos + 1)
            .map(|a| a.to_string_lossy().into_owned())
    }

    /// Program name for error messages
    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// Build a tokio command; the child is killed if its handle is dropped
    ///
    /// On unix the child leads its own process group, so a terminal Ctrl+C
    /// reaches only pirec. Children see SIGINT solely through
    /// [`send_interrupt`], in the order the pipelines choose.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);
        cmd
    }

    /// Spawn with the given stdio, mapping launch failures to [`PirecError::Spawn`]
    pub fn spawn(&self, stdin: Stdio, stdout: Stdio, stderr: Stdio) -> Result<Child> {
        debug!("Spawning: {}", self);
        self.to_command()
            .stdin(stdin)
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
            .map_err(|source| PirecError::Spawn {
                program: self.program_name(),
                source,
            })
    }
}

impl std::fmt::Display for ExternalCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg.replace('\'', r"'\''"))?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Result of running a child to completion
#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stderr: String,
    /// The run ended because the caller's interrupt fired
    pub interrupted: bool,
}

/// Collect everything a child writes to a pipe
pub fn drain<R>(reader: Option<R>) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut reader) = reader {
            if let Err(e) = reader.read_to_end(&mut buf).await {
                debug!("Pipe read ended with error: {}", e);
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Ask a child to stop the way a terminal Ctrl+C would
pub fn send_interrupt(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            if let Ok(pid) = libc::pid_t::try_from(pid) {
                // SAFETY: kill(2) has no memory-safety preconditions; the pid
                // belongs to a child we have not yet reaped.
                let rc = unsafe { libc::kill(pid, libc::SIGINT) };
                if rc != 0 {
                    debug!("SIGINT to {} failed: {}", pid, std::io::Error::last_os_error());
                }
                return;
            }
        }
    }

    if let Err(e) = child.start_kill() {
        debug!("Failed to signal child: {}", e);
    }
}

/// Wait for an interrupted child, killing it if it outlives the grace period
pub async fn reap_after_interrupt(child: &mut Child, grace: Duration) -> Result<ExitStatus> {
    match tokio::time::timeout(grace, child.wait()).await {
        Ok(status) => Ok(status?),
        Err(_) => {
            warn!("Child did not exit within {:?} of SIGINT, killing it", grace);
            child.kill().await?;
            Ok(child.wait().await?)
        }
    }
}

/// Run `command` until it exits or `interrupt` fires
///
/// Stderr is captured in full. On interrupt the child is sent SIGINT and
/// reaped; the returned output is flagged as interrupted.
pub async fn run_to_completion<I>(command: &ExternalCommand, interrupt: I) -> Result<ProcessOutput>
where
    I: Future<Output = ()>,
{
    let mut child = command.spawn(Stdio::null(), Stdio::null(), Stdio::piped())?;
    let stderr = drain(child.stderr.take());

    let trigger = wait_for_stop(StopCondition::Manual, interrupt, child.wait()).await;

    let (status, interrupted) = match trigger {
        StopTrigger::ProcessExited(status) => (status?, false),
        StopTrigger::Interrupted | StopTrigger::DurationElapsed => {
            debug!("Forwarding interrupt to {}", command.program_name());
            send_interrupt(&mut child);
            (reap_after_interrupt(&mut child, INTERRUPT_GRACE).await?, true)
        }
    };

    let stderr = stderr.await.unwrap_or_default();
    debug!("{} exited with {}", command.program_name(), status);

    Ok(ProcessOutput {
        status,
        stderr,
        interrupted,
    })
}

/// Delete a file, treating "already absent" as success
///
/// Returns whether a file was actually removed.
pub fn remove_if_exists(path: &Path) -> std::io::Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// [`remove_if_exists`] for cleanup paths where failure is only logged
pub fn remove_best_effort(path: &Path) {
    if let Err(e) = remove_if_exists(path) {
        warn!("Could not remove {}: {}", path.display(), e);
    }
}
