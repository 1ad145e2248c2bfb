//! Recording session lifecycle
//!
//! ```text
//! idle ──▶ running ──▶ stopping ──▶ stopped
//!   │         │           │
//!   └─────────┴───────────┴──────▶ failed
//! ```
//!
//! A session leaves `running` when its duration elapses, when the user
//! interrupts it, or when the capture process exits by itself. Every one of
//! those paths goes through `stopping`, where the pipeline finalizes output.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tokio::time::{interval_at, sleep_until, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::{PirecError, Result};

/// Wake-up period while waiting without a deadline
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);

/// When a session should stop on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCondition {
    /// Record until interrupted (or until the capture process exits)
    Manual,
    /// Record for a fixed wall-clock duration
    Duration(Duration),
}

impl StopCondition {
    /// Stop after `secs` seconds; zero means manual
    pub fn after_secs(secs: u64) -> Self {
        if secs == 0 {
            Self::Manual
        } else {
            Self::Duration(Duration::from_secs(secs))
        }
    }

    /// Duration, if time-limited
    pub fn duration(&self) -> Option<Duration> {
        match self {
            Self::Manual => None,
            Self::Duration(d) => Some(*d),
        }
    }

    /// Time limit for `rpicam-vid -t`, where 0 means unlimited
    pub fn timeout_ms(&self) -> u64 {
        self.duration()
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0)
    }
}

impl std::fmt::Display for StopCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Manual => write!(f, "until interrupted"),
            Self::Duration(d) => write!(f, "{} s", d.as_secs()),
        }
    }
}

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    Running,
    Stopping,
    Stopped,
    Failed,
}

impl SessionState {
    fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Idle, Running)
                | (Running, Stopping)
                | (Stopping, Stopped)
                | (Idle | Running | Stopping, Failed)
        )
    }
}

/// What moved a session out of `running`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Configured duration elapsed
    DurationElapsed,
    /// Ctrl+C or another external interrupt
    Interrupted,
    /// The capture process ended by itself
    ProcessExited,
}

/// User-facing outcome of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    StoppedNormally,
    StoppedBySignal,
    Failed,
}

/// One recording, running or finished
#[derive(Debug)]
pub struct CaptureSession {
    output_path: PathBuf,
    intermediate_path: Option<PathBuf>,
    stop_condition: StopCondition,
    started_at: Option<Instant>,
    state: SessionState,
    stop_reason: Option<StopReason>,
}

impl CaptureSession {
    /// Create an idle session writing to `output_path`
    pub fn new(output_path: impl Into<PathBuf>, stop_condition: StopCondition) -> Self {
        Self {
            output_path: output_path.into(),
            intermediate_path: None,
            stop_condition,
            started_at: None,
            state: SessionState::Idle,
            stop_reason: None,
        }
    }

    /// Attach the raw stream path used by the external-process strategy
    pub fn with_intermediate(mut self, path: impl Into<PathBuf>) -> Self {
        self.intermediate_path = Some(path.into());
        self
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn intermediate_path(&self) -> Option<&Path> {
        self.intermediate_path.as_deref()
    }

    pub fn stop_condition(&self) -> StopCondition {
        self.stop_condition
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// Time since `start`, zero if never started
    pub fn elapsed(&self) -> Duration {
        self.started_at.map(|t| t.elapsed()).unwrap_or_default()
    }

    /// Outcome, or `None` while still idle
    pub fn status(&self) -> Option<SessionStatus> {
        match self.state {
            SessionState::Idle => None,
            SessionState::Running | SessionState::Stopping => Some(SessionStatus::Running),
            SessionState::Stopped => Some(match self.stop_reason {
                Some(StopReason::Interrupted) => SessionStatus::StoppedBySignal,
                _ => SessionStatus::StoppedNormally,
            }),
            SessionState::Failed => Some(SessionStatus::Failed),
        }
    }

    fn transition(&mut self, next: SessionState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(PirecError::IllegalTransition {
                from: self.state,
                to: next,
            });
        }
        debug!("Session {:?} -> {:?}", self.state, next);
        self.state = next;
        Ok(())
    }

    /// idle -> running
    pub fn start(&mut self) -> Result<()> {
        self.transition(SessionState::Running)?;
        self.started_at = Some(Instant::now());
        info!(
            "Recording to {} ({})",
            self.output_path.display(),
            self.stop_condition
        );
        Ok(())
    }

    /// running -> stopping
    pub fn begin_stop(&mut self, reason: StopReason) -> Result<()> {
        self.transition(SessionState::Stopping)?;
        self.stop_reason = Some(reason);
        info!("Stopping after {:.1?} ({:?})", self.elapsed(), reason);
        Ok(())
    }

    /// stopping -> stopped
    pub fn finish(&mut self) -> Result<()> {
        self.transition(SessionState::Stopped)
    }

    /// any live state -> failed; a no-op once already terminal
    pub fn fail(&mut self) {
        if self.state.can_transition_to(SessionState::Failed) {
            debug!("Session {:?} -> Failed", self.state);
            self.state = SessionState::Failed;
        }
    }
}

/// Resolve on Ctrl+C
///
/// If the handler cannot be installed this never resolves, leaving the
/// duration or process exit as the only stop triggers.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Which branch of [`wait_for_stop`] fired
#[derive(Debug)]
pub enum StopTrigger<T> {
    DurationElapsed,
    Interrupted,
    ProcessExited(T),
}

impl<T> StopTrigger<T> {
    pub fn reason(&self) -> StopReason {
        match self {
            Self::DurationElapsed => StopReason::DurationElapsed,
            Self::Interrupted => StopReason::Interrupted,
            Self::ProcessExited(_) => StopReason::ProcessExited,
        }
    }
}

/// Block until the duration elapses, `interrupt` resolves, or `exited`
/// resolves, whichever comes first
///
/// Wakes at most once per [`HEARTBEAT_INTERVAL`] besides those events.
pub async fn wait_for_stop<I, E>(
    condition: StopCondition,
    interrupt: I,
    exited: E,
) -> StopTrigger<E::Output>
where
    I: Future<Output = ()>,
    E: Future,
{
    let started = tokio::time::Instant::now();
    // A deadline past the clock's range is no deadline at all
    let deadline = condition.duration().and_then(|d| started.checked_add(d));

    let timer = async {
        match deadline {
            Some(at) => sleep_until(at).await,
            None => std::future::pending::<()>().await,
        }
    };

    let mut heartbeat = interval_at(started + HEARTBEAT_INTERVAL, HEARTBEAT_INTERVAL);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tokio::pin!(interrupt, exited, timer);

    loop {
        tokio::select! {
            _ = &mut interrupt => return StopTrigger::Interrupted,
            output = &mut exited => return StopTrigger::ProcessExited(output),
            _ = &mut timer => return StopTrigger::DurationElapsed,
            _ = heartbeat.tick() => {
                debug!("Recording... {}s", started.elapsed().as_secs());
            }
        }
    }
}
