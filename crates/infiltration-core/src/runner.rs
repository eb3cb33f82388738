//! Session clock ticker.
//!
//! Countdowns only move when something calls
//! [`SessionManager::advance_clock`]. [`run_session_clock`] is that caller
//! for live sessions: it sleeps one tick interval, advances the session by
//! one second, and repeats until the session completes, disappears, or an
//! operator asks it to stop. Because it goes through the manager, every
//! tick serializes against player actions on the same session mutex.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use infiltration_rules::GameError;
use infiltration_types::{Phase, SessionId};

use crate::config::TimingConfig;
use crate::manager::SessionManager;

/// Shortest accepted tick interval.
pub const MIN_TICK_INTERVAL_MS: u64 = 10;

/// Why a clock loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockExit {
    /// The session reached `Complete`.
    Completed,
    /// An operator requested the stop.
    Stopped,
    /// The session was removed from the registry.
    SessionGone,
}

/// Shared pause/resume/stop control for one clock loop.
#[derive(Debug)]
pub struct ClockControl {
    paused: AtomicBool,
    resume_notify: Notify,
    stop_requested: AtomicBool,
    tick_interval_ms: AtomicU64,
}

impl ClockControl {
    /// A running control with the given tick interval.
    pub fn new(tick_interval_ms: u64) -> Self {
        Self {
            paused: AtomicBool::new(false),
            resume_notify: Notify::new(),
            stop_requested: AtomicBool::new(false),
            tick_interval_ms: AtomicU64::new(tick_interval_ms.max(MIN_TICK_INTERVAL_MS)),
        }
    }

    /// A running control ticking at the configured `timing.tick_interval_ms`.
    pub fn from_timing(timing: &TimingConfig) -> Self {
        Self::new(timing.tick_interval_ms)
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Whether the clock is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Freeze the session clock. Countdowns stop until resumed.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume the clock and wake the loop.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Wait until the clock is no longer paused or a stop is requested.
    pub async fn wait_if_paused(&self) {
        while self.is_paused() && !self.is_stop_requested() {
            self.resume_notify.notified().await;
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Ask the loop to exit before its next tick.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    // -----------------------------------------------------------------------
    // Tick speed
    // -----------------------------------------------------------------------

    /// Current tick interval in milliseconds.
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.load(Ordering::Acquire)
    }

    /// Change the tick interval. Returns the previous interval, or `None`
    /// if `ms` is below [`MIN_TICK_INTERVAL_MS`].
    pub fn set_tick_interval_ms(&self, ms: u64) -> Option<u64> {
        if ms < MIN_TICK_INTERVAL_MS {
            return None;
        }
        Some(self.tick_interval_ms.swap(ms, Ordering::AcqRel))
    }
}

/// Drive one session's clock until it completes.
///
/// # Errors
///
/// Returns any [`GameError`] from advancing the clock other than
/// [`GameError::SessionNotFound`], which ends the loop quietly.
pub async fn run_session_clock(
    manager: &SessionManager,
    id: SessionId,
    control: &ClockControl,
) -> Result<ClockExit, GameError> {
    info!(session = %id, tick_interval_ms = control.tick_interval_ms(), "session clock starting");

    loop {
        if control.is_paused() {
            debug!(session = %id, "session clock paused");
            control.wait_if_paused().await;
        }
        if control.is_stop_requested() {
            info!(session = %id, "session clock stopped by operator");
            return Ok(ClockExit::Stopped);
        }

        tokio::time::sleep(Duration::from_millis(control.tick_interval_ms())).await;

        match manager.advance_clock(id, 1).await {
            Ok(Phase::Complete) => {
                info!(session = %id, "session complete, clock exiting");
                return Ok(ClockExit::Completed);
            }
            Ok(_) => {}
            Err(GameError::SessionNotFound(_)) => {
                warn!(session = %id, "session vanished, clock exiting");
                return Ok(ClockExit::SessionGone);
            }
            Err(err) => return Err(err),
        }
    }
}

/// Spawn [`run_session_clock`] on the tokio runtime.
pub fn spawn_session_clock(
    manager: Arc<SessionManager>,
    id: SessionId,
    control: Arc<ClockControl>,
) -> JoinHandle<Result<ClockExit, GameError>> {
    tokio::spawn(async move { run_session_clock(&manager, id, &control).await })
}
