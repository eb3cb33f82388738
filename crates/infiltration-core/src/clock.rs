//! Session clock and phase countdowns.
//!
//! The session clock counts whole seconds since the session was created.
//! It is advanced only by explicit `advance` calls, so tests and the ticker
//! drive exactly the same code path. Each timed phase owns a
//! [`PhaseTimer`] that fires when its remaining time drops to a threshold
//! (zero for most phases, the low-time threshold for the task phase).

use infiltration_rules::GameError;

/// Errors that can occur during clock operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    /// The session clock would overflow.
    #[error("session clock overflow: cannot advance beyond u64::MAX seconds")]
    Overflow,

    /// A timer was configured so that it could never run.
    #[error("invalid timer: {reason}")]
    InvalidTimer {
        /// Explanation of what is wrong with the timer.
        reason: String,
    },
}

impl From<ClockError> for GameError {
    fn from(err: ClockError) -> Self {
        Self::InvalidConfig {
            reason: err.to_string(),
        }
    }
}

/// Countdown for one timed phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTimer {
    duration_secs: u64,
    elapsed_secs: u64,
    fires_at_remaining: u64,
}

impl PhaseTimer {
    /// A countdown of `duration_secs` that fires when `fires_at_remaining`
    /// seconds are left.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidTimer`] if the timer would fire before
    /// it started.
    pub fn new(duration_secs: u64, fires_at_remaining: u64) -> Result<Self, ClockError> {
        if fires_at_remaining >= duration_secs {
            return Err(ClockError::InvalidTimer {
                reason: format!(
                    "a {duration_secs}s countdown cannot fire at {fires_at_remaining}s remaining"
                ),
            });
        }
        Ok(Self {
            duration_secs,
            elapsed_secs: 0,
            fires_at_remaining,
        })
    }

    /// Seconds left on the countdown.
    pub const fn remaining(&self) -> u64 {
        self.duration_secs.saturating_sub(self.elapsed_secs)
    }

    /// Seconds until the timer fires.
    pub const fn until_fire(&self) -> u64 {
        self.remaining().saturating_sub(self.fires_at_remaining)
    }

    /// Whether the timer has fired.
    pub const fn is_expired(&self) -> bool {
        self.remaining() <= self.fires_at_remaining
    }

    const fn tick(&mut self, secs: u64) {
        self.elapsed_secs = self.elapsed_secs.saturating_add(secs);
    }
}

/// Elapsed session time plus the current phase countdown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionClock {
    elapsed_secs: u64,
    timer: Option<PhaseTimer>,
}

impl SessionClock {
    /// A clock at zero with no countdown running.
    pub const fn new() -> Self {
        Self {
            elapsed_secs: 0,
            timer: None,
        }
    }

    /// Advance by `secs`. Returns the new elapsed time.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::Overflow`] if the clock would exceed
    /// `u64::MAX`. The clock is unchanged on error.
    pub fn advance(&mut self, secs: u64) -> Result<u64, ClockError> {
        self.elapsed_secs = self
            .elapsed_secs
            .checked_add(secs)
            .ok_or(ClockError::Overflow)?;
        if let Some(timer) = self.timer.as_mut() {
            timer.tick(secs);
        }
        Ok(self.elapsed_secs)
    }

    /// Seconds since the session was created.
    pub const fn elapsed(&self) -> u64 {
        self.elapsed_secs
    }

    /// Replace the running countdown.
    pub const fn start_timer(&mut self, timer: PhaseTimer) {
        self.timer = Some(timer);
    }

    /// Stop the running countdown.
    pub const fn clear_timer(&mut self) {
        self.timer = None;
    }

    /// The running countdown.
    pub const fn timer(&self) -> Option<&PhaseTimer> {
        self.timer.as_ref()
    }

    /// Whether the running countdown has fired.
    pub fn timer_expired(&self) -> bool {
        self.timer.is_some_and(|t| t.is_expired())
    }
}
