//! Phase scheduling.
//!
//! The scheduler owns the phase, the session clock, and the round counter.
//! It knows which transitions are legal and what countdown each phase runs,
//! but nothing about players or votes: the session decides *when* to call a
//! transition, the scheduler decides *whether* it may happen.
//!
//! ```text
//! Lobby -> Briefing -> Tasks <-> Voting -> Reveal -> Tasks | Complete
//! ```
//!
//! Any phase may jump to `Complete` on abort.

use tracing::debug;

use infiltration_rules::GameError;
use infiltration_types::{Phase, RoundId};

use crate::clock::{PhaseTimer, SessionClock};
use crate::config::TimingConfig;

/// Why a voting round was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VotingTrigger {
    /// The task countdown ran low.
    Timeout,
    /// A player called an emergency meeting.
    Emergency,
}

/// The session state machine.
#[derive(Debug, Clone)]
pub struct PhaseScheduler {
    phase: Phase,
    clock: SessionClock,
    timing: TimingConfig,
    round: Option<RoundId>,
}

impl PhaseScheduler {
    /// A scheduler sitting in the lobby.
    pub const fn new(timing: TimingConfig) -> Self {
        Self {
            phase: Phase::Lobby,
            clock: SessionClock::new(),
            timing,
            round: None,
        }
    }

    /// Current phase.
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// The latest round opened.
    pub const fn round(&self) -> Option<RoundId> {
        self.round
    }

    /// Seconds since the session was created.
    pub const fn elapsed(&self) -> u64 {
        self.clock.elapsed()
    }

    /// Seconds left on the current countdown.
    pub fn remaining(&self) -> Option<u64> {
        self.clock.timer().map(PhaseTimer::remaining)
    }

    /// Fail with [`GameError::PhaseMismatch`] unless the session is in
    /// `expected`.
    pub fn require(&self, expected: Phase, action: &'static str) -> Result<(), GameError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(GameError::wrong_phase(action, self.phase))
        }
    }

    /// Lobby to Briefing.
    pub fn enter_briefing(&mut self) -> Result<(), GameError> {
        self.require(Phase::Lobby, "start_session")?;
        self.transition(Phase::Briefing);
        Ok(())
    }

    /// Briefing or Reveal to a fresh Tasks phase with a full countdown.
    pub fn enter_tasks(&mut self) -> Result<(), GameError> {
        if !matches!(self.phase, Phase::Briefing | Phase::Reveal) {
            return Err(GameError::wrong_phase("begin_tasks", self.phase));
        }
        let timer = PhaseTimer::new(
            self.timing.task_phase_secs,
            self.timing.voting_call_remaining_secs,
        )?;
        self.clock.start_timer(timer);
        self.transition(Phase::Tasks);
        Ok(())
    }

    /// Tasks to Voting. Returns the newly opened round.
    pub fn enter_voting(&mut self, trigger: VotingTrigger) -> Result<RoundId, GameError> {
        self.require(Phase::Tasks, "open_voting")?;
        let next = match self.round {
            None => RoundId::FIRST,
            Some(round) => round.next().ok_or_else(|| GameError::PhaseMismatch {
                action: "open_voting",
                context: String::from("round counter exhausted"),
            })?,
        };
        let secs = match trigger {
            VotingTrigger::Timeout => self.timing.voting_secs,
            VotingTrigger::Emergency => self.timing.emergency_voting_secs,
        };
        self.clock.start_timer(PhaseTimer::new(secs, 0)?);
        self.round = Some(next);
        self.transition(Phase::Voting);
        debug!(round = %next, ?trigger, secs, "voting opened");
        Ok(next)
    }

    /// Voting to Reveal.
    pub fn enter_reveal(&mut self) -> Result<(), GameError> {
        self.require(Phase::Voting, "reveal")?;
        if self.timing.reveal_secs == 0 {
            self.clock.clear_timer();
        } else {
            self.clock.start_timer(PhaseTimer::new(self.timing.reveal_secs, 0)?);
        }
        self.transition(Phase::Reveal);
        Ok(())
    }

    /// Any phase to Complete. Returns `false` if already complete.
    pub fn complete(&mut self) -> bool {
        if self.phase.is_terminal() {
            return false;
        }
        self.clock.clear_timer();
        self.transition(Phase::Complete);
        true
    }

    /// Advance the clock one second. Returns the phase whose countdown
    /// fired, if any.
    ///
    /// A `Reveal` without a countdown fires on the next tick.
    pub fn tick(&mut self) -> Result<Option<Phase>, GameError> {
        self.clock.advance(1)?;
        let fired = match self.phase {
            Phase::Tasks | Phase::Voting => self.clock.timer_expired(),
            Phase::Reveal => self.clock.timer().is_none() || self.clock.timer_expired(),
            Phase::Lobby | Phase::Briefing | Phase::Complete => false,
        };
        Ok(fired.then_some(self.phase))
    }

    fn transition(&mut self, to: Phase) {
        debug!(from = ?self.phase, to = ?to, clock = self.clock.elapsed(), "phase transition");
        self.phase = to;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn scheduler() -> PhaseScheduler {
        PhaseScheduler::new(TimingConfig::default())
    }

    fn tick_until_fired(s: &mut PhaseScheduler) -> (u64, Phase) {
        let mut secs = 0_u64;
        loop {
            secs = secs.saturating_add(1);
            if let Some(phase) = s.tick().unwrap() {
                return (secs, phase);
            }
            assert!(secs < 10_000, "countdown never fired");
        }
    }

    #[test]
    fn standard_loop() {
        let mut s = scheduler();
        assert_eq!(s.phase(), Phase::Lobby);
        s.enter_briefing().unwrap();
        s.enter_tasks().unwrap();
        assert_eq!(s.remaining(), Some(300));

        let (secs, phase) = tick_until_fired(&mut s);
        assert_eq!((secs, phase), (180, Phase::Tasks));
        assert_eq!(s.remaining(), Some(120));

        assert_eq!(s.enter_voting(VotingTrigger::Timeout).unwrap(), RoundId::FIRST);
        assert_eq!(s.remaining(), Some(60));
        assert_eq!(tick_until_fired(&mut s), (60, Phase::Voting));

        s.enter_reveal().unwrap();
        assert_eq!(tick_until_fired(&mut s), (5, Phase::Reveal));
        s.enter_tasks().unwrap();
        assert_eq!(s.remaining(), Some(300));
    }

    #[test]
    fn emergency_voting_runs_longer_and_rounds_increase() {
        let mut s = scheduler();
        s.enter_briefing().unwrap();
        s.enter_tasks().unwrap();
        assert_eq!(s.enter_voting(VotingTrigger::Emergency).unwrap(), RoundId(1));
        assert_eq!(s.remaining(), Some(90));
        s.enter_reveal().unwrap();
        s.enter_tasks().unwrap();
        assert_eq!(s.enter_voting(VotingTrigger::Timeout).unwrap(), RoundId(2));
    }

    #[test]
    fn illegal_transitions_are_phase_mismatches() {
        let mut s = scheduler();
        assert!(matches!(s.enter_tasks(), Err(GameError::PhaseMismatch { .. })));
        assert!(s.enter_voting(VotingTrigger::Timeout).is_err());
        assert!(s.enter_reveal().is_err());
        s.enter_briefing().unwrap();
        assert!(s.enter_briefing().is_err());
        assert_eq!(s.phase(), Phase::Briefing);
    }

    #[test]
    fn untimed_phases_never_fire() {
        let mut s = scheduler();
        for _ in 0..1000 {
            assert_eq!(s.tick().unwrap(), None);
        }
        assert_eq!(s.elapsed(), 1000);
    }

    #[test]
    fn complete_is_terminal_and_idempotent() {
        let mut s = scheduler();
        assert!(s.complete());
        assert!(!s.complete());
        assert_eq!(s.remaining(), None);
        assert!(s.enter_briefing().is_err());
    }
}
