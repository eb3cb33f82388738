//! Error types for the infiltration-rules crate.
//!
//! Every rejected session operation surfaces one of these variants. A
//! rejected operation never mutates anything, so callers can treat any
//! `Err` as a no-op and decide for themselves whether to retry.

use infiltration_types::{Capability, Phase, PlayerId, SessionId, TaskId, Zone};

/// Errors produced by the session rules and surfaced through the manager.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// The roster is too small to start, or the ratio table does not fit it.
    #[error("insufficient players: need {needed}, have {present}")]
    InsufficientPlayers {
        /// Minimum roster size required.
        needed: u32,
        /// Current roster size.
        present: u32,
    },

    /// The lobby is at `max_players`.
    #[error("session full: capacity is {capacity}")]
    SessionFull {
        /// Maximum roster size.
        capacity: u32,
    },

    /// The session has already left the lobby.
    #[error("session already started")]
    AlreadyStarted,

    /// The operation is not accepted in the current phase or round.
    #[error("{action} rejected: {context}")]
    PhaseMismatch {
        /// The rejected operation.
        action: &'static str,
        /// What the session was doing instead.
        context: String,
    },

    /// The task has already been completed.
    #[error("task already completed: {0}")]
    AlreadyCompleted(TaskId),

    /// The vote target is not a living roster member.
    #[error("unknown vote target: {0}")]
    UnknownTarget(PlayerId),

    /// The player lacks the capability, or is no longer alive.
    #[error("player {player} lacks capability {capability:?}")]
    CapabilityDenied {
        /// The acting player.
        player: PlayerId,
        /// The capability the operation requires.
        capability: Capability,
    },

    /// A log entry or action payload is malformed.
    #[error("invalid entry: {reason}")]
    InvalidEntry {
        /// What is wrong with it.
        reason: String,
    },

    /// Self-voting is disabled for this session.
    #[error("player {0} may not vote for themself")]
    SelfVoteNotAllowed(PlayerId),

    /// No session is registered under the id.
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// The player is not on the session roster.
    #[error("unknown player: {0}")]
    UnknownPlayer(PlayerId),

    /// The task is not on the session's board.
    #[error("unknown task: {0}")]
    UnknownTask(TaskId),

    /// The player is already on the roster.
    #[error("player already joined: {0}")]
    AlreadyJoined(PlayerId),

    /// Some players have not signalled ready.
    #[error("{waiting} player(s) not ready")]
    PlayersNotReady {
        /// Number of players still not ready.
        waiting: u32,
    },

    /// The action must be performed in another zone.
    #[error("wrong zone: action requires {expected:?}, player is in {actual:?}")]
    WrongZone {
        /// Zone the action belongs to.
        expected: Zone,
        /// Zone the player is in.
        actual: Zone,
    },

    /// The destination is not adjacent to the player's zone.
    #[error("cannot move from {from:?} to {to:?}")]
    UnreachableZone {
        /// Current zone.
        from: Zone,
        /// Requested destination.
        to: Zone,
    },

    /// The player moved too recently.
    #[error("movement on cooldown for {remaining_secs}s")]
    MovementCooldown {
        /// Seconds until the player may move again.
        remaining_secs: u64,
    },

    /// The session-wide sabotage allowance is used up.
    #[error("sabotage limit of {limit} reached")]
    SabotageLimitReached {
        /// Configured maximum.
        limit: u32,
    },

    /// The session-wide emergency meeting allowance is used up.
    #[error("emergency meeting limit of {limit} reached")]
    EmergencyLimitReached {
        /// Configured maximum.
        limit: u32,
    },

    /// Session configuration failed validation.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What is wrong with it.
        reason: String,
    },
}

impl GameError {
    /// Build a [`GameError::PhaseMismatch`] for an action attempted in the
    /// wrong phase.
    pub fn wrong_phase(action: &'static str, phase: Phase) -> Self {
        Self::PhaseMismatch {
            action,
            context: format!("session is in {phase:?}"),
        }
    }

    /// Build a [`GameError::InvalidEntry`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidEntry {
            reason: reason.into(),
        }
    }
}
