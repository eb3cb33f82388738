//! Player-facing session projection.
//!
//! A [`SessionView`] is what one player is allowed to know about a session
//! at one moment. Every field that could leak hidden information is an
//! `Option` that the core fills in only when the requesting player is
//! privileged to see it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ActionKind, Capability, Phase, Role, SabotageKind, Zone};
use crate::ids::{PlayerId, RoundId, SessionId, TaskId};
use crate::structs::{Actor, RevealRecord, SessionResult, SuspicionFlag, TaskProgress};

/// The requesting player's own state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SelfView {
    /// The requesting player.
    pub id: PlayerId,
    /// Their alias.
    pub alias: String,
    /// Their own role, visible from the briefing onward.
    pub role: Option<Role>,
    /// Capabilities currently usable (empty once eliminated).
    pub capabilities: Vec<Capability>,
    /// Whether they are alive.
    pub alive: bool,
    /// Their current zone.
    pub zone: Zone,
    /// Whether they are the host.
    pub is_host: bool,
}

/// Another roster member as seen by the requesting player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlayerView {
    /// The player.
    pub id: PlayerId,
    /// Display alias.
    pub alias: String,
    /// Whether the player is alive.
    pub alive: bool,
    /// Lobby ready flag.
    pub ready: bool,
    /// Whether the player is connected.
    pub connected: bool,
    /// Informational mask level.
    pub level: u32,
    /// Informational reputation.
    pub reputation: u32,
    /// Role, when the requester is allowed to see it.
    pub role: Option<Role>,
    /// Zone, when the requester is allowed to see it.
    pub zone: Option<Zone>,
    /// Whether this player hosts the session.
    pub is_host: bool,
}

/// Filtered, kind-specific content of a log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case", tag = "type")]
#[ts(export, export_to = "bindings/")]
pub enum VisibleDetail {
    /// A task completion. The task places its zone, so it is withheld
    /// along with the zone from players who cannot track others.
    TaskComplete {
        /// The task.
        task_id: Option<TaskId>,
        /// Forgery flag, only for log analysts.
        forged: Option<bool>,
    },
    /// A movement. Zones are withheld from players who cannot track others.
    Movement {
        /// Origin zone.
        from: Option<Zone>,
        /// Destination zone.
        to: Option<Zone>,
    },
    /// A sabotage.
    Sabotage {
        /// What was sabotaged.
        kind: SabotageKind,
        /// Culprit, only for saboteurs.
        caused_by: Option<PlayerId>,
    },
    /// A vote.
    Vote {
        /// The round.
        round: RoundId,
        /// Who was voted against.
        target: PlayerId,
    },
    /// A discussion message.
    Discussion {
        /// Author, only for the author themself.
        author: Option<PlayerId>,
        /// Message body.
        message: String,
    },
    /// An emergency meeting call.
    EmergencyMeeting {
        /// The round it opened.
        round: RoundId,
    },
    /// A round resolution.
    Elimination {
        /// The resolved round.
        round: RoundId,
        /// Who was removed.
        eliminated: Option<PlayerId>,
        /// Their unmasked role.
        role: Option<Role>,
    },
    /// Engine notice.
    Notice {
        /// Notice text.
        message: String,
    },
}

/// A log entry as seen by one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct VisibleEntry {
    /// Append position.
    pub seq: u64,
    /// Public attribution.
    pub actor: Actor,
    /// Entry kind.
    pub kind: ActionKind,
    /// Zone, when visible.
    pub zone: Option<Zone>,
    /// Server arrival time.
    pub recorded_at: DateTime<Utc>,
    /// Session clock second.
    pub clock_secs: u64,
    /// Filtered content.
    pub detail: VisibleDetail,
}

/// A task on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TaskView {
    /// Task identifier.
    pub id: TaskId,
    /// Zone it lives in.
    pub zone: Zone,
    /// Name.
    pub name: String,
    /// Nominal duration in seconds.
    pub duration_secs: u32,
    /// Whether it has been genuinely completed.
    pub completed: bool,
}

/// The open voting round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct VotingView {
    /// The open round.
    pub round: RoundId,
    /// Number of ballots cast so far.
    pub votes_cast: u32,
    /// Number of living players who may vote.
    pub eligible_voters: u32,
    /// The requester's own current ballot.
    pub your_vote: Option<PlayerId>,
}

/// Everything one player may see about a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SessionView {
    /// The session.
    pub session_id: SessionId,
    /// Current phase.
    pub phase: Phase,
    /// Seconds left on the phase countdown, for timed phases.
    pub remaining_secs: Option<u64>,
    /// Session clock.
    pub clock_secs: u64,
    /// The requester.
    pub you: SelfView,
    /// Roster in join order, including the requester.
    pub players: Vec<PlayerView>,
    /// Filtered action log.
    pub log: Vec<VisibleEntry>,
    /// Task board.
    pub tasks: Vec<TaskView>,
    /// Overall progress.
    pub progress: TaskProgress,
    /// Progress per zone.
    pub zone_progress: BTreeMap<Zone, TaskProgress>,
    /// Tasks required for a loyal win.
    pub tasks_to_win: u32,
    /// The open voting round, during `Voting`.
    pub voting: Option<VotingView>,
    /// The latest reveal.
    pub last_reveal: Option<RevealRecord>,
    /// Behavioural flags derived from the log.
    pub suspicion: Vec<SuspicionFlag>,
    /// Emergency meetings that can still be called.
    pub emergency_meetings_left: u32,
    /// Sabotages that can still be performed.
    pub sabotages_left: u32,
    /// Final summary, once `Complete`.
    pub result: Option<SessionResult>,
}
