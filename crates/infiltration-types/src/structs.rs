//! Core entity structs for the Infiltration session engine.
//!
//! These are the authoritative, server-side records. They contain ground
//! truth (roles, sabotage culprits, forged flags) and must never be handed
//! to a player directly; the filtered projections live in
//! [`crate::view`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{AbortReason, ActionKind, Role, SabotageKind, Severity, Side, WinReason, Zone};
use crate::ids::{EntryId, PlayerId, RoundId, SessionId, TaskId};

// ---------------------------------------------------------------------------
// Players and tasks
// ---------------------------------------------------------------------------

/// A participant in a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Player {
    /// Stable identity supplied by the identity source.
    pub id: PlayerId,
    /// Display alias.
    pub alias: String,
    /// Hidden role. `None` until the session starts.
    pub role: Option<Role>,
    /// Whether the player is still in the living roster.
    pub alive: bool,
    /// Lobby ready flag.
    pub ready: bool,
    /// Whether the player is still connected to the session.
    pub connected: bool,
    /// Informational mask level.
    pub level: u32,
    /// Informational reputation score.
    pub reputation: u32,
    /// Zone the player currently occupies.
    pub zone: Zone,
    /// Session clock second of the player's last movement.
    pub last_moved_at: Option<u64>,
}

impl Player {
    /// Create a freshly joined player standing in the starting zone.
    pub fn new(id: PlayerId, alias: impl Into<String>) -> Self {
        Self {
            id,
            alias: alias.into(),
            role: None,
            alive: true,
            ready: false,
            connected: true,
            level: 1,
            reputation: 0,
            zone: Zone::CommandTerminal,
            last_moved_at: None,
        }
    }
}

/// A mission task placed in a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Task {
    /// Unique task identifier.
    pub id: TaskId,
    /// Zone where the task must be performed.
    pub zone: Zone,
    /// Human-readable task name.
    pub name: String,
    /// Nominal time the task minigame takes, in seconds.
    pub duration_secs: u32,
}

/// Aggregate task progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TaskProgress {
    /// Number of genuinely completed tasks.
    pub completed: u32,
    /// Number of tasks on the board.
    pub total: u32,
}

// ---------------------------------------------------------------------------
// Action log
// ---------------------------------------------------------------------------

/// Public attribution of an action log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case", tag = "type", content = "id")]
#[ts(export, export_to = "bindings/")]
pub enum Actor {
    /// Attributed to a player.
    Player(PlayerId),
    /// Deliberately unattributed (sabotage, discussion).
    Anonymous,
    /// Emitted by the engine itself.
    System,
}

impl Actor {
    /// The attributed player, if any.
    pub const fn player(self) -> Option<PlayerId> {
        match self {
            Self::Player(id) => Some(id),
            Self::Anonymous | Self::System => None,
        }
    }
}

/// Kind-specific content of an action log entry.
///
/// Fields named `caused_by`, `author`, and `forged` are ground truth that
/// the view layer withholds from unprivileged players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case", tag = "type")]
#[ts(export, export_to = "bindings/")]
pub enum EntryPayload {
    /// A task completion.
    TaskComplete {
        /// The task that was submitted.
        task_id: TaskId,
        /// Whether the submission was faked by a saboteur.
        forged: bool,
    },
    /// A move between two zones.
    Movement {
        /// Zone the player left.
        from: Zone,
        /// Zone the player entered.
        to: Zone,
    },
    /// A sabotage event.
    Sabotage {
        /// What was sabotaged.
        kind: SabotageKind,
        /// Who did it.
        caused_by: PlayerId,
    },
    /// A vote cast in a voting round.
    Vote {
        /// The round the vote belongs to.
        round: RoundId,
        /// The player voted against.
        target: PlayerId,
    },
    /// A discussion message.
    Discussion {
        /// Who wrote the message.
        author: PlayerId,
        /// Message body.
        message: String,
    },
    /// An emergency meeting call that opened a voting round.
    EmergencyMeeting {
        /// The round the meeting opened.
        round: RoundId,
    },
    /// The outcome of a resolved voting round.
    Elimination {
        /// The round that was resolved.
        round: RoundId,
        /// Who was removed, if anyone.
        eliminated: Option<PlayerId>,
        /// The unmasked role of the eliminated player.
        role: Option<Role>,
    },
    /// Free-form engine notice.
    Notice {
        /// Notice text.
        message: String,
    },
}

impl EntryPayload {
    /// The log kind implied by this payload.
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::TaskComplete { .. } => ActionKind::TaskComplete,
            Self::Movement { .. } => ActionKind::Movement,
            Self::Sabotage { .. } => ActionKind::Sabotage,
            Self::Vote { .. } => ActionKind::Vote,
            Self::Discussion { .. } => ActionKind::Discussion,
            Self::EmergencyMeeting { .. } | Self::Elimination { .. } | Self::Notice { .. } => {
                ActionKind::System
            }
        }
    }
}

/// An immutable, appended action log record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ActionLogEntry {
    /// Unique entry identifier.
    pub id: EntryId,
    /// Position in append order, starting at 1.
    pub seq: u64,
    /// Public attribution.
    pub actor: Actor,
    /// Entry kind, always equal to `payload.kind()`.
    pub kind: ActionKind,
    /// Zone the action happened in, if it has one.
    pub zone: Option<Zone>,
    /// Server arrival time. Monotonic within a log.
    pub recorded_at: DateTime<Utc>,
    /// Session clock second at arrival.
    pub clock_secs: u64,
    /// Kind-specific content.
    pub payload: EntryPayload,
}

// ---------------------------------------------------------------------------
// Voting
// ---------------------------------------------------------------------------

/// A single ballot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Vote {
    /// Who voted.
    pub voter: PlayerId,
    /// Who they voted against.
    pub target: PlayerId,
    /// The round the ballot belongs to.
    pub round: RoundId,
}

/// Outcome of resolving one voting round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EliminationResult {
    /// The resolved round.
    pub round: RoundId,
    /// The eliminated player, if the round produced one.
    pub eliminated: Option<PlayerId>,
    /// Votes received per target. Targets without votes are absent.
    pub vote_counts: BTreeMap<PlayerId, u32>,
    /// Targets sharing the maximum when the round tied, otherwise empty.
    pub tied: Vec<PlayerId>,
}

/// What the reveal phase announces for a resolved round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RevealRecord {
    /// The resolved round.
    pub round: RoundId,
    /// The eliminated player, if any.
    pub eliminated: Option<PlayerId>,
    /// Alias of the eliminated player.
    pub eliminated_alias: Option<String>,
    /// Unmasked role of the eliminated player.
    pub role: Option<Role>,
    /// Votes received per target.
    pub vote_counts: BTreeMap<PlayerId, u32>,
    /// Whether the round ended in a tie.
    pub tied: bool,
    /// Living saboteur-capable players after the elimination.
    pub saboteurs_remaining: u32,
}

// ---------------------------------------------------------------------------
// Suspicion
// ---------------------------------------------------------------------------

/// Why a player was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case", tag = "type")]
#[ts(export, export_to = "bindings/")]
pub enum SuspicionReason {
    /// Lots of movement and no task output.
    HighMovementNoOutput {
        /// Number of movements logged.
        movements: u32,
    },
    /// The player's last known zone matched a sabotaged zone.
    PresentAtSabotage {
        /// The sabotaged zone.
        zone: Zone,
        /// Sequence number of the sabotage entry.
        entry_seq: u64,
    },
    /// Barely any logged activity.
    UnusuallyIdle {
        /// Number of attributed actions logged.
        actions: u32,
    },
}

/// A derived behavioural signal. Not an accusation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SuspicionFlag {
    /// The flagged player.
    pub player: PlayerId,
    /// Why the player was flagged.
    pub reason: SuspicionReason,
    /// How strong the signal is.
    pub severity: Severity,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// A decided game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GameResult {
    /// The winning side.
    pub winner: Side,
    /// The rule that decided the game.
    pub reason: WinReason,
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case", tag = "type")]
#[ts(export, export_to = "bindings/")]
pub enum Outcome {
    /// One side won.
    Victory {
        /// The decided game.
        result: GameResult,
    },
    /// The session was aborted before a side won.
    Aborted {
        /// Why it was aborted.
        reason: AbortReason,
    },
}

impl Outcome {
    /// The winning side, if the game was decided.
    pub const fn winner(&self) -> Option<Side> {
        match self {
            Self::Victory { result } => Some(result.winner),
            Self::Aborted { .. } => None,
        }
    }
}

/// Per-player line of the final result summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlayerResult {
    /// The player.
    pub player: PlayerId,
    /// Display alias.
    pub alias: String,
    /// The role they held, if the session got far enough to assign one.
    pub role: Option<Role>,
    /// Whether they survived.
    pub alive: bool,
    /// Whether their side won.
    pub won: bool,
    /// Experience awarded for the session.
    pub xp_gained: u32,
    /// Reputation awarded for the session.
    pub reputation_gained: u32,
}

/// Final summary emitted when a session reaches `Complete`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SessionResult {
    /// The session.
    pub session_id: SessionId,
    /// How it ended.
    pub outcome: Outcome,
    /// Every resolved voting round, oldest first.
    pub rounds: Vec<EliminationResult>,
    /// Final task progress.
    pub tasks: TaskProgress,
    /// Total sabotages performed.
    pub sabotages: u32,
    /// Per-player results in roster order.
    pub players: Vec<PlayerResult>,
    /// Session clock at completion.
    pub duration_secs: u64,
    /// Wall-clock completion time.
    pub ended_at: DateTime<Utc>,
}
