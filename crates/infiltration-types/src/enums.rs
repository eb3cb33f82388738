//! Enumeration types for the Infiltration session engine.
//!
//! Roles, sides, capabilities, phases, zones, and the other closed sets a
//! session is built from. Role behaviour is expressed entirely through the
//! [`Capability`] set a role carries; nothing downstream compares role
//! names.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Roles and sides
// ---------------------------------------------------------------------------

/// The side a role fights for. Every role belongs to exactly one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Side {
    /// Players trying to finish the mission and expose the saboteurs.
    Loyal,
    /// Players trying to wreck the mission without being caught.
    Saboteur,
}

/// An ability tag consumed by the session rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Capability {
    /// May submit task completions that count toward mission progress.
    CompleteTasks,
    /// May interrupt the task phase with an emergency meeting.
    CallEmergencyMeeting,
    /// May cast votes during a voting round.
    Vote,
    /// May sabotage zones. Also grants sight of sabotage culprits in the log.
    Sabotage,
    /// May submit forged task completions that never count toward progress.
    FakeTasks,
    /// Sees the forged flag on task completion entries.
    AnalyzeLogs,
    /// Sees the zone every other player is in.
    TrackLocations,
}

const LOYAL_CAPABILITIES: &[Capability] = &[
    Capability::CompleteTasks,
    Capability::CallEmergencyMeeting,
    Capability::Vote,
];

const SABOTEUR_CAPABILITIES: &[Capability] =
    &[Capability::Sabotage, Capability::FakeTasks, Capability::Vote];

const ANALYST_CAPABILITIES: &[Capability] = &[
    Capability::CompleteTasks,
    Capability::CallEmergencyMeeting,
    Capability::Vote,
    Capability::AnalyzeLogs,
];

const PROTECTOR_CAPABILITIES: &[Capability] = &[
    Capability::CompleteTasks,
    Capability::CallEmergencyMeeting,
    Capability::Vote,
    Capability::TrackLocations,
];

/// A hidden role assigned to each player at session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Role {
    /// Base loyal role: completes tasks and hunts saboteurs.
    Loyal,
    /// Adversary: sabotages zones and fakes work.
    Saboteur,
    /// Loyal specialist who can spot forged log entries.
    Analyst,
    /// Loyal specialist who can track where everyone is.
    Protector,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Self; 4] = [Self::Loyal, Self::Saboteur, Self::Analyst, Self::Protector];

    /// The side this role plays for.
    pub const fn side(self) -> Side {
        match self {
            Self::Saboteur => Side::Saboteur,
            Self::Loyal | Self::Analyst | Self::Protector => Side::Loyal,
        }
    }

    /// The capability set granted by this role while the player is alive.
    pub const fn capabilities(self) -> &'static [Capability] {
        match self {
            Self::Loyal => LOYAL_CAPABILITIES,
            Self::Saboteur => SABOTEUR_CAPABILITIES,
            Self::Analyst => ANALYST_CAPABILITIES,
            Self::Protector => PROTECTOR_CAPABILITIES,
        }
    }

    /// Whether this role carries the given capability.
    pub fn has(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Human-readable role name.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Loyal => "Loyal",
            Self::Saboteur => "Saboteur",
            Self::Analyst => "Analyst",
            Self::Protector => "Protector",
        }
    }

    /// One-line briefing shown to the player who holds the role.
    pub const fn description(self) -> &'static str {
        match self {
            Self::Loyal => "Complete tasks and identify the saboteurs.",
            Self::Saboteur => "Sabotage systems and avoid detection.",
            Self::Analyst => "Decrypt the action log and detect forged entries.",
            Self::Protector => "Track movements and protect the team.",
        }
    }

    /// Win condition text shown during the briefing.
    pub const fn win_condition(self) -> &'static str {
        match self {
            Self::Saboteur => "Equal or outnumber the loyal side.",
            Self::Loyal | Self::Analyst | Self::Protector => {
                "Complete the mission tasks or vote out every saboteur."
            }
        }
    }

    /// Win-condition predicate: did a player holding this role win?
    pub fn wins(self, winner: Side) -> bool {
        self.side() == winner
    }
}

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

/// A named stage of the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Phase {
    /// Players join and signal ready.
    Lobby,
    /// Roles are assigned; each player reads their own briefing.
    Briefing,
    /// Timed phase for tasks, movement, and sabotage.
    Tasks,
    /// Timed voting round.
    Voting,
    /// Elimination is announced and the eliminated role unmasked.
    Reveal,
    /// Terminal phase. The session result is available.
    Complete,
}

impl Phase {
    /// Whether the phase is terminal.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete)
    }

    /// Whether roles have been assigned by the time this phase is reached.
    pub const fn is_started(self) -> bool {
        !matches!(self, Self::Lobby)
    }
}

// ---------------------------------------------------------------------------
// Action log
// ---------------------------------------------------------------------------

/// The kind of an action log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ActionKind {
    /// A task completion (genuine or forged).
    TaskComplete,
    /// A player moved between zones.
    Movement,
    /// A zone was sabotaged.
    Sabotage,
    /// A vote was cast.
    Vote,
    /// A discussion message was posted.
    Discussion,
    /// Engine notices: emergencies, eliminations, phase announcements.
    System,
}

// ---------------------------------------------------------------------------
// Zones and sabotage
// ---------------------------------------------------------------------------

/// A zone of the mission map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Zone {
    /// Central terminal. Every player starts here.
    CommandTerminal,
    /// Storage vault.
    DataVault,
    /// Cryptography room.
    CipherRoom,
    /// Communications relay.
    WhisperNode,
}

impl Zone {
    /// Every zone, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::CommandTerminal,
        Self::DataVault,
        Self::CipherRoom,
        Self::WhisperNode,
    ];

    /// Human-readable zone name.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::CommandTerminal => "Command Terminal",
            Self::DataVault => "Data Vault",
            Self::CipherRoom => "Cipher Room",
            Self::WhisperNode => "Whisper Node",
        }
    }
}

/// A kind of sabotage. Each kind can only be triggered in one zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum SabotageKind {
    /// Disable terminal authentication.
    DisableAuth,
    /// Corrupt the terminal logs.
    CorruptLogs,
    /// Corrupt the vault data.
    CorruptData,
    /// Lock the vault.
    LockVault,
    /// Scramble the cipher keys.
    ScrambleCipher,
    /// Plant a false decode.
    FalseDecode,
    /// Jam the relay signals.
    JamSignals,
    /// Intercept whispered messages.
    InterceptWhispers,
}

// ---------------------------------------------------------------------------
// Analysis, voting, and results
// ---------------------------------------------------------------------------

/// Severity of a suspicion flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Severity {
    /// Weak signal.
    Low,
    /// Moderate signal.
    Medium,
    /// Strong signal.
    High,
}

/// What happens when two or more targets share the highest vote count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum TiePolicy {
    /// Nobody is eliminated.
    #[default]
    NoElimination,
    /// One of the tied targets is eliminated uniformly at random.
    RandomAmongTied,
}

/// Why a side won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum WinReason {
    /// No saboteur-capable player is alive.
    AllSaboteursEliminated,
    /// Living saboteurs equal or outnumber everyone else.
    SaboteurParity,
    /// The configured number of sabotages was reached.
    CriticalSabotage,
    /// The loyal side finished enough tasks.
    TasksCompleted,
}

/// Why a session was aborted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case", tag = "type")]
#[ts(export, export_to = "bindings/")]
pub enum AbortReason {
    /// The host left the lobby.
    HostLeft,
    /// Too few connected living players remain to continue.
    QuorumLost,
    /// An external collaborator requested the abort.
    Requested {
        /// Free-form explanation supplied by the caller.
        message: String,
    },
}
