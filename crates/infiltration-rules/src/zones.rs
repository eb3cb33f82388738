//! The mission map.
//!
//! Four zones joined in a ring:
//!
//! ```text
//! CommandTerminal -- DataVault
//!        |               |
//!   WhisperNode  --  CipherRoom
//! ```
//!
//! Every zone hosts two tasks and two sabotage points. Players start in the
//! Command Terminal and may only move to an adjacent zone.

use infiltration_types::{SabotageKind, Zone};

use crate::task_board::TaskTemplate;

/// Zones reachable in one move from `zone`.
pub const fn neighbors(zone: Zone) -> &'static [Zone] {
    match zone {
        Zone::CommandTerminal => &[Zone::DataVault, Zone::WhisperNode],
        Zone::DataVault => &[Zone::CommandTerminal, Zone::CipherRoom],
        Zone::CipherRoom => &[Zone::DataVault, Zone::WhisperNode],
        Zone::WhisperNode => &[Zone::CommandTerminal, Zone::CipherRoom],
    }
}

/// Whether a player in `from` may move directly to `to`.
pub fn is_adjacent(from: Zone, to: Zone) -> bool {
    neighbors(from).contains(&to)
}

/// Sabotage kinds that can be triggered in `zone`.
pub const fn sabotage_points(zone: Zone) -> &'static [SabotageKind] {
    match zone {
        Zone::CommandTerminal => &[SabotageKind::DisableAuth, SabotageKind::CorruptLogs],
        Zone::DataVault => &[SabotageKind::CorruptData, SabotageKind::LockVault],
        Zone::CipherRoom => &[SabotageKind::ScrambleCipher, SabotageKind::FalseDecode],
        Zone::WhisperNode => &[SabotageKind::JamSignals, SabotageKind::InterceptWhispers],
    }
}

/// The zone a sabotage kind belongs to.
pub const fn sabotage_zone(kind: SabotageKind) -> Zone {
    match kind {
        SabotageKind::DisableAuth | SabotageKind::CorruptLogs => Zone::CommandTerminal,
        SabotageKind::CorruptData | SabotageKind::LockVault => Zone::DataVault,
        SabotageKind::ScrambleCipher | SabotageKind::FalseDecode => Zone::CipherRoom,
        SabotageKind::JamSignals | SabotageKind::InterceptWhispers => Zone::WhisperNode,
    }
}

/// The standard eight-task board, two tasks per zone.
///
/// Durations follow the minigame difficulty: easy 20s, medium 30s, hard 45s.
pub fn default_catalog() -> Vec<TaskTemplate> {
    [
        (Zone::CommandTerminal, "Authenticate Access", 20),
        (Zone::CommandTerminal, "System Scan", 30),
        (Zone::DataVault, "Backup Critical Data", 45),
        (Zone::DataVault, "Verify Integrity", 30),
        (Zone::CipherRoom, "Decode Messages", 45),
        (Zone::CipherRoom, "Encrypt Logs", 30),
        (Zone::WhisperNode, "Relay Messages", 20),
        (Zone::WhisperNode, "Secure Channel", 30),
    ]
    .into_iter()
    .map(|(zone, name, duration_secs)| TaskTemplate {
        zone,
        name: name.to_owned(),
        duration_secs,
    })
    .collect()
}
