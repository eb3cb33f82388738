//! Behavioural suspicion heuristics.
//!
//! [`analyze`] is a pure function of a log snapshot and a roster. It only
//! reads public attribution: sabotage entries are anonymous, so a player is
//! placed at a sabotage through their own attributed entries, never through
//! the hidden culprit field.

use serde::{Deserialize, Serialize};

use infiltration_types::{
    ActionKind, Actor, PlayerId, Severity, SuspicionFlag, SuspicionReason, Zone,
};

use crate::action_log::ActionLog;

/// Tunable thresholds for the heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspicionThresholds {
    /// Movements at or above this with no task output raise a medium flag.
    #[serde(default = "default_high_movement_min")]
    pub high_movement_min: u32,
    /// Fewer attributed actions than this raise a low flag.
    #[serde(default = "default_idle_action_floor")]
    pub idle_action_floor: u32,
}

const fn default_high_movement_min() -> u32 {
    6
}

const fn default_idle_action_floor() -> u32 {
    2
}

impl Default for SuspicionThresholds {
    fn default() -> Self {
        Self {
            high_movement_min: default_high_movement_min(),
            idle_action_floor: default_idle_action_floor(),
        }
    }
}

/// Derive every suspicion flag for `roster` from `log`.
///
/// Flags come out in roster order, then rule order (movement, sabotage
/// presence, idleness), then sabotage order.
pub fn analyze(
    log: &ActionLog,
    roster: &[PlayerId],
    thresholds: SuspicionThresholds,
) -> Vec<SuspicionFlag> {
    let mut flags = Vec::new();

    for player in roster {
        let actor = Actor::Player(*player);
        let mut movements: u32 = 0;
        let mut tasks: u32 = 0;
        let mut actions: u32 = 0;
        let mut last_zone: Option<Zone> = None;
        let mut present = Vec::new();

        for entry in log.entries() {
            if entry.actor == actor {
                actions = actions.saturating_add(1);
                match entry.kind {
                    ActionKind::Movement => movements = movements.saturating_add(1),
                    ActionKind::TaskComplete => tasks = tasks.saturating_add(1),
                    _ => {}
                }
                if entry.zone.is_some() {
                    last_zone = entry.zone;
                }
            } else if entry.kind == ActionKind::Sabotage {
                if let Some(zone) = entry.zone.filter(|z| last_zone == Some(*z)) {
                    present.push(SuspicionFlag {
                        player: *player,
                        reason: SuspicionReason::PresentAtSabotage {
                            zone,
                            entry_seq: entry.seq,
                        },
                        severity: Severity::High,
                    });
                }
            }
        }

        if movements >= thresholds.high_movement_min && tasks == 0 {
            flags.push(SuspicionFlag {
                player: *player,
                reason: SuspicionReason::HighMovementNoOutput { movements },
                severity: Severity::Medium,
            });
        }
        flags.append(&mut present);
        if actions < thresholds.idle_action_floor {
            flags.push(SuspicionFlag {
                player: *player,
                reason: SuspicionReason::UnusuallyIdle { actions },
                severity: Severity::Low,
            });
        }
    }

    flags
}
