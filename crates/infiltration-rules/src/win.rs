//! Win condition evaluation.
//!
//! Rules are checked in a fixed order and the first that matches decides
//! the game:
//!
//! 1. No living saboteur: loyal win.
//! 2. Living saboteurs equal or outnumber everyone else alive: saboteur win.
//! 3. Sabotage count reached the critical threshold, when one is set:
//!    saboteur win.
//! 4. Completed tasks reached `tasks_to_win`: loyal win.

use serde::{Deserialize, Serialize};

use infiltration_types::{Capability, GameResult, Player, Side, TaskProgress, WinReason};

/// Thresholds the evaluator checks against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinRules {
    /// Genuine task completions that win the game for the loyal side.
    pub tasks_to_win: u32,
    /// Sabotages that win the game for the saboteurs. Disabled when `None`.
    pub critical_sabotage_threshold: Option<u32>,
}

/// What the evaluator decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Nobody has won yet.
    Continue,
    /// The game is decided.
    Ended(GameResult),
}

impl Verdict {
    /// Whether the game is decided.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Ended(_))
    }
}

/// Evaluate the win rules against the roster and board.
pub fn evaluate(
    roster: &[Player],
    progress: TaskProgress,
    sabotages: u32,
    rules: WinRules,
) -> Verdict {
    let (saboteurs, others) = living_sides(roster);

    if saboteurs == 0 {
        return ended(Side::Loyal, WinReason::AllSaboteursEliminated);
    }
    if saboteurs >= others {
        return ended(Side::Saboteur, WinReason::SaboteurParity);
    }
    if rules
        .critical_sabotage_threshold
        .is_some_and(|limit| sabotages >= limit)
    {
        return ended(Side::Saboteur, WinReason::CriticalSabotage);
    }
    if progress.completed >= rules.tasks_to_win {
        return ended(Side::Loyal, WinReason::TasksCompleted);
    }
    Verdict::Continue
}

/// Count living saboteur-capable players and everyone else alive.
///
/// Players without a role yet are ignored.
pub fn living_sides(roster: &[Player]) -> (u32, u32) {
    roster
        .iter()
        .filter(|p| p.alive)
        .filter_map(|p| p.role)
        .fold((0_u32, 0_u32), |(sab, other), role| {
            if role.has(Capability::Sabotage) {
                (sab.saturating_add(1), other)
            } else {
                (sab, other.saturating_add(1))
            }
        })
}

const fn ended(winner: Side, reason: WinReason) -> Verdict {
    Verdict::Ended(GameResult { winner, reason })
}
