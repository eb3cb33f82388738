//! Reveal sequencing.
//!
//! After a round resolves, the reveal announces who was removed and
//! unmasks their role to everyone.

use infiltration_rules::living_sides;
use infiltration_types::{EliminationResult, Player, RevealRecord};

/// Build the reveal for a resolved round.
///
/// `roster` must already reflect the elimination, so the saboteur count
/// describes the game going forward.
pub fn build_reveal(result: &EliminationResult, roster: &[Player]) -> RevealRecord {
    let eliminated = result
        .eliminated
        .and_then(|id| roster.iter().find(|p| p.id == id));
    let (saboteurs_remaining, _) = living_sides(roster);

    RevealRecord {
        round: result.round,
        eliminated: result.eliminated,
        eliminated_alias: eliminated.map(|p| p.alias.clone()),
        role: eliminated.and_then(|p| p.role),
        vote_counts: result.vote_counts.clone(),
        tied: !result.tied.is_empty(),
        saboteurs_remaining,
    }
}
