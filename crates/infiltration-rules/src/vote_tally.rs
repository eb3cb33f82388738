//! Voting rounds.
//!
//! One round is open at a time. Each voter holds at most one ballot per
//! round; a later ballot replaces the earlier one. Resolution counts ballots
//! per target and is independent of the order they were cast.

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::debug;

use infiltration_types::{EliminationResult, PlayerId, RoundId, TiePolicy, Vote};

use crate::error::GameError;

#[derive(Debug, Clone)]
struct Round {
    id: RoundId,
    ballots: BTreeMap<PlayerId, PlayerId>,
    resolved: bool,
}

/// Ballot box for a session's voting rounds.
#[derive(Debug, Clone, Default)]
pub struct VoteTally {
    current: Option<Round>,
}

impl VoteTally {
    /// Create a tally with no round open.
    pub const fn new() -> Self {
        Self { current: None }
    }

    /// Open `round`. Round ids must strictly increase.
    pub fn open_round(&mut self, round: RoundId) -> Result<(), GameError> {
        if let Some(current) = &self.current {
            if round <= current.id {
                return Err(GameError::PhaseMismatch {
                    action: "open_round",
                    context: format!("{round} does not follow {}", current.id),
                });
            }
        }
        self.current = Some(Round {
            id: round,
            ballots: BTreeMap::new(),
            resolved: false,
        });
        Ok(())
    }

    /// Cast or replace `voter`'s ballot in `round`.
    ///
    /// Returns the ballot this one replaced, if any.
    pub fn cast_vote(
        &mut self,
        round: RoundId,
        voter: PlayerId,
        target: PlayerId,
        living: &BTreeSet<PlayerId>,
        allow_self_vote: bool,
    ) -> Result<Option<PlayerId>, GameError> {
        let open = self.open_mut(round, "cast_vote")?;
        if !living.contains(&target) {
            return Err(GameError::UnknownTarget(target));
        }
        if voter == target && !allow_self_vote {
            return Err(GameError::SelfVoteNotAllowed(voter));
        }
        Ok(open.ballots.insert(voter, target))
    }

    /// Close `round` and decide who, if anyone, is eliminated.
    ///
    /// A round resolves exactly once. With zero ballots nobody is
    /// eliminated. A tie follows `policy`.
    pub fn resolve<R: Rng + ?Sized>(
        &mut self,
        round: RoundId,
        policy: TiePolicy,
        rng: &mut R,
    ) -> Result<EliminationResult, GameError> {
        let open = self.open_mut(round, "resolve")?;
        open.resolved = true;

        let mut vote_counts: BTreeMap<PlayerId, u32> = BTreeMap::new();
        for target in open.ballots.values() {
            let count = vote_counts.entry(*target).or_insert(0);
            *count = count.saturating_add(1);
        }

        let top = vote_counts.values().copied().max().unwrap_or(0);
        let leaders: Vec<PlayerId> = vote_counts
            .iter()
            .filter(|(_, n)| **n == top)
            .map(|(p, _)| *p)
            .collect();

        let (eliminated, tied) = match leaders.as_slice() {
            [] => (None, Vec::new()),
            [single] => (Some(*single), Vec::new()),
            several => {
                let pick = match policy {
                    TiePolicy::NoElimination => None,
                    TiePolicy::RandomAmongTied => several.choose(rng).copied(),
                };
                (pick, leaders.clone())
            }
        };

        debug!(%round, ?eliminated, ballots = open.ballots.len(), tied = tied.len(), "round resolved");
        Ok(EliminationResult {
            round,
            eliminated,
            vote_counts,
            tied,
        })
    }

    /// The latest round opened, resolved or not.
    pub fn current_round(&self) -> Option<RoundId> {
        self.current.as_ref().map(|r| r.id)
    }

    /// Whether a round is open for ballots.
    pub fn is_open(&self) -> bool {
        self.current.as_ref().is_some_and(|r| !r.resolved)
    }

    /// `voter`'s ballot in the current round.
    pub fn ballot_of(&self, voter: PlayerId) -> Option<PlayerId> {
        self.current
            .as_ref()
            .and_then(|r| r.ballots.get(&voter).copied())
    }

    /// Number of ballots in the current round.
    pub fn votes_cast(&self) -> u32 {
        self.current
            .as_ref()
            .map_or(0, |r| u32::try_from(r.ballots.len()).unwrap_or(u32::MAX))
    }

    /// Every ballot in the current round, ordered by voter.
    pub fn ballots(&self) -> Vec<Vote> {
        self.current.as_ref().map_or_else(Vec::new, |r| {
            r.ballots
                .iter()
                .map(|(voter, target)| Vote {
                    voter: *voter,
                    target: *target,
                    round: r.id,
                })
                .collect()
        })
    }

    fn open_mut(&mut self, round: RoundId, action: &'static str) -> Result<&mut Round, GameError> {
        match self.current.as_mut() {
            Some(open) if open.id == round && !open.resolved => Ok(open),
            Some(open) if open.id == round => Err(GameError::PhaseMismatch {
                action,
                context: format!("{round} is already resolved"),
            }),
            Some(open) => Err(GameError::PhaseMismatch {
                action,
                context: format!("{round} is not open, {} is", open.id),
            }),
            None => Err(GameError::PhaseMismatch {
                action,
                context: String::from("no voting round is open"),
            }),
        }
    }
}
