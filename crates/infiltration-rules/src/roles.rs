//! Hidden role assignment.
//!
//! A [`RatioTable`] turns a roster size into exact role counts. [`assign`]
//! builds a pool with those counts, shuffles it uniformly, and hands the
//! first N roles to the N players. Assignment either succeeds for the whole
//! roster or assigns nothing.

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

use infiltration_types::{Capability, PlayerId, Role};

use crate::error::GameError;

// ---------------------------------------------------------------------------
// Ratio table
// ---------------------------------------------------------------------------

/// How many players receive a non-base role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum QuotaRule {
    /// Exactly `count`, but only once the roster reaches `min_roster`.
    Fixed {
        /// Players receiving the role.
        count: u32,
        /// Smallest roster that includes the role.
        min_roster: u32,
    },
    /// One per `every` players, never fewer than `min`.
    PerPlayers {
        /// Roster players per role holder.
        every: u32,
        /// Lower bound on the count.
        min: u32,
    },
}

impl QuotaRule {
    /// Role holders for a roster of `roster` players.
    pub const fn count_for(self, roster: u32) -> u32 {
        match self {
            Self::Fixed { count, min_roster } => {
                if roster >= min_roster {
                    count
                } else {
                    0
                }
            }
            Self::PerPlayers { every, min } => match roster.checked_div(every) {
                Some(n) if n > min => n,
                _ => min,
            },
        }
    }
}

/// One non-base role and how many players receive it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleQuota {
    /// The role.
    pub role: Role,
    /// How its count scales with the roster.
    pub rule: QuotaRule,
}

/// Role distribution rules for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatioTable {
    /// Role that fills the rest of the roster.
    #[serde(default = "default_base_role")]
    pub base_role: Role,
    /// Minimum number of base-role players.
    #[serde(default = "default_min_base")]
    pub min_base: u32,
    /// Non-base roles.
    #[serde(default = "default_quotas")]
    pub quotas: Vec<RoleQuota>,
}

const fn default_base_role() -> Role {
    Role::Loyal
}

const fn default_min_base() -> u32 {
    1
}

fn default_quotas() -> Vec<RoleQuota> {
    vec![
        RoleQuota {
            role: Role::Saboteur,
            rule: QuotaRule::PerPlayers { every: 4, min: 1 },
        },
        RoleQuota {
            role: Role::Analyst,
            rule: QuotaRule::Fixed {
                count: 1,
                min_roster: 6,
            },
        },
        RoleQuota {
            role: Role::Protector,
            rule: QuotaRule::Fixed {
                count: 1,
                min_roster: 7,
            },
        },
    ]
}

impl Default for RatioTable {
    fn default() -> Self {
        Self {
            base_role: default_base_role(),
            min_base: default_min_base(),
            quotas: default_quotas(),
        }
    }
}

impl RatioTable {
    /// Check the table is usable at all, independent of roster size.
    pub fn validate(&self) -> Result<(), GameError> {
        let mut seen = BTreeSet::new();
        for quota in &self.quotas {
            if quota.role == self.base_role {
                return Err(GameError::InvalidConfig {
                    reason: format!("{:?} is both base role and a quota", quota.role),
                });
            }
            if !seen.insert(quota.role) {
                return Err(GameError::InvalidConfig {
                    reason: format!("{:?} has more than one quota", quota.role),
                });
            }
            if let QuotaRule::PerPlayers { every: 0, .. } = quota.rule {
                return Err(GameError::InvalidConfig {
                    reason: format!("{:?} quota divides by zero players", quota.role),
                });
            }
        }
        let has_saboteur = self.base_role.has(Capability::Sabotage)
            || self.quotas.iter().any(|q| q.role.has(Capability::Sabotage));
        if !has_saboteur {
            return Err(GameError::InvalidConfig {
                reason: String::from("ratio table has no sabotage-capable role"),
            });
        }
        Ok(())
    }

    /// Exact role counts for a roster of `roster` players.
    ///
    /// Roles with a zero count are omitted. Fails with
    /// [`GameError::InsufficientPlayers`] when the quotas plus `min_base`
    /// exceed the roster.
    pub fn counts_for(&self, roster: u32) -> Result<BTreeMap<Role, u32>, GameError> {
        self.validate()?;

        let mut counts = BTreeMap::new();
        let mut special: u32 = 0;
        for quota in &self.quotas {
            let n = quota.rule.count_for(roster);
            if n > 0 {
                counts.insert(quota.role, n);
                special = special.saturating_add(n);
            }
        }

        let needed = special.saturating_add(self.min_base);
        if needed > roster {
            return Err(GameError::InsufficientPlayers {
                needed,
                present: roster,
            });
        }
        let base = roster.saturating_sub(special);
        if base > 0 {
            counts.insert(self.base_role, base);
        }

        let saboteurs: u32 = counts
            .iter()
            .filter(|(role, _)| role.has(Capability::Sabotage))
            .map(|(_, n)| *n)
            .sum();
        if saboteurs == 0 {
            return Err(GameError::InvalidConfig {
                reason: format!("ratio table yields no saboteur for {roster} players"),
            });
        }
        Ok(counts)
    }
}

// ---------------------------------------------------------------------------
// Assignment
// ---------------------------------------------------------------------------

/// Assign a hidden role to every player.
///
/// The returned map covers exactly the given players. Nothing is assigned
/// on failure.
pub fn assign<R: Rng + ?Sized>(
    players: &[PlayerId],
    table: &RatioTable,
    rng: &mut R,
) -> Result<BTreeMap<PlayerId, Role>, GameError> {
    let mut unique = BTreeSet::new();
    for id in players {
        if !unique.insert(*id) {
            return Err(GameError::invalid(format!("duplicate player {id}")));
        }
    }

    let roster = u32::try_from(players.len()).unwrap_or(u32::MAX);
    let counts = table.counts_for(roster)?;

    let mut pool: Vec<Role> = counts
        .iter()
        .flat_map(|(role, n)| std::iter::repeat_n(*role, usize::try_from(*n).unwrap_or(0)))
        .collect();
    pool.shuffle(rng);

    debug!(roster, ?counts, "roles assigned");
    Ok(players.iter().copied().zip(pool).collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn roster(n: usize) -> Vec<PlayerId> {
        (0..n).map(|_| PlayerId::new()).collect()
    }

    fn tally(assigned: &BTreeMap<PlayerId, Role>) -> BTreeMap<Role, u32> {
        let mut counts = BTreeMap::new();
        for role in assigned.values() {
            let entry = counts.entry(*role).or_insert(0_u32);
            *entry = entry.saturating_add(1);
        }
        counts
    }

    #[test]
    fn eight_players_match_the_standard_pool() {
        let counts = RatioTable::default().counts_for(8).unwrap();
        assert_eq!(counts.get(&Role::Loyal), Some(&4));
        assert_eq!(counts.get(&Role::Saboteur), Some(&2));
        assert_eq!(counts.get(&Role::Analyst), Some(&1));
        assert_eq!(counts.get(&Role::Protector), Some(&1));
    }

    #[test]
    fn small_rosters_get_one_saboteur_and_no_specialists() {
        let counts = RatioTable::default().counts_for(3).unwrap();
        assert_eq!(counts.get(&Role::Saboteur), Some(&1));
        assert_eq!(counts.get(&Role::Loyal), Some(&2));
        assert_eq!(counts.get(&Role::Analyst), None);
    }

    #[test]
    fn counts_always_sum_to_roster() {
        let table = RatioTable::default();
        for n in 2..=12_u32 {
            let counts = table.counts_for(n).unwrap();
            assert_eq!(counts.values().sum::<u32>(), n, "roster {n}");
        }
    }

    #[test]
    fn assignment_matches_table_for_many_seeds_and_sizes() {
        let table = RatioTable::default();
        for n in 3..=12_usize {
            let players = roster(n);
            let expected = table.counts_for(u32::try_from(n).unwrap()).unwrap();
            for seed in 0..50_u64 {
                let mut rng = SmallRng::seed_from_u64(seed);
                let assigned = assign(&players, &table, &mut rng).unwrap();
                assert_eq!(assigned.len(), n);
                assert_eq!(tally(&assigned), expected, "n={n} seed={seed}");
            }
        }
    }

    #[test]
    fn same_seed_same_assignment() {
        let players = roster(8);
        let table = RatioTable::default();
        let a = assign(&players, &table, &mut SmallRng::seed_from_u64(7)).unwrap();
        let b = assign(&players, &table, &mut SmallRng::seed_from_u64(7)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn shuffle_varies_who_is_saboteur() {
        let players = roster(8);
        let table = RatioTable::default();
        let mut saboteurs = BTreeSet::new();
        for seed in 0..40_u64 {
            let assigned = assign(&players, &table, &mut SmallRng::seed_from_u64(seed)).unwrap();
            saboteurs.extend(
                assigned
                    .iter()
                    .filter(|(_, r)| **r == Role::Saboteur)
                    .map(|(p, _)| *p),
            );
        }
        assert!(saboteurs.len() > 2);
    }

    #[test]
    fn roster_too_small_for_table() {
        let err = assign(&roster(1), &RatioTable::default(), &mut SmallRng::seed_from_u64(1));
        assert_eq!(
            err,
            Err(GameError::InsufficientPlayers {
                needed: 2,
                present: 1
            })
        );
    }

    #[test]
    fn duplicate_players_rejected() {
        let id = PlayerId::new();
        let err = assign(&[id, id, PlayerId::new()], &RatioTable::default(), &mut SmallRng::seed_from_u64(1));
        assert!(matches!(err, Err(GameError::InvalidEntry { .. })));
    }

    #[test]
    fn table_without_saboteur_rejected() {
        let table = RatioTable {
            base_role: Role::Loyal,
            min_base: 1,
            quotas: vec![RoleQuota {
                role: Role::Analyst,
                rule: QuotaRule::Fixed {
                    count: 1,
                    min_roster: 1,
                },
            }],
        };
        assert!(matches!(table.validate(), Err(GameError::InvalidConfig { .. })));
    }

    #[test]
    fn zero_divisor_rejected() {
        let table = RatioTable {
            quotas: vec![RoleQuota {
                role: Role::Saboteur,
                rule: QuotaRule::PerPlayers { every: 0, min: 1 },
            }],
            ..RatioTable::default()
        };
        assert!(matches!(table.validate(), Err(GameError::InvalidConfig { .. })));
    }

    #[test]
    fn ratio_table_deserializes_from_json() {
        let json = r#"{"quotas":[{"role":"saboteur","rule":{"type":"per_players","every":3,"min":1}}]}"#;
        let table: RatioTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.base_role, Role::Loyal);
        assert_eq!(table.counts_for(9).unwrap().get(&Role::Saboteur), Some(&3));
    }
}
