//! End-of-session rewards.
//!
//! Every player who saw a decided game earns base experience and
//! reputation, with bonuses for winning and for playing a role that is
//! harder to play well. Aborted sessions award nothing.

use serde::{Deserialize, Serialize};

use infiltration_types::{Outcome, Role, Side};

/// Experience and reputation awarded to one player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reward {
    /// Experience gained.
    pub xp: u32,
    /// Reputation gained.
    pub reputation: u32,
}

/// Reward amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardTable {
    /// Experience for finishing a game.
    #[serde(default = "default_base_xp")]
    pub base_xp: u32,
    /// Extra experience for a win.
    #[serde(default = "default_win_xp")]
    pub win_xp: u32,
    /// Extra experience for playing a saboteur.
    #[serde(default = "default_saboteur_xp")]
    pub saboteur_xp: u32,
    /// Extra experience for playing an analyst.
    #[serde(default = "default_analyst_xp")]
    pub analyst_xp: u32,
    /// Reputation for finishing a game.
    #[serde(default = "default_base_reputation")]
    pub base_reputation: u32,
    /// Extra reputation for a win.
    #[serde(default = "default_win_reputation")]
    pub win_reputation: u32,
    /// Extra reputation for a saboteur who got away with it.
    #[serde(default = "default_saboteur_win_reputation")]
    pub saboteur_win_reputation: u32,
}

const fn default_base_xp() -> u32 {
    50
}

const fn default_win_xp() -> u32 {
    100
}

const fn default_saboteur_xp() -> u32 {
    25
}

const fn default_analyst_xp() -> u32 {
    15
}

const fn default_base_reputation() -> u32 {
    10
}

const fn default_win_reputation() -> u32 {
    50
}

const fn default_saboteur_win_reputation() -> u32 {
    25
}

impl Default for RewardTable {
    fn default() -> Self {
        Self {
            base_xp: default_base_xp(),
            win_xp: default_win_xp(),
            saboteur_xp: default_saboteur_xp(),
            analyst_xp: default_analyst_xp(),
            base_reputation: default_base_reputation(),
            win_reputation: default_win_reputation(),
            saboteur_win_reputation: default_saboteur_win_reputation(),
        }
    }
}

impl RewardTable {
    /// Reward for a player who held `role` in a session that ended with
    /// `outcome`.
    pub fn reward_for(&self, role: Option<Role>, outcome: &Outcome) -> Reward {
        let (Some(role), Some(winner)) = (role, outcome.winner()) else {
            return Reward::default();
        };
        let won = role.wins(winner);

        let mut xp = self.base_xp;
        let mut reputation = self.base_reputation;
        if won {
            xp = xp.saturating_add(self.win_xp);
            reputation = reputation.saturating_add(self.win_reputation);
        }
        match role {
            Role::Saboteur => {
                xp = xp.saturating_add(self.saboteur_xp);
                if winner == Side::Saboteur {
                    reputation = reputation.saturating_add(self.saboteur_win_reputation);
                }
            }
            Role::Analyst => xp = xp.saturating_add(self.analyst_xp),
            Role::Loyal | Role::Protector => {}
        }
        Reward { xp, reputation }
    }
}

#[cfg(test)]
mod tests {
    use infiltration_types::{AbortReason, GameResult, WinReason};

    use super::*;

    fn victory(winner: Side) -> Outcome {
        Outcome::Victory {
            result: GameResult {
                winner,
                reason: WinReason::SaboteurParity,
            },
        }
    }

    #[test]
    fn winning_saboteur_gets_every_bonus() {
        let reward = RewardTable::default().reward_for(Some(Role::Saboteur), &victory(Side::Saboteur));
        assert_eq!(reward, Reward { xp: 175, reputation: 85 });
    }

    #[test]
    fn losing_analyst_keeps_role_bonus() {
        let reward = RewardTable::default().reward_for(Some(Role::Analyst), &victory(Side::Saboteur));
        assert_eq!(reward, Reward { xp: 65, reputation: 10 });
    }

    #[test]
    fn winning_loyal_player() {
        let reward = RewardTable::default().reward_for(Some(Role::Protector), &victory(Side::Loyal));
        assert_eq!(reward, Reward { xp: 150, reputation: 60 });
    }

    #[test]
    fn aborted_sessions_award_nothing() {
        let outcome = Outcome::Aborted {
            reason: AbortReason::HostLeft,
        };
        assert_eq!(
            RewardTable::default().reward_for(Some(Role::Loyal), &outcome),
            Reward::default()
        );
    }
}
