//! Scripted bot players for the demo session.
//!
//! Each bot decides from its own [`SessionView`], the same filtered
//! projection a real client receives, so bots only know what their role
//! lets them see. Their behaviour is deliberately simple: work the tasks in
//! reach, wander toward open work, sabotage now and then when they can, and
//! vote for whoever the log makes look worst.

use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use serde::Deserialize;
use tracing::debug;

use infiltration_core::SessionManager;
use infiltration_rules::GameError;
use infiltration_rules::zones::{neighbors, sabotage_points};
use infiltration_types::{
    Actor, Capability, Phase, PlayerId, RoundId, SabotageKind, SessionId, SessionView, Severity,
    TaskId, VisibleDetail, Zone,
};

// -----------------------------------------------------------------------
// Configuration
// -----------------------------------------------------------------------

/// Demo settings, read from the `demo` section of `infiltration-config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DemoConfig {
    /// Number of bots to seat.
    #[serde(default = "default_players")]
    pub players: u32,

    /// Delay between bot turns, in milliseconds.
    #[serde(default = "default_turn_interval_ms")]
    pub turn_interval_ms: u64,

    /// Session clock seconds after which the demo aborts the session.
    #[serde(default = "default_max_clock_secs")]
    pub max_clock_secs: u64,

    /// Chance, in percent, that a saboteur bot sabotages on its turn.
    #[serde(default = "default_sabotage_percent")]
    pub sabotage_percent: u32,

    /// Chance, in percent, that a bot calls a meeting when someone is flagged.
    #[serde(default = "default_emergency_percent")]
    pub emergency_percent: u32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            players: default_players(),
            turn_interval_ms: default_turn_interval_ms(),
            max_clock_secs: default_max_clock_secs(),
            sabotage_percent: default_sabotage_percent(),
            emergency_percent: default_emergency_percent(),
        }
    }
}

const fn default_players() -> u32 {
    8
}

const fn default_turn_interval_ms() -> u64 {
    50
}

const fn default_max_clock_secs() -> u64 {
    3600
}

const fn default_sabotage_percent() -> u32 {
    25
}

const fn default_emergency_percent() -> u32 {
    5
}

// -----------------------------------------------------------------------
// Bots
// -----------------------------------------------------------------------

/// Pool of bot aliases, drawn without replacement.
const ALIAS_POOL: &[&str] = &[
    "NEON_STORM", "GHOST_BYTE", "CIPHER_FOX", "NULL_VECTOR", "ROOT_SHADE", "ZERO_DAY",
    "BIT_WRAITH", "HEX_NOMAD", "DARK_RELAY", "PACKET_SAGE", "KERNEL_OWL", "SYNTH_VIPER",
];

const CHATTER: &[&str] = &[
    "I was working tasks the whole round.",
    "Someone keeps moving without finishing anything.",
    "Read the log before you vote.",
    "That sabotage came right after someone left the zone.",
    "I have nothing solid yet.",
];

/// A seated bot.
#[derive(Debug, Clone)]
pub struct Bot {
    /// Player identity.
    pub id: PlayerId,
    /// Display alias.
    pub alias: String,
}

/// Create `count` bots with distinct aliases.
pub fn spawn_bots<R: Rng + ?Sized>(count: u32, rng: &mut R) -> Vec<Bot> {
    let mut aliases: Vec<&str> = ALIAS_POOL.to_vec();
    aliases.shuffle(rng);
    (0..count)
        .map(|i| {
            let alias = usize::try_from(i)
                .ok()
                .and_then(|i| aliases.get(i))
                .map_or_else(|| format!("BOT_{i}"), |a| (*a).to_owned());
            Bot {
                id: PlayerId::new(),
                alias,
            }
        })
        .collect()
}

/// One thing a bot decided to do.
#[derive(Debug, Clone, PartialEq, Eq)]
enum BotAction {
    CompleteTask(TaskId),
    Move(Zone),
    Sabotage(Zone, SabotageKind),
    CallEmergency,
    Vote(RoundId, PlayerId),
    Discuss(&'static str),
}

/// Plays every bot's turn against a session.
#[derive(Debug)]
pub struct BotDriver<R> {
    bots: Vec<Bot>,
    rng: R,
    config: DemoConfig,
}

impl<R: Rng> BotDriver<R> {
    /// Create a driver for `bots`.
    pub const fn new(bots: Vec<Bot>, rng: R, config: DemoConfig) -> Self {
        Self { bots, rng, config }
    }

    /// Give every bot one turn. Returns the phase the last bot saw.
    ///
    /// Rejected bot actions are expected (cooldowns, races with the clock)
    /// and only logged. A missing session ends the turn with an error.
    pub async fn play_turn(
        &mut self,
        manager: &SessionManager,
        session: SessionId,
    ) -> Result<Phase, GameError> {
        let Self { bots, rng, config } = self;
        let mut phase = Phase::Lobby;

        for bot in bots.iter() {
            let view = manager.get_snapshot(session, bot.id).await?;
            phase = view.phase;
            let Some(action) = choose_action(&view, rng, config) else {
                continue;
            };

            let outcome = match &action {
                BotAction::CompleteTask(task) => {
                    manager.submit_task_completion(session, bot.id, *task).await
                }
                BotAction::Move(zone) => manager.move_player(session, bot.id, *zone).await,
                BotAction::Sabotage(zone, kind) => {
                    manager.submit_sabotage(session, bot.id, *zone, *kind).await
                }
                BotAction::CallEmergency => manager
                    .call_emergency_meeting(session, bot.id)
                    .await
                    .map(|_| ()),
                BotAction::Vote(round, target) => {
                    manager.cast_vote(session, *round, bot.id, *target).await
                }
                BotAction::Discuss(message) => {
                    manager.post_discussion(session, bot.id, message).await
                }
            };

            match outcome {
                Ok(()) => debug!(bot = bot.alias, ?action, "bot acted"),
                Err(GameError::SessionNotFound(id)) => return Err(GameError::SessionNotFound(id)),
                Err(err) => debug!(bot = bot.alias, ?action, error = %err, "bot action rejected"),
            }
        }
        Ok(phase)
    }
}

// -----------------------------------------------------------------------
// Decision making
// -----------------------------------------------------------------------

fn choose_action<R: Rng + ?Sized>(
    view: &SessionView,
    rng: &mut R,
    config: &DemoConfig,
) -> Option<BotAction> {
    if !view.you.alive {
        return None;
    }
    match view.phase {
        Phase::Tasks => task_phase_action(view, rng, config),
        Phase::Voting => voting_action(view, rng),
        Phase::Lobby | Phase::Briefing | Phase::Reveal | Phase::Complete => None,
    }
}

fn task_phase_action<R: Rng + ?Sized>(
    view: &SessionView,
    rng: &mut R,
    config: &DemoConfig,
) -> Option<BotAction> {
    let can = |c: Capability| view.you.capabilities.contains(&c);
    let zone = view.you.zone;

    if can(Capability::Sabotage)
        && view.sabotages_left > 0
        && rng.random_ratio(config.sabotage_percent.min(100), 100)
    {
        if let Some(kind) = sabotage_points(zone).choose(rng) {
            return Some(BotAction::Sabotage(zone, *kind));
        }
    }

    if can(Capability::CallEmergencyMeeting)
        && view.emergency_meetings_left > 0
        && most_suspicious(view).is_some()
        && rng.random_ratio(config.emergency_percent.min(100), 100)
    {
        return Some(BotAction::CallEmergency);
    }

    let open_here: Vec<TaskId> = view
        .tasks
        .iter()
        .filter(|t| !t.completed && t.zone == zone)
        .map(|t| t.id)
        .collect();
    let works = can(Capability::CompleteTasks)
        || (can(Capability::FakeTasks) && rng.random_ratio(1, 3));
    if works {
        if let Some(task) = open_here.choose(rng) {
            return Some(BotAction::CompleteTask(*task));
        }
    }

    let has_work = |z: &Zone| view.tasks.iter().any(|t| !t.completed && t.zone == *z);
    let promising: Vec<Zone> = neighbors(zone).iter().copied().filter(has_work).collect();
    promising
        .choose(rng)
        .or_else(|| neighbors(zone).choose(rng))
        .copied()
        .map(BotAction::Move)
}

fn voting_action<R: Rng + ?Sized>(view: &SessionView, rng: &mut R) -> Option<BotAction> {
    let voting = view.voting.as_ref()?;
    if voting.your_vote.is_some() {
        return rng
            .random_ratio(1, 8)
            .then(|| CHATTER.choose(rng).copied())
            .flatten()
            .map(BotAction::Discuss);
    }

    let me = view.you.id;
    let candidates: Vec<PlayerId> = view
        .players
        .iter()
        .filter(|p| p.alive && p.id != me)
        .map(|p| p.id)
        .collect();

    let target = if view.you.capabilities.contains(&Capability::Sabotage) {
        candidates.choose(rng).copied()
    } else {
        caught_forging(view, &candidates)
            .or_else(|| most_suspicious(view).filter(|p| candidates.contains(p)))
            .or_else(|| candidates.choose(rng).copied())
    }?;
    Some(BotAction::Vote(voting.round, target))
}

/// A living player the log shows submitting a forged task.
fn caught_forging(view: &SessionView, candidates: &[PlayerId]) -> Option<PlayerId> {
    view.log.iter().find_map(|entry| match (&entry.detail, entry.actor) {
        (VisibleDetail::TaskComplete { forged: Some(true), .. }, Actor::Player(p))
            if candidates.contains(&p) =>
        {
            Some(p)
        }
        _ => None,
    })
}

/// The other player with the heaviest suspicion, if anyone is flagged
/// above `Low`.
fn most_suspicious(view: &SessionView) -> Option<PlayerId> {
    let mut weight: BTreeMap<PlayerId, u32> = BTreeMap::new();
    for flag in view.suspicion.iter().filter(|f| f.player != view.you.id) {
        let w = match flag.severity {
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
        };
        let total = weight.entry(flag.player).or_insert(0);
        *total = total.saturating_add(w);
    }
    weight
        .into_iter()
        .filter(|(_, w)| *w > 1)
        .max_by_key(|(_, w)| *w)
        .map(|(p, _)| p)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    #[test]
    fn bots_get_distinct_aliases() {
        let mut rng = SmallRng::seed_from_u64(1);
        let bots = spawn_bots(8, &mut rng);
        assert_eq!(bots.len(), 8);
        let mut aliases: Vec<&str> = bots.iter().map(|b| b.alias.as_str()).collect();
        aliases.sort_unstable();
        aliases.dedup();
        assert_eq!(aliases.len(), 8);
    }

    #[test]
    fn overflow_bots_get_numbered_aliases() {
        let mut rng = SmallRng::seed_from_u64(2);
        let bots = spawn_bots(14, &mut rng);
        assert!(bots.iter().any(|b| b.alias == "BOT_13"));
    }

    #[test]
    fn demo_defaults() {
        let demo = DemoConfig::default();
        assert_eq!(demo.players, 8);
        assert_eq!(demo.turn_interval_ms, 50);
    }
}
