//! Per-player session projection.
//!
//! Knowledge follows the requester's role, alive or not. Saboteurs see the
//! culprit behind each sabotage, analysts see forged flags, and protectors
//! see everyone's zone. Anything that places another player in a zone is
//! withheld from everyone else. Roles stay hidden until a player is voted out. Once
//! the session is complete every hidden field is unmasked for everyone.

use infiltration_rules::{GameError, analyze};
use infiltration_types::{
    ActionLogEntry, Capability, EntryPayload, Phase, Player, PlayerId, PlayerView, Role,
    SelfView, SessionView, SuspicionReason, TaskView, VisibleDetail, VisibleEntry, VotingView, Zone,
};

use crate::session::Session;

/// What one requester is entitled to see.
#[derive(Debug, Clone, Copy)]
struct Lens {
    requester: PlayerId,
    role: Option<Role>,
    unmasked: bool,
}

impl Lens {
    fn sees(self, capability: Capability) -> bool {
        self.unmasked || self.role.is_some_and(|r| r.has(capability))
    }

    fn role_of(self, player: &Player) -> Option<Role> {
        let role = player.role?;
        (self.unmasked || player.id == self.requester || !player.alive).then_some(role)
    }

    fn zone_of(self, player: &Player) -> Option<Zone> {
        self.locates(player.id).then_some(player.zone)
    }

    /// Whether flags about `player` may place them in a zone.
    fn locates(self, player: PlayerId) -> bool {
        player == self.requester || self.sees(Capability::TrackLocations)
    }

    fn entry(self, entry: &ActionLogEntry) -> VisibleEntry {
        let tracked = entry.actor.player().is_none_or(|p| self.locates(p));
        let mut zone = entry.zone;
        let detail = match &entry.payload {
            EntryPayload::TaskComplete { task_id, forged } => {
                if !tracked {
                    zone = None;
                }
                VisibleDetail::TaskComplete {
                    task_id: tracked.then_some(*task_id),
                    forged: self.sees(Capability::AnalyzeLogs).then_some(*forged),
                }
            }
            EntryPayload::Movement { from, to } => {
                if !tracked {
                    zone = None;
                }
                VisibleDetail::Movement {
                    from: tracked.then_some(*from),
                    to: tracked.then_some(*to),
                }
            }
            EntryPayload::Sabotage { kind, caused_by } => VisibleDetail::Sabotage {
                kind: *kind,
                caused_by: self.sees(Capability::Sabotage).then_some(*caused_by),
            },
            EntryPayload::Vote { round, target } => VisibleDetail::Vote {
                round: *round,
                target: *target,
            },
            EntryPayload::Discussion { author, message } => VisibleDetail::Discussion {
                author: (self.unmasked || *author == self.requester).then_some(*author),
                message: message.clone(),
            },
            EntryPayload::EmergencyMeeting { round } => {
                VisibleDetail::EmergencyMeeting { round: *round }
            }
            EntryPayload::Elimination {
                round,
                eliminated,
                role,
            } => VisibleDetail::Elimination {
                round: *round,
                eliminated: *eliminated,
                role: *role,
            },
            EntryPayload::Notice { message } => VisibleDetail::Notice {
                message: message.clone(),
            },
        };
        VisibleEntry {
            seq: entry.seq,
            actor: entry.actor,
            kind: entry.kind,
            zone,
            recorded_at: entry.recorded_at,
            clock_secs: entry.clock_secs,
            detail,
        }
    }
}

/// Build the view `requester` is allowed to see.
///
/// # Errors
///
/// Returns [`GameError::UnknownPlayer`] if the requester is not on the
/// roster.
pub fn build(session: &Session, requester: PlayerId) -> Result<SessionView, GameError> {
    let me = session
        .player(requester)
        .ok_or(GameError::UnknownPlayer(requester))?;
    let phase = session.phase();
    let lens = Lens {
        requester,
        role: me.role,
        unmasked: phase == Phase::Complete,
    };

    let you = SelfView {
        id: me.id,
        alias: me.alias.clone(),
        role: me.role,
        capabilities: me
            .role
            .filter(|_| me.alive)
            .map(|r| r.capabilities().to_vec())
            .unwrap_or_default(),
        alive: me.alive,
        zone: me.zone,
        is_host: me.id == session.host(),
    };

    let players = session
        .roster()
        .iter()
        .map(|p| PlayerView {
            id: p.id,
            alias: p.alias.clone(),
            alive: p.alive,
            ready: p.ready,
            connected: p.connected,
            level: p.level,
            reputation: p.reputation,
            role: lens.role_of(p),
            zone: lens.zone_of(p),
            is_host: p.id == session.host(),
        })
        .collect();

    let board = session.board();
    let tasks = board
        .tasks()
        .iter()
        .map(|t| TaskView {
            id: t.id,
            zone: t.zone,
            name: t.name.clone(),
            duration_secs: t.duration_secs,
            completed: board.is_completed(t.id),
        })
        .collect();

    let living = session.living_ids();
    let voting = if phase == Phase::Voting {
        let tally = session.tally();
        tally.current_round().map(|round| VotingView {
            round,
            votes_cast: tally.votes_cast(),
            eligible_voters: u32::try_from(living.len()).unwrap_or(u32::MAX),
            your_vote: tally.ballot_of(requester),
        })
    } else {
        None
    };

    let suspicion = if phase.is_started() {
        let mut flags = analyze(session.log(), &living, session.config().suspicion);
        flags.retain(|f| {
            !matches!(f.reason, SuspicionReason::PresentAtSabotage { .. }) || lens.locates(f.player)
        });
        flags
    } else {
        Vec::new()
    };

    Ok(SessionView {
        session_id: session.id(),
        phase,
        remaining_secs: session.remaining_secs(),
        clock_secs: session.clock_secs(),
        you,
        players,
        log: session.log().entries().iter().map(|e| lens.entry(e)).collect(),
        tasks,
        progress: board.progress(),
        zone_progress: board.zone_progress(),
        tasks_to_win: session.config().tasks.tasks_to_win,
        voting,
        last_reveal: session.last_reveal().cloned(),
        suspicion,
        emergency_meetings_left: session.emergency_meetings_left(),
        sabotages_left: session.sabotages_left(),
        result: session.result().cloned(),
    })
}
