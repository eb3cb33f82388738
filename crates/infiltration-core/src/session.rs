//! Per-session game state.
//!
//! A [`Session`] owns everything one game needs: roster, scheduler, action
//! log, task board, and vote tally. All methods are synchronous and never
//! block; the manager serializes calls by holding the session's mutex for
//! the whole body of each one.
//!
//! Every mutating method validates first and mutates second, so a rejected
//! call leaves the session exactly as it was.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use infiltration_rules::zones::{is_adjacent, sabotage_zone};
use infiltration_rules::{
    ActionLog, EntryDraft, GameError, TaskBoard, Verdict, VoteTally, assign, evaluate,
};
use infiltration_types::{
    AbortReason, Actor, Capability, EliminationResult, EntryPayload, Outcome, Phase, Player,
    PlayerId, PlayerResult, RevealRecord, RoundId, SabotageKind, SessionId, SessionResult,
    SessionView, TaskId, Zone,
};

use crate::config::GameConfig;
use crate::phase::{PhaseScheduler, VotingTrigger};
use crate::reveal::build_reveal;
use crate::view;

/// Longest accepted player alias, in characters.
pub const MAX_ALIAS_CHARS: usize = 24;

/// One game, from lobby to result.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    host: PlayerId,
    config: GameConfig,
    created_at: DateTime<Utc>,
    roster: Vec<Player>,
    scheduler: PhaseScheduler,
    log: ActionLog,
    board: TaskBoard,
    tally: VoteTally,
    rounds: Vec<EliminationResult>,
    last_reveal: Option<RevealRecord>,
    verdict: Verdict,
    emergencies_called: u32,
    result: Option<SessionResult>,
    rng: StdRng,
}

impl Session {
    /// Create a session in the lobby. The host is not joined automatically.
    ///
    /// The config is assumed valid; the manager validates before calling.
    pub fn new(id: SessionId, host: PlayerId, config: GameConfig) -> Self {
        let rng = config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        let board = TaskBoard::new(&config.tasks.catalog);
        let scheduler = PhaseScheduler::new(config.timing.clone());
        Self {
            id,
            host,
            config,
            created_at: Utc::now(),
            roster: Vec::new(),
            scheduler,
            log: ActionLog::new(),
            board,
            tally: VoteTally::new(),
            rounds: Vec::new(),
            last_reveal: None,
            verdict: Verdict::Continue,
            emergencies_called: 0,
            result: None,
            rng,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Session identifier.
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// The player who created the session.
    pub const fn host(&self) -> PlayerId {
        self.host
    }

    /// Wall-clock creation time.
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Current phase.
    pub const fn phase(&self) -> Phase {
        self.scheduler.phase()
    }

    /// The latest voting round opened.
    pub const fn round(&self) -> Option<RoundId> {
        self.scheduler.round()
    }

    /// Session clock in seconds.
    pub const fn clock_secs(&self) -> u64 {
        self.scheduler.elapsed()
    }

    /// Seconds left on the current countdown.
    pub fn remaining_secs(&self) -> Option<u64> {
        self.scheduler.remaining()
    }

    /// Session configuration.
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Roster in join order.
    pub fn roster(&self) -> &[Player] {
        &self.roster
    }

    /// Look up one roster member.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.roster.iter().find(|p| p.id == id)
    }

    /// The action log.
    pub const fn log(&self) -> &ActionLog {
        &self.log
    }

    /// The task board.
    pub const fn board(&self) -> &TaskBoard {
        &self.board
    }

    /// The vote tally.
    pub const fn tally(&self) -> &VoteTally {
        &self.tally
    }

    /// Every resolved round, oldest first.
    pub fn rounds(&self) -> &[EliminationResult] {
        &self.rounds
    }

    /// The latest reveal.
    pub const fn last_reveal(&self) -> Option<&RevealRecord> {
        self.last_reveal.as_ref()
    }

    /// Final summary, once complete.
    pub const fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    /// Emergency meetings that can still be called.
    pub const fn emergency_meetings_left(&self) -> u32 {
        self.config
            .emergency
            .meetings_per_session
            .saturating_sub(self.emergencies_called)
    }

    /// Sabotages that can still be performed.
    pub fn sabotages_left(&self) -> u32 {
        self.config
            .sabotage
            .max_sabotages
            .saturating_sub(self.board.sabotage_count())
    }

    /// Living players in roster order.
    pub fn living_ids(&self) -> Vec<PlayerId> {
        self.roster
            .iter()
            .filter(|p| p.alive)
            .map(|p| p.id)
            .collect()
    }

    /// Build what `requester` may see.
    pub fn snapshot(&self, requester: PlayerId) -> Result<SessionView, GameError> {
        view::build(self, requester)
    }

    // -----------------------------------------------------------------------
    // Lobby
    // -----------------------------------------------------------------------

    /// Add a player to the lobby.
    pub fn join(&mut self, player: PlayerId, alias: &str) -> Result<(), GameError> {
        if self.phase() != Phase::Lobby {
            return Err(GameError::AlreadyStarted);
        }
        if self.player(player).is_some() {
            return Err(GameError::AlreadyJoined(player));
        }
        let capacity = self.config.lobby.max_players;
        if self.roster.len() >= usize::try_from(capacity).unwrap_or(usize::MAX) {
            return Err(GameError::SessionFull { capacity });
        }
        let alias = alias.trim();
        if alias.is_empty() || alias.chars().count() > MAX_ALIAS_CHARS {
            return Err(GameError::invalid(format!(
                "alias must be 1 to {MAX_ALIAS_CHARS} characters"
            )));
        }

        self.roster.push(Player::new(player, alias));
        info!(session = %self.id, %player, alias, roster = self.roster.len(), "player joined");
        Ok(())
    }

    /// Set a lobby player's ready flag.
    pub fn set_ready(&mut self, player: PlayerId, ready: bool) -> Result<(), GameError> {
        self.scheduler.require(Phase::Lobby, "set_ready")?;
        let p = self.player_mut(player)?;
        p.ready = ready;
        debug!(%player, ready, "ready flag set");
        Ok(())
    }

    /// Leave the session.
    ///
    /// In the lobby the player is removed, and the host leaving aborts the
    /// session. After start the player is only marked disconnected: they
    /// stay alive and keep counting for votes and win conditions. The
    /// session aborts once connected living players drop below
    /// `min_players`.
    pub fn leave(&mut self, player: PlayerId) -> Result<(), GameError> {
        match self.phase() {
            Phase::Complete => Err(GameError::wrong_phase("leave_session", Phase::Complete)),
            Phase::Lobby => {
                let index = self
                    .roster
                    .iter()
                    .position(|p| p.id == player)
                    .ok_or(GameError::UnknownPlayer(player))?;
                self.roster.remove(index);
                info!(session = %self.id, %player, "player left lobby");
                if player == self.host {
                    self.finish(Outcome::Aborted {
                        reason: AbortReason::HostLeft,
                    });
                }
                Ok(())
            }
            Phase::Briefing | Phase::Tasks | Phase::Voting | Phase::Reveal => {
                let p = self.player_mut(player)?;
                if !p.connected {
                    return Ok(());
                }
                p.connected = false;
                let alias = p.alias.clone();
                self.notice(format!("{alias} lost connection."));

                let connected = self.roster.iter().filter(|p| p.alive && p.connected).count();
                let quorum = usize::try_from(self.config.lobby.min_players).unwrap_or(usize::MAX);
                warn!(session = %self.id, %player, connected, quorum, "player disconnected");
                if connected < quorum {
                    self.finish(Outcome::Aborted {
                        reason: AbortReason::QuorumLost,
                    });
                }
                Ok(())
            }
        }
    }

    /// Lock the roster, assign roles, and enter the briefing.
    pub fn start(&mut self) -> Result<(), GameError> {
        if self.phase() != Phase::Lobby {
            return Err(GameError::AlreadyStarted);
        }
        let present = u32::try_from(self.roster.len()).unwrap_or(u32::MAX);
        let needed = self.config.lobby.min_players;
        if present < needed {
            return Err(GameError::InsufficientPlayers { needed, present });
        }
        let waiting = self.roster.iter().filter(|p| !p.ready).count();
        if waiting > 0 {
            return Err(GameError::PlayersNotReady {
                waiting: u32::try_from(waiting).unwrap_or(u32::MAX),
            });
        }

        let ids: Vec<PlayerId> = self.roster.iter().map(|p| p.id).collect();
        let roles = assign(&ids, &self.config.roles, &mut self.rng)?;
        self.scheduler.enter_briefing()?;
        for p in &mut self.roster {
            p.role = roles.get(&p.id).copied();
        }
        self.notice(String::from("Roles assigned. Read your briefing."));
        info!(session = %self.id, players = present, "session started");
        Ok(())
    }

    /// Leave the briefing and start the first task phase.
    pub fn begin_tasks(&mut self) -> Result<(), GameError> {
        self.scheduler.require(Phase::Briefing, "begin_tasks")?;
        self.scheduler.enter_tasks()?;
        self.notice(String::from("Task phase started."));
        info!(session = %self.id, "task phase started");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Task phase
    // -----------------------------------------------------------------------

    /// Submit a task completion.
    ///
    /// Players who can only fake tasks produce a forged entry that never
    /// advances the board. A genuine completion may end the game.
    pub fn submit_task(&mut self, player: PlayerId, task_id: TaskId) -> Result<(), GameError> {
        self.scheduler.require(Phase::Tasks, "submit_task_completion")?;
        let p = self.known_player(player)?;
        let role = p.role.filter(|_| p.alive);
        let genuine = role.is_some_and(|r| r.has(Capability::CompleteTasks));
        let forged = !genuine && role.is_some_and(|r| r.has(Capability::FakeTasks));
        if !genuine && !forged {
            return Err(GameError::CapabilityDenied {
                player,
                capability: Capability::CompleteTasks,
            });
        }
        let task = self.board.task(task_id).ok_or(GameError::UnknownTask(task_id))?;
        let zone = task.zone;
        if self.config.tasks.require_zone_presence && p.zone != zone {
            return Err(GameError::WrongZone {
                expected: zone,
                actual: p.zone,
            });
        }
        if self.board.is_completed(task_id) {
            return Err(GameError::AlreadyCompleted(task_id));
        }

        if genuine {
            self.board.record_completion(task_id, player)?;
        }
        self.append(EntryDraft {
            actor: Actor::Player(player),
            zone: Some(zone),
            payload: EntryPayload::TaskComplete { task_id, forged },
        })?;
        debug!(session = %self.id, %player, %task_id, forged, "task submitted");

        if genuine {
            self.settle_if_decided();
        }
        Ok(())
    }

    /// Sabotage a zone.
    pub fn submit_sabotage(
        &mut self,
        player: PlayerId,
        zone: Zone,
        kind: SabotageKind,
    ) -> Result<(), GameError> {
        self.scheduler.require(Phase::Tasks, "submit_sabotage")?;
        let p = self.capable(player, Capability::Sabotage)?;
        if sabotage_zone(kind) != zone {
            return Err(GameError::invalid(format!(
                "{kind:?} cannot be triggered in {zone:?}"
            )));
        }
        if self.config.tasks.require_zone_presence && p.zone != zone {
            return Err(GameError::WrongZone {
                expected: zone,
                actual: p.zone,
            });
        }
        let limit = self.config.sabotage.max_sabotages;
        if self.board.sabotage_count() >= limit {
            return Err(GameError::SabotageLimitReached { limit });
        }

        self.append(EntryDraft {
            actor: Actor::Anonymous,
            zone: Some(zone),
            payload: EntryPayload::Sabotage {
                kind,
                caused_by: player,
            },
        })?;
        let count = self.board.record_sabotage(zone, kind, player);
        info!(session = %self.id, ?zone, ?kind, count, "zone sabotaged");

        if self.config.sabotage.critical_sabotage_threshold.is_some() {
            self.settle_if_decided();
        }
        Ok(())
    }

    /// Move to an adjacent zone.
    pub fn move_player(&mut self, player: PlayerId, to: Zone) -> Result<(), GameError> {
        self.scheduler.require(Phase::Tasks, "move_player")?;
        let p = self.known_player(player)?;
        if !p.alive {
            return Err(GameError::invalid("eliminated players cannot move"));
        }
        let from = p.zone;
        if !is_adjacent(from, to) {
            return Err(GameError::UnreachableZone { from, to });
        }
        let now = self.clock_secs();
        let cooldown = self.config.movement.cooldown_secs;
        if let Some(since) = p.last_moved_at.map(|t| now.saturating_sub(t)) {
            if since < cooldown {
                return Err(GameError::MovementCooldown {
                    remaining_secs: cooldown.saturating_sub(since),
                });
            }
        }

        self.append(EntryDraft {
            actor: Actor::Player(player),
            zone: Some(to),
            payload: EntryPayload::Movement { from, to },
        })?;
        let p = self.player_mut(player)?;
        p.zone = to;
        p.last_moved_at = Some(now);
        debug!(%player, ?from, ?to, "player moved");
        Ok(())
    }

    /// Interrupt the task phase and open a voting round.
    pub fn call_emergency_meeting(&mut self, player: PlayerId) -> Result<RoundId, GameError> {
        self.scheduler.require(Phase::Tasks, "call_emergency_meeting")?;
        self.capable(player, Capability::CallEmergencyMeeting)?;
        let limit = self.config.emergency.meetings_per_session;
        if self.emergencies_called >= limit {
            return Err(GameError::EmergencyLimitReached { limit });
        }

        let round = self.open_voting(VotingTrigger::Emergency)?;
        self.emergencies_called = self.emergencies_called.saturating_add(1);
        info!(session = %self.id, %player, %round, "emergency meeting called");
        Ok(round)
    }

    // -----------------------------------------------------------------------
    // Voting phase
    // -----------------------------------------------------------------------

    /// Cast or replace a ballot in the open round.
    pub fn cast_vote(
        &mut self,
        round: RoundId,
        voter: PlayerId,
        target: PlayerId,
    ) -> Result<(), GameError> {
        self.scheduler.require(Phase::Voting, "cast_vote")?;
        self.capable(voter, Capability::Vote)?;
        let living: BTreeSet<PlayerId> = self.living_ids().into_iter().collect();
        self.tally.cast_vote(
            round,
            voter,
            target,
            &living,
            self.config.voting.allow_self_vote,
        )?;
        self.append(EntryDraft {
            actor: Actor::Player(voter),
            zone: None,
            payload: EntryPayload::Vote { round, target },
        })?;
        debug!(%round, %voter, %target, "vote cast");

        let cast = usize::try_from(self.tally.votes_cast()).unwrap_or(usize::MAX);
        if self.config.voting.end_voting_when_all_cast && cast >= living.len() {
            debug!(%round, "every living player voted, resolving early");
            self.resolve_round()?;
        }
        Ok(())
    }

    /// Post an anonymous message to the meeting.
    pub fn post_discussion(&mut self, player: PlayerId, message: &str) -> Result<(), GameError> {
        self.scheduler.require(Phase::Voting, "post_discussion")?;
        self.capable(player, Capability::Vote)?;
        self.append(EntryDraft {
            actor: Actor::Anonymous,
            zone: None,
            payload: EntryPayload::Discussion {
                author: player,
                message: message.to_owned(),
            },
        })?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Clock
    // -----------------------------------------------------------------------

    /// Advance the session clock one second at a time, firing every
    /// countdown that expires on the way. Returns the resulting phase.
    pub fn advance_clock(&mut self, secs: u64) -> Result<Phase, GameError> {
        for _ in 0..secs {
            if self.phase().is_terminal() {
                break;
            }
            if let Some(fired) = self.scheduler.tick()? {
                self.on_countdown(fired)?;
            }
        }
        Ok(self.phase())
    }

    /// Abort the session. Idempotent once complete.
    pub fn abort(&mut self, reason: AbortReason) {
        if self.phase().is_terminal() {
            return;
        }
        self.finish(Outcome::Aborted { reason });
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    fn on_countdown(&mut self, fired: Phase) -> Result<(), GameError> {
        match fired {
            Phase::Tasks => {
                let round = self.open_voting(VotingTrigger::Timeout)?;
                info!(session = %self.id, %round, "task countdown low, voting called");
            }
            Phase::Voting => self.resolve_round()?,
            Phase::Reveal => match self.verdict {
                Verdict::Ended(result) => self.finish(Outcome::Victory { result }),
                Verdict::Continue => {
                    self.scheduler.enter_tasks()?;
                    self.notice(String::from("Task phase resumed."));
                }
            },
            Phase::Lobby | Phase::Briefing | Phase::Complete => {}
        }
        Ok(())
    }

    fn open_voting(&mut self, trigger: VotingTrigger) -> Result<RoundId, GameError> {
        let round = self.scheduler.enter_voting(trigger)?;
        self.tally.open_round(round)?;
        match trigger {
            VotingTrigger::Emergency => {
                self.append(EntryDraft::system(EntryPayload::EmergencyMeeting { round }))?;
            }
            VotingTrigger::Timeout => {
                self.notice(format!("Time is running low. Voting for {round} is open."));
            }
        }
        Ok(round)
    }

    fn resolve_round(&mut self) -> Result<(), GameError> {
        let round = self.scheduler.round().ok_or_else(|| GameError::PhaseMismatch {
            action: "resolve",
            context: String::from("no round was opened"),
        })?;
        let result = self
            .tally
            .resolve(round, self.config.voting.tie_policy, &mut self.rng)?;

        let mut role = None;
        if let Some(id) = result.eliminated {
            if let Some(p) = self.roster.iter_mut().find(|p| p.id == id) {
                p.alive = false;
                role = p.role;
            }
        }
        let reveal = build_reveal(&result, &self.roster);
        self.append(EntryDraft::system(EntryPayload::Elimination {
            round,
            eliminated: result.eliminated,
            role,
        }))?;
        self.scheduler.enter_reveal()?;

        self.verdict = evaluate(
            &self.roster,
            self.board.progress(),
            self.board.sabotage_count(),
            self.config.win_rules(),
        );
        info!(
            session = %self.id,
            %round,
            eliminated = ?result.eliminated,
            ?role,
            tied = reveal.tied,
            decided = self.verdict.is_terminal(),
            "round resolved"
        );
        self.rounds.push(result);
        self.last_reveal = Some(reveal);
        Ok(())
    }

    fn settle_if_decided(&mut self) {
        let verdict = evaluate(
            &self.roster,
            self.board.progress(),
            self.board.sabotage_count(),
            self.config.win_rules(),
        );
        if let Verdict::Ended(result) = verdict {
            self.verdict = verdict;
            self.finish(Outcome::Victory { result });
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        if !self.scheduler.complete() {
            return;
        }
        let winner = outcome.winner();
        let rewards = self.config.rewards;
        let players: Vec<PlayerResult> = self
            .roster
            .iter_mut()
            .map(|p| {
                let reward = rewards.reward_for(p.role, &outcome);
                p.reputation = p.reputation.saturating_add(reward.reputation);
                PlayerResult {
                    player: p.id,
                    alias: p.alias.clone(),
                    role: p.role,
                    alive: p.alive,
                    won: p.role.zip(winner).is_some_and(|(r, w)| r.wins(w)),
                    xp_gained: reward.xp,
                    reputation_gained: reward.reputation,
                }
            })
            .collect();

        let message = match &outcome {
            Outcome::Victory { result } => {
                format!("Session complete: {:?} side wins ({:?}).", result.winner, result.reason)
            }
            Outcome::Aborted { reason } => format!("Session aborted: {reason:?}."),
        };
        self.notice(message);
        info!(session = %self.id, ?outcome, clock = self.clock_secs(), "session complete");

        self.result = Some(SessionResult {
            session_id: self.id,
            outcome,
            rounds: self.rounds.clone(),
            tasks: self.board.progress(),
            sabotages: self.board.sabotage_count(),
            players,
            duration_secs: self.clock_secs(),
            ended_at: Utc::now(),
        });
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn known_player(&self, id: PlayerId) -> Result<&Player, GameError> {
        self.player(id).ok_or(GameError::UnknownPlayer(id))
    }

    fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player, GameError> {
        self.roster
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(GameError::UnknownPlayer(id))
    }

    /// A living roster member whose role carries `capability`.
    fn capable(&self, id: PlayerId, capability: Capability) -> Result<&Player, GameError> {
        let p = self.known_player(id)?;
        if p.alive && p.role.is_some_and(|r| r.has(capability)) {
            Ok(p)
        } else {
            Err(GameError::CapabilityDenied {
                player: id,
                capability,
            })
        }
    }

    fn append(&mut self, draft: EntryDraft) -> Result<u64, GameError> {
        let clock = self.scheduler.elapsed();
        self.log.append(draft, clock).map(|entry| entry.seq)
    }

    fn notice(&mut self, message: String) {
        let clock = self.scheduler.elapsed();
        let draft = EntryDraft::system(EntryPayload::Notice { message });
        if let Err(err) = self.log.append(draft, clock) {
            warn!(session = %self.id, error = %err, "notice rejected by action log");
        }
    }
}
