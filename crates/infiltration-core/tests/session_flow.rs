//! Full-session scenarios driven through [`Session`] directly.
//!
//! Roles are drawn at random, so every test looks players up by the role
//! they were dealt rather than by join order.

#![allow(clippy::unwrap_used)]

use infiltration_core::{GameConfig, Session};
use infiltration_rules::{GameError, Verdict, evaluate};
use infiltration_types::{
    AbortReason, ActionKind, Outcome, Phase, PlayerId, Role, RoundId, SabotageKind, SessionId,
    Side, SuspicionReason, TaskId, TiePolicy, VisibleDetail, WinReason, Zone,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn config(seed: u64) -> GameConfig {
    GameConfig {
        seed: Some(seed),
        ..GameConfig::default()
    }
}

fn lobby(players: usize, config: GameConfig) -> (Session, Vec<PlayerId>) {
    let ids: Vec<PlayerId> = (0..players).map(|_| PlayerId::new()).collect();
    let host = ids.first().copied().unwrap();
    let mut session = Session::new(SessionId::new(), host, config);
    for (i, id) in ids.iter().enumerate() {
        session.join(*id, &format!("AGENT_{i}")).unwrap();
        session.set_ready(*id, true).unwrap();
    }
    (session, ids)
}

fn in_tasks(players: usize, config: GameConfig) -> Session {
    let (mut session, _) = lobby(players, config);
    session.start().unwrap();
    session.begin_tasks().unwrap();
    session
}

fn holding(session: &Session, role: Role) -> Vec<PlayerId> {
    session
        .roster()
        .iter()
        .filter(|p| p.role == Some(role))
        .map(|p| p.id)
        .collect()
}

fn saboteurs(session: &Session) -> Vec<PlayerId> {
    holding(session, Role::Saboteur)
}

fn loyal_side(session: &Session) -> Vec<PlayerId> {
    session
        .roster()
        .iter()
        .filter(|p| p.role.is_some_and(|r| r.side() == Side::Loyal))
        .map(|p| p.id)
        .collect()
}

fn tasks_in(session: &Session, zone: Zone) -> Vec<TaskId> {
    session
        .board()
        .tasks()
        .iter()
        .filter(|t| t.zone == zone)
        .map(|t| t.id)
        .collect()
}

fn verdict(session: &Session) -> Verdict {
    evaluate(
        session.roster(),
        session.board().progress(),
        session.board().sabotage_count(),
        session.config().win_rules(),
    )
}

/// Open an emergency round, have `voters` vote for `target`, and play the
/// countdown out to the reveal.
fn vote_out(session: &mut Session, caller: PlayerId, voters: &[PlayerId], target: PlayerId) {
    let round = session.call_emergency_meeting(caller).unwrap();
    for voter in voters {
        session.cast_vote(round, *voter, target).unwrap();
    }
    let secs = session.config().timing.emergency_voting_secs;
    assert_eq!(session.advance_clock(secs).unwrap(), Phase::Reveal);
}

fn finish_reveal(session: &mut Session) -> Phase {
    let secs = session.config().timing.reveal_secs;
    session.advance_clock(secs).unwrap()
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn eight_player_game_ends_when_every_saboteur_is_voted_out() {
    let mut cfg = config(11);
    cfg.tasks.require_zone_presence = false;
    let mut s = in_tasks(8, cfg);

    assert_eq!(holding(&s, Role::Loyal).len(), 4);
    assert_eq!(holding(&s, Role::Analyst).len(), 1);
    assert_eq!(holding(&s, Role::Protector).len(), 1);
    let sabs = saboteurs(&s);
    let loyal = loyal_side(&s);
    assert_eq!(sabs.len(), 2);

    let worker = loyal.first().copied().unwrap();
    let all_tasks: Vec<TaskId> = s.board().tasks().iter().map(|t| t.id).collect();
    for task in all_tasks.iter().take(3) {
        s.submit_task(worker, *task).unwrap();
    }
    assert_eq!(s.board().progress().completed, 3);
    assert_eq!(s.board().progress().total, 8);

    let first = sabs.first().copied().unwrap();
    let voters = loyal.get(..5).unwrap();
    vote_out(&mut s, worker, voters, first);

    let reveal = s.last_reveal().cloned().unwrap();
    assert_eq!(reveal.round, RoundId::FIRST);
    assert_eq!(reveal.eliminated, Some(first));
    assert_eq!(reveal.role, Some(Role::Saboteur));
    assert_eq!(reveal.vote_counts.get(&first), Some(&5));
    assert_eq!(reveal.saboteurs_remaining, 1);
    assert_eq!(verdict(&s), Verdict::Continue);
    assert_eq!(finish_reveal(&mut s), Phase::Tasks);

    let second = sabs.get(1).copied().unwrap();
    vote_out(&mut s, worker, voters, second);
    assert_eq!(s.round(), Some(RoundId(2)));
    assert_eq!(finish_reveal(&mut s), Phase::Complete);

    let result = s.result().cloned().unwrap();
    assert_eq!(
        result.outcome.winner(),
        Some(Side::Loyal),
        "unexpected outcome {:?}",
        result.outcome
    );
    assert!(matches!(
        result.outcome,
        Outcome::Victory { result } if result.reason == WinReason::AllSaboteursEliminated
    ));
    assert_eq!(result.rounds.len(), 2);
    assert_eq!(result.tasks.completed, 3);
    for line in &result.players {
        let loyal_player = loyal.contains(&line.player);
        assert_eq!(line.won, loyal_player);
        assert!(line.xp_gained > 0);
    }
}

#[test]
fn tied_round_follows_policy_regardless_of_vote_order() {
    for seed in [1_u64, 2, 3] {
        for reversed in [false, true] {
            let (mut s, ids) = lobby(4, config(seed));
            s.start().unwrap();
            s.begin_tasks().unwrap();
            let [a, b, c, d] = <[PlayerId; 4]>::try_from(ids).unwrap();

            let caller = loyal_side(&s).first().copied().unwrap();
            let round = s.call_emergency_meeting(caller).unwrap();
            let mut ballots = vec![(b, a), (c, a), (a, b), (d, b)];
            if reversed {
                ballots.reverse();
            }
            for (voter, target) in ballots {
                s.cast_vote(round, voter, target).unwrap();
            }
            assert_eq!(s.advance_clock(90).unwrap(), Phase::Reveal);

            let resolved = s.rounds().first().cloned().unwrap();
            assert_eq!(resolved.eliminated, None);
            let mut expected = vec![a, b];
            expected.sort();
            assert_eq!(resolved.tied, expected);
            assert!(s.last_reveal().unwrap().tied);
            assert!(s.roster().iter().all(|p| p.alive));
            assert_eq!(finish_reveal(&mut s), Phase::Tasks);
        }
    }
}

#[test]
fn random_tie_policy_removes_one_of_the_tied() {
    let mut cfg = config(5);
    cfg.voting.tie_policy = TiePolicy::RandomAmongTied;
    let (mut s, ids) = lobby(4, cfg);
    s.start().unwrap();
    s.begin_tasks().unwrap();
    let [a, b, c, d] = <[PlayerId; 4]>::try_from(ids).unwrap();

    let caller = loyal_side(&s).first().copied().unwrap();
    let round = s.call_emergency_meeting(caller).unwrap();
    for (voter, target) in [(b, a), (c, a), (a, b), (d, b)] {
        s.cast_vote(round, voter, target).unwrap();
    }
    s.advance_clock(90).unwrap();

    let eliminated = s.rounds().first().and_then(|r| r.eliminated).unwrap();
    assert!(eliminated == a || eliminated == b);
    assert!(!s.player(eliminated).unwrap().alive);
}

#[test]
fn saboteurs_win_on_parity() {
    let mut s = in_tasks(4, config(9));
    let sab = saboteurs(&s).first().copied().unwrap();
    let loyal = loyal_side(&s);
    assert_eq!(loyal.len(), 3);
    let [x, y, z] = <[PlayerId; 3]>::try_from(loyal).unwrap();

    vote_out(&mut s, x, &[sab, y, z], x);
    assert_eq!(finish_reveal(&mut s), Phase::Tasks);

    vote_out(&mut s, y, &[sab, z], y);
    assert_eq!(finish_reveal(&mut s), Phase::Complete);

    let outcome = s.result().map(|r| r.outcome.clone()).unwrap();
    assert!(matches!(
        outcome,
        Outcome::Victory { result } if result.winner == Side::Saboteur
            && result.reason == WinReason::SaboteurParity
    ));
}

#[test]
fn finishing_enough_tasks_wins_immediately() {
    let mut cfg = config(3);
    cfg.tasks.tasks_to_win = 2;
    let mut s = in_tasks(4, cfg);
    let worker = loyal_side(&s).first().copied().unwrap();
    let here = tasks_in(&s, Zone::CommandTerminal);
    assert_eq!(here.len(), 2);

    for task in &here {
        s.submit_task(worker, *task).unwrap();
    }
    assert_eq!(s.phase(), Phase::Complete);
    let outcome = s.result().map(|r| r.outcome.clone()).unwrap();
    assert!(matches!(
        outcome,
        Outcome::Victory { result } if result.reason == WinReason::TasksCompleted
    ));
}

#[test]
fn critical_sabotage_wins_for_saboteurs() {
    let mut cfg = config(4);
    cfg.sabotage.critical_sabotage_threshold = Some(2);
    let mut s = in_tasks(4, cfg);
    let sab = saboteurs(&s).first().copied().unwrap();

    s.submit_sabotage(sab, Zone::CommandTerminal, SabotageKind::DisableAuth)
        .unwrap();
    assert_eq!(s.phase(), Phase::Tasks);
    s.submit_sabotage(sab, Zone::CommandTerminal, SabotageKind::CorruptLogs)
        .unwrap();
    assert_eq!(s.phase(), Phase::Complete);
    assert_eq!(s.result().unwrap().sabotages, 2);
}

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

#[test]
fn phase_mismatch_leaves_state_untouched() {
    let mut s = in_tasks(4, config(6));
    let worker = loyal_side(&s).first().copied().unwrap();
    let other = loyal_side(&s).get(1).copied().unwrap();
    let task = tasks_in(&s, Zone::CommandTerminal).first().copied().unwrap();
    s.submit_task(worker, task).unwrap();

    let log_len = s.log().len();
    let progress = s.board().progress();
    let err = s.cast_vote(RoundId::FIRST, worker, other).unwrap_err();
    assert!(matches!(err, GameError::PhaseMismatch { .. }));
    assert_eq!(s.log().len(), log_len);
    assert_eq!(s.board().progress(), progress);
    assert_eq!(s.tally().votes_cast(), 0);

    let round = s.call_emergency_meeting(worker).unwrap();
    s.cast_vote(round, worker, other).unwrap();
    let log_len = s.log().len();
    let second = tasks_in(&s, Zone::CommandTerminal).get(1).copied().unwrap();
    let err = s.submit_task(worker, second).unwrap_err();
    assert!(matches!(err, GameError::PhaseMismatch { .. }));
    let err = s.move_player(worker, Zone::DataVault).unwrap_err();
    assert!(matches!(err, GameError::PhaseMismatch { .. }));
    assert_eq!(s.log().len(), log_len);
    assert_eq!(s.board().progress(), progress);
    assert_eq!(s.tally().votes_cast(), 1);
    assert_eq!(s.tally().ballot_of(worker), Some(other));
}

#[test]
fn double_submission_counts_once() {
    let mut s = in_tasks(4, config(8));
    let worker = loyal_side(&s).first().copied().unwrap();
    let task = tasks_in(&s, Zone::CommandTerminal).first().copied().unwrap();

    s.submit_task(worker, task).unwrap();
    assert_eq!(
        s.submit_task(worker, task),
        Err(GameError::AlreadyCompleted(task))
    );
    assert_eq!(s.board().progress().completed, 1);
    let completions = s
        .log()
        .entries()
        .iter()
        .filter(|e| e.kind == ActionKind::TaskComplete)
        .count();
    assert_eq!(completions, 1);
}

#[test]
fn tasks_need_the_right_zone() {
    let mut s = in_tasks(4, config(12));
    let worker = loyal_side(&s).first().copied().unwrap();
    let task = tasks_in(&s, Zone::DataVault).first().copied().unwrap();
    assert_eq!(
        s.submit_task(worker, task),
        Err(GameError::WrongZone {
            expected: Zone::DataVault,
            actual: Zone::CommandTerminal,
        })
    );
    s.move_player(worker, Zone::DataVault).unwrap();
    s.submit_task(worker, task).unwrap();
    assert_eq!(s.board().completed_by(task), Some(worker));
}

#[test]
fn forged_completion_never_advances_the_board() {
    let mut s = in_tasks(8, config(13));
    let sab = saboteurs(&s).first().copied().unwrap();
    let analyst = holding(&s, Role::Analyst).first().copied().unwrap();
    let loyal = holding(&s, Role::Loyal).first().copied().unwrap();
    let task = tasks_in(&s, Zone::CommandTerminal).first().copied().unwrap();

    s.submit_task(sab, task).unwrap();
    assert_eq!(s.board().progress().completed, 0);
    assert!(!s.board().is_completed(task));

    let forged_flag = |viewer: PlayerId| {
        s.snapshot(viewer)
            .unwrap()
            .log
            .into_iter()
            .find_map(|e| match e.detail {
                VisibleDetail::TaskComplete { forged, .. } => Some(forged),
                _ => None,
            })
            .unwrap()
    };
    assert_eq!(forged_flag(analyst), Some(true));
    assert_eq!(forged_flag(loyal), None);
}

#[test]
fn sabotage_rules() {
    let mut s = in_tasks(4, config(14));
    let sab = saboteurs(&s).first().copied().unwrap();
    let loyal = loyal_side(&s).first().copied().unwrap();

    assert!(matches!(
        s.submit_sabotage(loyal, Zone::CommandTerminal, SabotageKind::DisableAuth),
        Err(GameError::CapabilityDenied { .. })
    ));
    assert!(matches!(
        s.submit_sabotage(sab, Zone::CommandTerminal, SabotageKind::JamSignals),
        Err(GameError::InvalidEntry { .. })
    ));
    assert!(matches!(
        s.submit_sabotage(sab, Zone::WhisperNode, SabotageKind::JamSignals),
        Err(GameError::WrongZone { .. })
    ));

    s.submit_sabotage(sab, Zone::CommandTerminal, SabotageKind::DisableAuth)
        .unwrap();
    s.submit_sabotage(sab, Zone::CommandTerminal, SabotageKind::CorruptLogs)
        .unwrap();
    s.submit_sabotage(sab, Zone::CommandTerminal, SabotageKind::DisableAuth)
        .unwrap();
    assert_eq!(
        s.submit_sabotage(sab, Zone::CommandTerminal, SabotageKind::CorruptLogs),
        Err(GameError::SabotageLimitReached { limit: 3 })
    );
    assert_eq!(s.sabotages_left(), 0);

    let culprits = |viewer: PlayerId| -> Vec<Option<PlayerId>> {
        s.snapshot(viewer)
            .unwrap()
            .log
            .into_iter()
            .filter_map(|e| match e.detail {
                VisibleDetail::Sabotage { caused_by, .. } => Some(caused_by),
                _ => None,
            })
            .collect()
    };
    assert_eq!(culprits(sab), vec![Some(sab); 3]);
    assert_eq!(culprits(loyal), vec![None; 3]);
}

#[test]
fn emergency_meetings_are_limited() {
    let mut s = in_tasks(8, config(15));
    let caller = loyal_side(&s).first().copied().unwrap();
    let sab = saboteurs(&s).first().copied().unwrap();

    assert!(matches!(
        s.call_emergency_meeting(sab),
        Err(GameError::CapabilityDenied { .. })
    ));
    for expected in [RoundId(1), RoundId(2)] {
        assert_eq!(s.call_emergency_meeting(caller).unwrap(), expected);
        assert_eq!(s.advance_clock(90).unwrap(), Phase::Reveal);
        assert_eq!(s.rounds().last().and_then(|r| r.eliminated), None);
        assert_eq!(finish_reveal(&mut s), Phase::Tasks);
    }
    assert_eq!(s.emergency_meetings_left(), 0);
    assert_eq!(
        s.call_emergency_meeting(caller),
        Err(GameError::EmergencyLimitReached { limit: 2 })
    );
}

#[test]
fn voting_rejections() {
    let mut s = in_tasks(4, config(16));
    let loyal = loyal_side(&s);
    let a = loyal.first().copied().unwrap();
    let b = loyal.get(1).copied().unwrap();
    let round = s.call_emergency_meeting(a).unwrap();

    assert_eq!(
        s.cast_vote(round, a, a),
        Err(GameError::SelfVoteNotAllowed(a))
    );
    let stranger = PlayerId::new();
    assert_eq!(
        s.cast_vote(round, a, stranger),
        Err(GameError::UnknownTarget(stranger))
    );
    assert!(matches!(
        s.cast_vote(RoundId(7), a, b),
        Err(GameError::PhaseMismatch { .. })
    ));

    s.cast_vote(round, a, b).unwrap();
    let c = loyal.get(2).copied().unwrap();
    s.cast_vote(round, a, c).unwrap();
    assert_eq!(s.tally().votes_cast(), 1);
    assert_eq!(s.tally().ballot_of(a), Some(c));
}

#[test]
fn eliminated_players_lose_their_capabilities() {
    let mut s = in_tasks(8, config(17));
    let loyal = loyal_side(&s);
    let victim = loyal.first().copied().unwrap();
    let voters: Vec<PlayerId> = loyal.iter().skip(1).copied().collect();
    vote_out(&mut s, voters.first().copied().unwrap(), &voters, victim);
    finish_reveal(&mut s);

    assert!(matches!(
        s.call_emergency_meeting(victim),
        Err(GameError::CapabilityDenied { .. })
    ));
    assert!(matches!(
        s.move_player(victim, Zone::DataVault),
        Err(GameError::InvalidEntry { .. })
    ));
    let view = s.snapshot(victim).unwrap();
    assert!(!view.you.alive);
    assert!(view.you.capabilities.is_empty());
    assert_eq!(view.you.role, s.player(victim).unwrap().role);
}

#[test]
fn all_votes_in_can_end_voting_early() {
    let mut cfg = config(18);
    cfg.voting.end_voting_when_all_cast = true;
    let (mut s, ids) = lobby(4, cfg);
    s.start().unwrap();
    s.begin_tasks().unwrap();
    let [a, b, c, d] = <[PlayerId; 4]>::try_from(ids).unwrap();
    let caller = loyal_side(&s).first().copied().unwrap();
    let round = s.call_emergency_meeting(caller).unwrap();

    for (voter, target) in [(a, d), (b, d), (c, d)] {
        s.cast_vote(round, voter, target).unwrap();
    }
    assert_eq!(s.phase(), Phase::Voting);
    s.cast_vote(round, d, a).unwrap();
    assert_eq!(s.phase(), Phase::Reveal);
    assert_eq!(s.last_reveal().unwrap().eliminated, Some(d));
}

#[test]
fn ballots_after_an_early_finish_are_rejected() {
    let mut cfg = config(18);
    cfg.voting.end_voting_when_all_cast = true;
    let (mut s, ids) = lobby(4, cfg);
    s.start().unwrap();
    s.begin_tasks().unwrap();
    let [a, b, c, d] = <[PlayerId; 4]>::try_from(ids).unwrap();
    let caller = loyal_side(&s).first().copied().unwrap();
    let round = s.call_emergency_meeting(caller).unwrap();

    for (voter, target) in [(a, d), (b, d), (c, d), (d, a)] {
        s.cast_vote(round, voter, target).unwrap();
    }
    let log_len = s.log().len();
    let counts = s.last_reveal().unwrap().vote_counts.clone();

    assert!(matches!(
        s.cast_vote(round, b, a),
        Err(GameError::PhaseMismatch { .. })
    ));
    assert!(matches!(
        s.cast_vote(round, c, a),
        Err(GameError::PhaseMismatch { .. })
    ));
    assert_eq!(s.log().len(), log_len);
    assert_eq!(s.last_reveal().unwrap().vote_counts, counts);
    assert_eq!(s.rounds().len(), 1);
    assert_eq!(s.rounds().first().unwrap().eliminated, Some(d));
}

#[test]
fn task_countdown_calls_a_vote() {
    let mut s = in_tasks(4, config(19));
    assert_eq!(s.advance_clock(179).unwrap(), Phase::Tasks);
    assert_eq!(s.advance_clock(1).unwrap(), Phase::Voting);
    assert_eq!(s.round(), Some(RoundId::FIRST));
    assert_eq!(s.remaining_secs(), Some(60));
    assert_eq!(s.advance_clock(60).unwrap(), Phase::Reveal);
    assert_eq!(s.advance_clock(5).unwrap(), Phase::Tasks);
    assert_eq!(s.remaining_secs(), Some(300));
}

// ---------------------------------------------------------------------------
// Movement
// ---------------------------------------------------------------------------

#[test]
fn movement_follows_the_map_and_cooldown() {
    let mut s = in_tasks(8, config(20));
    let mover = holding(&s, Role::Loyal).first().copied().unwrap();
    let protector = holding(&s, Role::Protector).first().copied().unwrap();
    let bystander = holding(&s, Role::Loyal).get(1).copied().unwrap();

    assert_eq!(
        s.move_player(mover, Zone::CipherRoom),
        Err(GameError::UnreachableZone {
            from: Zone::CommandTerminal,
            to: Zone::CipherRoom,
        })
    );
    s.move_player(mover, Zone::DataVault).unwrap();
    assert_eq!(
        s.move_player(mover, Zone::CipherRoom),
        Err(GameError::MovementCooldown { remaining_secs: 2 })
    );
    s.advance_clock(2).unwrap();
    s.move_player(mover, Zone::CipherRoom).unwrap();
    assert_eq!(s.player(mover).unwrap().zone, Zone::CipherRoom);

    let moves = |viewer: PlayerId| -> Vec<Option<Zone>> {
        s.snapshot(viewer)
            .unwrap()
            .log
            .into_iter()
            .filter_map(|e| match e.detail {
                VisibleDetail::Movement { to, .. } => Some(to),
                _ => None,
            })
            .collect()
    };
    let route = vec![Some(Zone::DataVault), Some(Zone::CipherRoom)];
    assert_eq!(moves(mover), route);
    assert_eq!(moves(protector), route);
    assert_eq!(moves(bystander), vec![None, None]);

    let seen = |viewer: PlayerId| {
        s.snapshot(viewer)
            .unwrap()
            .players
            .into_iter()
            .find(|p| p.id == mover)
            .and_then(|p| p.zone)
    };
    assert_eq!(seen(protector), Some(Zone::CipherRoom));
    assert_eq!(seen(bystander), None);
}

#[test]
fn task_entries_and_presence_flags_hide_zones() {
    let mut s = in_tasks(8, config(20));
    let worker = holding(&s, Role::Loyal).first().copied().unwrap();
    let bystander = holding(&s, Role::Loyal).get(1).copied().unwrap();
    let protector = holding(&s, Role::Protector).first().copied().unwrap();
    let sab = saboteurs(&s).first().copied().unwrap();
    let task = tasks_in(&s, Zone::CommandTerminal).first().copied().unwrap();

    s.submit_task(worker, task).unwrap();
    s.submit_sabotage(sab, Zone::CommandTerminal, SabotageKind::DisableAuth)
        .unwrap();

    let completion = |viewer: PlayerId| {
        s.snapshot(viewer)
            .unwrap()
            .log
            .into_iter()
            .find_map(|e| match e.detail {
                VisibleDetail::TaskComplete { task_id, .. } => Some((e.zone, task_id)),
                _ => None,
            })
            .unwrap()
    };
    assert_eq!(completion(worker), (Some(Zone::CommandTerminal), Some(task)));
    assert_eq!(completion(protector), (Some(Zone::CommandTerminal), Some(task)));
    assert_eq!(completion(bystander), (None, None));

    let placed_at_sabotage = |viewer: PlayerId| {
        s.snapshot(viewer).unwrap().suspicion.iter().any(|f| {
            f.player == worker && matches!(f.reason, SuspicionReason::PresentAtSabotage { .. })
        })
    };
    assert!(placed_at_sabotage(worker));
    assert!(placed_at_sabotage(protector));
    assert!(!placed_at_sabotage(bystander));
}

// ---------------------------------------------------------------------------
// Lobby and disconnection
// ---------------------------------------------------------------------------

#[test]
fn lobby_rules() {
    let mut cfg = config(21);
    cfg.lobby.max_players = 4;
    let (mut s, ids) = lobby(3, cfg);
    let host = ids.first().copied().unwrap();

    assert_eq!(
        s.join(host, "AGAIN"),
        Err(GameError::AlreadyJoined(host))
    );
    assert!(matches!(
        s.join(PlayerId::new(), "   "),
        Err(GameError::InvalidEntry { .. })
    ));
    let late = PlayerId::new();
    s.join(late, "LATE").unwrap();
    assert_eq!(
        s.join(PlayerId::new(), "FULL"),
        Err(GameError::SessionFull { capacity: 4 })
    );
    assert_eq!(s.start(), Err(GameError::PlayersNotReady { waiting: 1 }));
    assert_eq!(s.phase(), Phase::Lobby);

    s.leave(late).unwrap();
    s.start().unwrap();
    assert_eq!(s.phase(), Phase::Briefing);
    assert!(s.roster().iter().all(|p| p.role.is_some()));
    assert_eq!(s.start(), Err(GameError::AlreadyStarted));
    assert_eq!(s.join(PlayerId::new(), "TOO_LATE"), Err(GameError::AlreadyStarted));
}

#[test]
fn too_few_players_cannot_start() {
    let (mut s, _) = lobby(2, config(22));
    assert_eq!(
        s.start(),
        Err(GameError::InsufficientPlayers {
            needed: 3,
            present: 2,
        })
    );
    assert!(s.log().is_empty());
}

#[test]
fn host_leaving_the_lobby_aborts() {
    let (mut s, ids) = lobby(3, config(23));
    s.leave(ids.get(1).copied().unwrap()).unwrap();
    assert_eq!(s.roster().len(), 2);
    assert_eq!(s.phase(), Phase::Lobby);

    s.leave(ids.first().copied().unwrap()).unwrap();
    assert_eq!(s.phase(), Phase::Complete);
    assert_eq!(
        s.result().map(|r| r.outcome.clone()),
        Some(Outcome::Aborted {
            reason: AbortReason::HostLeft,
        })
    );
}

#[test]
fn losing_quorum_aborts_but_disconnected_players_stay_alive() {
    let mut s = in_tasks(4, config(24));
    let ids: Vec<PlayerId> = s.roster().iter().map(|p| p.id).collect();
    let first = ids.first().copied().unwrap();

    s.leave(first).unwrap();
    assert_eq!(s.phase(), Phase::Tasks);
    let gone = s.player(first).unwrap();
    assert!(gone.alive);
    assert!(!gone.connected);
    s.leave(first).unwrap();
    assert_eq!(s.phase(), Phase::Tasks);

    s.leave(ids.get(1).copied().unwrap()).unwrap();
    assert_eq!(s.phase(), Phase::Complete);
    let result = s.result().unwrap();
    assert_eq!(
        result.outcome,
        Outcome::Aborted {
            reason: AbortReason::QuorumLost,
        }
    );
    assert!(result.players.iter().all(|p| p.xp_gained == 0 && !p.won));
    assert!(matches!(
        s.leave(first),
        Err(GameError::PhaseMismatch { .. })
    ));
}

#[test]
fn abort_is_idempotent() {
    let mut s = in_tasks(4, config(25));
    s.abort(AbortReason::Requested {
        message: String::from("maintenance"),
    });
    let first = s.result().cloned().unwrap();
    s.abort(AbortReason::QuorumLost);
    assert_eq!(s.result().cloned().unwrap(), first);
    assert_eq!(s.advance_clock(500).unwrap(), Phase::Complete);
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

#[test]
fn roles_stay_hidden_until_unmasked() {
    let mut s = in_tasks(4, config(26));
    let loyal = loyal_side(&s);
    let viewer = loyal.first().copied().unwrap();

    let view = s.snapshot(viewer).unwrap();
    assert!(view.you.role.is_some());
    for p in &view.players {
        assert_eq!(p.role.is_some(), p.id == viewer);
    }
    let stranger = PlayerId::new();
    assert_eq!(
        s.snapshot(stranger).unwrap_err(),
        GameError::UnknownPlayer(stranger)
    );

    s.abort(AbortReason::QuorumLost);
    let view = s.snapshot(viewer).unwrap();
    assert!(view.players.iter().all(|p| p.role.is_some()));
    assert!(view.result.is_some());
}

#[test]
fn discussion_hides_its_author() {
    let mut s = in_tasks(4, config(27));
    let loyal = loyal_side(&s);
    let author = loyal.first().copied().unwrap();
    let reader = loyal.get(1).copied().unwrap();
    s.call_emergency_meeting(author).unwrap();
    s.post_discussion(author, "saw someone near the vault").unwrap();
    assert!(matches!(
        s.post_discussion(author, ""),
        Err(GameError::InvalidEntry { .. })
    ));

    let author_of = |viewer: PlayerId| {
        s.snapshot(viewer)
            .unwrap()
            .log
            .into_iter()
            .find_map(|e| match e.detail {
                VisibleDetail::Discussion { author, .. } => Some(author),
                _ => None,
            })
            .unwrap()
    };
    assert_eq!(author_of(author), Some(author));
    assert_eq!(author_of(reader), None);
}
