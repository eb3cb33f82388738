//! Append-only action log.
//!
//! The log is the single record of what happened in a session. Entries are
//! appended in arrival order, numbered from 1, and never mutated or removed.
//! Ground truth (sabotage culprits, discussion authors, forged flags) is
//! stored unconditionally; hiding it is the view layer's job.

use chrono::{DateTime, Utc};

use infiltration_types::{ActionKind, ActionLogEntry, Actor, EntryId, EntryPayload, Zone};

use crate::error::GameError;

/// Longest accepted discussion message or notice, in characters.
pub const MAX_MESSAGE_CHARS: usize = 280;

/// An entry before the log has numbered and timestamped it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDraft {
    /// Public attribution.
    pub actor: Actor,
    /// Zone the action happened in.
    pub zone: Option<Zone>,
    /// Kind-specific content.
    pub payload: EntryPayload,
}

impl EntryDraft {
    /// Draft an entry attributed to the engine.
    pub const fn system(payload: EntryPayload) -> Self {
        Self {
            actor: Actor::System,
            zone: None,
            payload,
        }
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Which entries a [`LogQuery`] yields. The default matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    /// Only these kinds, when set.
    pub kinds: Option<Vec<ActionKind>>,
    /// Only entries with this public actor, when set.
    pub actor: Option<Actor>,
    /// Only entries in this zone, when set.
    pub zone: Option<Zone>,
    /// Only entries with a sequence number above this, when set.
    pub after_seq: Option<u64>,
}

impl LogFilter {
    /// Match a single kind.
    pub fn kind(mut self, kind: ActionKind) -> Self {
        self.kinds.get_or_insert_with(Vec::new).push(kind);
        self
    }

    /// Match one public actor.
    pub const fn actor(mut self, actor: Actor) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Match one zone.
    pub const fn zone(mut self, zone: Zone) -> Self {
        self.zone = Some(zone);
        self
    }

    /// Skip everything up to and including `seq`.
    pub const fn after(mut self, seq: u64) -> Self {
        self.after_seq = Some(seq);
        self
    }

    fn matches(&self, entry: &ActionLogEntry) -> bool {
        if let Some(kinds) = &self.kinds {
            if !kinds.contains(&entry.kind) {
                return false;
            }
        }
        if self.actor.is_some_and(|a| a != entry.actor) {
            return false;
        }
        if self.zone.is_some() && self.zone != entry.zone {
            return false;
        }
        self.after_seq.is_none_or(|after| entry.seq > after)
    }
}

/// Lazy, restartable iterator over log entries in append order.
///
/// Cloning a query restarts it from where the clone was taken.
#[derive(Debug, Clone)]
pub struct LogQuery<'a> {
    entries: std::slice::Iter<'a, ActionLogEntry>,
    filter: LogFilter,
}

impl<'a> Iterator for LogQuery<'a> {
    type Item = &'a ActionLogEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let filter = &self.filter;
        self.entries.find(|e| filter.matches(e))
    }
}

// ---------------------------------------------------------------------------
// ActionLog
// ---------------------------------------------------------------------------

/// The append-only action log of one session.
#[derive(Debug, Clone, Default)]
pub struct ActionLog {
    entries: Vec<ActionLogEntry>,
}

impl ActionLog {
    /// Create an empty log.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an entry stamped with the current wall-clock time.
    pub fn append(
        &mut self,
        draft: EntryDraft,
        clock_secs: u64,
    ) -> Result<&ActionLogEntry, GameError> {
        self.append_at(draft, clock_secs, Utc::now())
    }

    /// Append an entry that arrived at `now`.
    ///
    /// `recorded_at` never goes backwards: an arrival time earlier than the
    /// previous entry's is raised to it.
    pub fn append_at(
        &mut self,
        draft: EntryDraft,
        clock_secs: u64,
        now: DateTime<Utc>,
    ) -> Result<&ActionLogEntry, GameError> {
        validate(&draft)?;

        let seq = self
            .entries
            .last()
            .map_or(1, |last| last.seq.saturating_add(1));
        let recorded_at = self
            .entries
            .last()
            .map_or(now, |last| last.recorded_at.max(now));

        self.entries.push(ActionLogEntry {
            id: EntryId::new(),
            seq,
            actor: draft.actor,
            kind: draft.payload.kind(),
            zone: draft.zone,
            recorded_at,
            clock_secs,
            payload: draft.payload,
        });
        self.entries
            .last()
            .ok_or_else(|| GameError::invalid("entry vanished after append"))
    }

    /// Query entries matching `filter`.
    pub fn query(&self, filter: LogFilter) -> LogQuery<'_> {
        LogQuery {
            entries: self.entries.iter(),
            filter,
        }
    }

    /// Every entry in append order.
    pub fn entries(&self) -> &[ActionLogEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn validate(draft: &EntryDraft) -> Result<(), GameError> {
    let expected_actor_ok = match &draft.payload {
        EntryPayload::Sabotage { .. } | EntryPayload::Discussion { .. } => {
            draft.actor == Actor::Anonymous
        }
        EntryPayload::EmergencyMeeting { .. }
        | EntryPayload::Elimination { .. }
        | EntryPayload::Notice { .. } => draft.actor == Actor::System,
        EntryPayload::TaskComplete { .. }
        | EntryPayload::Movement { .. }
        | EntryPayload::Vote { .. } => draft.actor.player().is_some(),
    };
    if !expected_actor_ok {
        return Err(GameError::invalid(format!(
            "{:?} entry cannot be attributed to {:?}",
            draft.payload.kind(),
            draft.actor
        )));
    }

    match &draft.payload {
        EntryPayload::Discussion { message, .. } | EntryPayload::Notice { message } => {
            if message.trim().is_empty() {
                return Err(GameError::invalid("empty message"));
            }
            let chars = message.chars().count();
            if chars > MAX_MESSAGE_CHARS {
                return Err(GameError::invalid(format!(
                    "message is {chars} characters, limit is {MAX_MESSAGE_CHARS}"
                )));
            }
        }
        EntryPayload::Movement { from, to } if from == to => {
            return Err(GameError::invalid(format!("movement from {from:?} to itself")));
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeDelta;

    use infiltration_types::{PlayerId, RoundId, SabotageKind, TaskId};

    use super::*;

    fn movement(player: PlayerId, from: Zone, to: Zone) -> EntryDraft {
        EntryDraft {
            actor: Actor::Player(player),
            zone: Some(to),
            payload: EntryPayload::Movement { from, to },
        }
    }

    fn sabotage(culprit: PlayerId, zone: Zone, kind: SabotageKind) -> EntryDraft {
        EntryDraft {
            actor: Actor::Anonymous,
            zone: Some(zone),
            payload: EntryPayload::Sabotage {
                kind,
                caused_by: culprit,
            },
        }
    }

    #[test]
    fn append_numbers_from_one_in_order() {
        let mut log = ActionLog::new();
        let p = PlayerId::new();
        let first = log.append(movement(p, Zone::CommandTerminal, Zone::DataVault), 3).unwrap().seq;
        let second = log.append(movement(p, Zone::DataVault, Zone::CipherRoom), 9).unwrap().seq;
        assert_eq!((first, second), (1, 2));
        assert_eq!(log.len(), 2);
        assert_eq!(log.entries().first().unwrap().kind, ActionKind::Movement);
    }

    #[test]
    fn recorded_at_is_monotonic() {
        let mut log = ActionLog::new();
        let p = PlayerId::new();
        let now = Utc::now();
        log.append_at(movement(p, Zone::CommandTerminal, Zone::DataVault), 0, now).unwrap();
        let earlier = now - TimeDelta::seconds(30);
        let entry = log
            .append_at(movement(p, Zone::DataVault, Zone::CommandTerminal), 1, earlier)
            .unwrap();
        assert_eq!(entry.recorded_at, now);
    }

    #[test]
    fn sabotage_must_be_anonymous() {
        let mut log = ActionLog::new();
        let p = PlayerId::new();
        let mut draft = sabotage(p, Zone::DataVault, SabotageKind::LockVault);
        draft.actor = Actor::Player(p);
        assert!(matches!(log.append(draft, 0), Err(GameError::InvalidEntry { .. })));
        assert!(log.is_empty());
    }

    #[test]
    fn task_completion_must_name_a_player() {
        let mut log = ActionLog::new();
        let draft = EntryDraft {
            actor: Actor::Anonymous,
            zone: Some(Zone::DataVault),
            payload: EntryPayload::TaskComplete {
                task_id: TaskId::new(),
                forged: false,
            },
        };
        assert!(log.append(draft, 0).is_err());
    }

    #[test]
    fn messages_are_bounded() {
        let mut log = ActionLog::new();
        let author = PlayerId::new();
        let discussion = |message: String| EntryDraft {
            actor: Actor::Anonymous,
            zone: None,
            payload: EntryPayload::Discussion { author, message },
        };
        assert!(log.append(discussion(String::from("   ")), 0).is_err());
        assert!(log.append(discussion("x".repeat(281)), 0).is_err());
        assert!(log.append(discussion("x".repeat(280)), 0).is_ok());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn movement_to_same_zone_rejected() {
        let mut log = ActionLog::new();
        let err = log.append(movement(PlayerId::new(), Zone::CipherRoom, Zone::CipherRoom), 0);
        assert!(matches!(err, Err(GameError::InvalidEntry { .. })));
    }

    #[test]
    fn query_filters_and_restarts() {
        let mut log = ActionLog::new();
        let p = PlayerId::new();
        let q = PlayerId::new();
        log.append(movement(p, Zone::CommandTerminal, Zone::DataVault), 1).unwrap();
        log.append(sabotage(p, Zone::DataVault, SabotageKind::CorruptData), 2).unwrap();
        log.append(movement(q, Zone::CommandTerminal, Zone::WhisperNode), 3).unwrap();
        log.append(EntryDraft::system(EntryPayload::EmergencyMeeting { round: RoundId::FIRST }), 4)
            .unwrap();

        let moves = log.query(LogFilter::default().kind(ActionKind::Movement));
        let again = moves.clone();
        assert_eq!(moves.count(), 2);
        assert_eq!(again.map(|e| e.seq).collect::<Vec<_>>(), vec![1, 3]);

        let by_p = log.query(LogFilter::default().actor(Actor::Player(p)));
        assert_eq!(by_p.count(), 1);

        let vault = log.query(LogFilter::default().zone(Zone::DataVault));
        assert_eq!(vault.count(), 2);

        let tail: Vec<u64> = log.query(LogFilter::default().after(2)).map(|e| e.seq).collect();
        assert_eq!(tail, vec![3, 4]);
    }

    #[test]
    fn ground_truth_is_stored() {
        let mut log = ActionLog::new();
        let culprit = PlayerId::new();
        let entry = log
            .append(sabotage(culprit, Zone::WhisperNode, SabotageKind::JamSignals), 0)
            .unwrap();
        assert_eq!(entry.actor, Actor::Anonymous);
        assert!(matches!(
            entry.payload,
            EntryPayload::Sabotage { caused_by, .. } if caused_by == culprit
        ));
    }
}
