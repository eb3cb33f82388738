//! Mission task board.
//!
//! Tracks which tasks have been genuinely completed and how many sabotages
//! have been performed. Forged completions never reach the board; they only
//! exist in the action log.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use infiltration_types::{PlayerId, SabotageKind, Task, TaskId, TaskProgress, Zone};

use crate::error::GameError;

/// A task definition from configuration. Ids are minted per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTemplate {
    /// Zone the task lives in.
    pub zone: Zone,
    /// Task name.
    pub name: String,
    /// Nominal minigame length in seconds.
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u32,
}

const fn default_duration_secs() -> u32 {
    30
}

/// A sabotage the board has absorbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SabotageRecord {
    /// Sabotaged zone.
    pub zone: Zone,
    /// What was sabotaged.
    pub kind: SabotageKind,
    /// Culprit.
    pub actor: PlayerId,
}

/// Per-session task state.
#[derive(Debug, Clone, Default)]
pub struct TaskBoard {
    tasks: Vec<Task>,
    completed: BTreeMap<TaskId, PlayerId>,
    sabotages: Vec<SabotageRecord>,
}

impl TaskBoard {
    /// Build a board from templates, minting a fresh id per task.
    pub fn new(templates: &[TaskTemplate]) -> Self {
        let tasks = templates
            .iter()
            .map(|t| Task {
                id: TaskId::new(),
                zone: t.zone,
                name: t.name.clone(),
                duration_secs: t.duration_secs,
            })
            .collect();
        Self::from_tasks(tasks)
    }

    /// Build a board from already-identified tasks.
    pub const fn from_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            completed: BTreeMap::new(),
            sabotages: Vec::new(),
        }
    }

    /// Every task, in board order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Look up one task.
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Mark a task genuinely completed by `player`.
    pub fn record_completion(
        &mut self,
        task_id: TaskId,
        player: PlayerId,
    ) -> Result<TaskProgress, GameError> {
        if self.task(task_id).is_none() {
            return Err(GameError::UnknownTask(task_id));
        }
        if self.completed.contains_key(&task_id) {
            return Err(GameError::AlreadyCompleted(task_id));
        }
        self.completed.insert(task_id, player);
        let progress = self.progress();
        debug!(%task_id, %player, completed = progress.completed, total = progress.total, "task completed");
        Ok(progress)
    }

    /// Absorb a sabotage and return the session's sabotage count.
    pub fn record_sabotage(&mut self, zone: Zone, kind: SabotageKind, actor: PlayerId) -> u32 {
        self.sabotages.push(SabotageRecord { zone, kind, actor });
        self.sabotage_count()
    }

    /// Overall progress.
    pub fn progress(&self) -> TaskProgress {
        TaskProgress {
            completed: u32::try_from(self.completed.len()).unwrap_or(u32::MAX),
            total: u32::try_from(self.tasks.len()).unwrap_or(u32::MAX),
        }
    }

    /// Progress per zone. Zones without tasks are omitted.
    pub fn zone_progress(&self) -> BTreeMap<Zone, TaskProgress> {
        let mut by_zone: BTreeMap<Zone, TaskProgress> = BTreeMap::new();
        for task in &self.tasks {
            let entry = by_zone.entry(task.zone).or_default();
            entry.total = entry.total.saturating_add(1);
            if self.completed.contains_key(&task.id) {
                entry.completed = entry.completed.saturating_add(1);
            }
        }
        by_zone
    }

    /// Whether a task has been genuinely completed.
    pub fn is_completed(&self, task_id: TaskId) -> bool {
        self.completed.contains_key(&task_id)
    }

    /// Who completed a task.
    pub fn completed_by(&self, task_id: TaskId) -> Option<PlayerId> {
        self.completed.get(&task_id).copied()
    }

    /// Number of sabotages absorbed.
    pub fn sabotage_count(&self) -> u32 {
        u32::try_from(self.sabotages.len()).unwrap_or(u32::MAX)
    }

    /// Every sabotage, oldest first.
    pub fn sabotages(&self) -> &[SabotageRecord] {
        &self.sabotages
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::zones::default_catalog;

    fn board() -> TaskBoard {
        TaskBoard::new(&default_catalog())
    }

    #[test]
    fn fresh_board_has_no_progress() {
        let board = board();
        assert_eq!(board.progress(), TaskProgress { completed: 0, total: 8 });
        assert_eq!(board.sabotage_count(), 0);
    }

    #[test]
    fn double_submission_counts_once() {
        let mut board = board();
        let task = board.tasks().first().unwrap().id;
        let player = PlayerId::new();
        assert_eq!(board.record_completion(task, player).unwrap().completed, 1);
        assert_eq!(
            board.record_completion(task, PlayerId::new()),
            Err(GameError::AlreadyCompleted(task))
        );
        assert_eq!(board.progress().completed, 1);
        assert_eq!(board.completed_by(task), Some(player));
    }

    #[test]
    fn unknown_task_rejected() {
        let mut board = board();
        let ghost = TaskId::new();
        assert_eq!(
            board.record_completion(ghost, PlayerId::new()),
            Err(GameError::UnknownTask(ghost))
        );
        assert_eq!(board.progress().completed, 0);
    }

    #[test]
    fn zone_progress_splits_by_zone() {
        let mut board = board();
        let vault_task = board
            .tasks()
            .iter()
            .find(|t| t.zone == Zone::DataVault)
            .unwrap()
            .id;
        board.record_completion(vault_task, PlayerId::new()).unwrap();
        let zones = board.zone_progress();
        assert_eq!(zones.get(&Zone::DataVault), Some(&TaskProgress { completed: 1, total: 2 }));
        assert_eq!(zones.get(&Zone::CipherRoom), Some(&TaskProgress { completed: 0, total: 2 }));
        assert!(board.is_completed(vault_task));
    }

    #[test]
    fn sabotages_always_recorded() {
        let mut board = board();
        let p = PlayerId::new();
        assert_eq!(board.record_sabotage(Zone::CipherRoom, SabotageKind::FalseDecode, p), 1);
        assert_eq!(board.record_sabotage(Zone::CipherRoom, SabotageKind::FalseDecode, p), 2);
        assert_eq!(board.sabotages().len(), 2);
        assert_eq!(board.progress().completed, 0);
    }
}
