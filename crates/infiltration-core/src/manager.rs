//! Session registry.
//!
//! [`SessionManager`] is the single entry point for external collaborators.
//! It maps session ids to sessions and serializes every operation on a
//! session through that session's mutex, so a countdown firing can never
//! interleave with a half-processed player action. Sessions share no
//! mutable state with each other; the registry lock is only held long
//! enough to clone the session handle.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use infiltration_rules::GameError;
use infiltration_types::{
    AbortReason, Phase, PlayerId, RoundId, SabotageKind, SessionId, SessionResult, SessionView,
    TaskId, Zone,
};

use crate::config::GameConfig;
use crate::session::Session;

/// Shared handle to one session.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Registry of live sessions.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: RwLock<BTreeMap<SessionId, SessionHandle>>,
}

impl SessionManager {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session in the lobby. The host must still join.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] if `config` cannot drive a
    /// session.
    pub async fn create_session(
        &self,
        host: PlayerId,
        config: GameConfig,
    ) -> Result<SessionId, GameError> {
        config.validate().map_err(|e| GameError::InvalidConfig {
            reason: e.to_string(),
        })?;
        let id = SessionId::new();
        let session = Session::new(id, host, config);
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(session)));
        info!(session = %id, %host, "session created");
        Ok(id)
    }

    /// Add a player to a lobby.
    pub async fn join_session(
        &self,
        id: SessionId,
        player: PlayerId,
        alias: &str,
    ) -> Result<(), GameError> {
        self.with_session(id, "join_session", |s| s.join(player, alias))
            .await
    }

    /// Set a lobby player's ready flag.
    pub async fn set_ready(
        &self,
        id: SessionId,
        player: PlayerId,
        ready: bool,
    ) -> Result<(), GameError> {
        self.with_session(id, "set_ready", |s| s.set_ready(player, ready))
            .await
    }

    /// Assign roles and enter the briefing.
    pub async fn start_session(&self, id: SessionId) -> Result<(), GameError> {
        self.with_session(id, "start_session", Session::start).await
    }

    /// Leave the briefing and start the first task phase.
    pub async fn begin_tasks(&self, id: SessionId) -> Result<(), GameError> {
        self.with_session(id, "begin_tasks", Session::begin_tasks)
            .await
    }

    /// Submit a task completion.
    pub async fn submit_task_completion(
        &self,
        id: SessionId,
        player: PlayerId,
        task: TaskId,
    ) -> Result<(), GameError> {
        self.with_session(id, "submit_task_completion", |s| {
            s.submit_task(player, task)
        })
        .await
    }

    /// Sabotage a zone.
    pub async fn submit_sabotage(
        &self,
        id: SessionId,
        player: PlayerId,
        zone: Zone,
        kind: SabotageKind,
    ) -> Result<(), GameError> {
        self.with_session(id, "submit_sabotage", |s| {
            s.submit_sabotage(player, zone, kind)
        })
        .await
    }

    /// Move a player to an adjacent zone.
    pub async fn move_player(
        &self,
        id: SessionId,
        player: PlayerId,
        to: Zone,
    ) -> Result<(), GameError> {
        self.with_session(id, "move_player", |s| s.move_player(player, to))
            .await
    }

    /// Call an emergency meeting. Returns the round it opened.
    pub async fn call_emergency_meeting(
        &self,
        id: SessionId,
        player: PlayerId,
    ) -> Result<RoundId, GameError> {
        self.with_session(id, "call_emergency_meeting", |s| {
            s.call_emergency_meeting(player)
        })
        .await
    }

    /// Cast or replace a ballot.
    pub async fn cast_vote(
        &self,
        id: SessionId,
        round: RoundId,
        voter: PlayerId,
        target: PlayerId,
    ) -> Result<(), GameError> {
        self.with_session(id, "cast_vote", |s| s.cast_vote(round, voter, target))
            .await
    }

    /// Post an anonymous discussion message.
    pub async fn post_discussion(
        &self,
        id: SessionId,
        player: PlayerId,
        message: &str,
    ) -> Result<(), GameError> {
        self.with_session(id, "post_discussion", |s| {
            s.post_discussion(player, message)
        })
        .await
    }

    /// The view `requester` is allowed to see.
    pub async fn get_snapshot(
        &self,
        id: SessionId,
        requester: PlayerId,
    ) -> Result<SessionView, GameError> {
        self.with_session(id, "get_snapshot", |s| s.snapshot(requester))
            .await
    }

    /// Abort a session. Idempotent once complete.
    pub async fn abort_session(&self, id: SessionId, reason: AbortReason) -> Result<(), GameError> {
        self.with_session(id, "abort_session", |s| {
            s.abort(reason);
            Ok(())
        })
        .await
    }

    /// Leave a session, or disconnect from one in progress.
    pub async fn leave_session(&self, id: SessionId, player: PlayerId) -> Result<(), GameError> {
        self.with_session(id, "leave_session", |s| s.leave(player))
            .await
    }

    /// Advance a session's clock. Returns the phase afterwards.
    pub async fn advance_clock(&self, id: SessionId, secs: u64) -> Result<Phase, GameError> {
        self.with_session(id, "advance_clock", |s| s.advance_clock(secs))
            .await
    }

    /// The final summary, once the session is complete.
    pub async fn result(&self, id: SessionId) -> Result<Option<SessionResult>, GameError> {
        self.with_session(id, "result", |s| Ok(s.result().cloned()))
            .await
    }

    /// Drop a session from the registry.
    pub async fn remove_session(&self, id: SessionId) -> Result<(), GameError> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .map(|_| info!(session = %id, "session removed"))
            .ok_or(GameError::SessionNotFound(id))
    }

    /// Every registered session id.
    pub async fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.read().await.keys().copied().collect()
    }

    /// The shared handle for one session.
    pub async fn session(&self, id: SessionId) -> Result<SessionHandle, GameError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(GameError::SessionNotFound(id))
    }

    async fn with_session<T>(
        &self,
        id: SessionId,
        action: &'static str,
        f: impl FnOnce(&mut Session) -> Result<T, GameError>,
    ) -> Result<T, GameError> {
        let handle = self.session(id).await?;
        let mut session = handle.lock().await;
        f(&mut *session).inspect_err(|err| {
            debug!(session = %id, action, error = %err, "action rejected");
        })
    }
}
