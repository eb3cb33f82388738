//! Game rules for Infiltration sessions.
//!
//! This crate contains the pure rule layer: everything that decides what a
//! session action does, without clocks, locks, or I/O. It sits between
//! `infiltration-types` (the data structures) and `infiltration-core`
//! (phase scheduling and the session registry).
//!
//! # Modules
//!
//! - [`action_log`] -- Append-only action log with lazy filtered queries
//! - [`error`] -- [`GameError`], the error every session operation returns
//! - [`rewards`] -- Experience and reputation awarded at completion
//! - [`roles`] -- Ratio tables and hidden role assignment
//! - [`suspicion`] -- Behavioural heuristics over the log
//! - [`task_board`] -- Task completion and sabotage tracking
//! - [`vote_tally`] -- Voting rounds, ballots, and tie handling
//! - [`win`] -- Ordered win condition evaluation
//! - [`zones`] -- Map adjacency, sabotage points, and the default tasks

pub mod action_log;
pub mod error;
pub mod rewards;
pub mod roles;
pub mod suspicion;
pub mod task_board;
pub mod vote_tally;
pub mod win;
pub mod zones;

pub use action_log::{ActionLog, EntryDraft, LogFilter, LogQuery, MAX_MESSAGE_CHARS};
pub use error::GameError;
pub use rewards::{Reward, RewardTable};
pub use roles::{QuotaRule, RatioTable, RoleQuota, assign};
pub use suspicion::{SuspicionThresholds, analyze};
pub use task_board::{SabotageRecord, TaskBoard, TaskTemplate};
pub use vote_tally::VoteTally;
pub use win::{Verdict, WinRules, evaluate, living_sides};
