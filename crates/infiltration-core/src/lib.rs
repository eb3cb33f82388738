//! Phase scheduling, session state, and the session registry for
//! Infiltration.
//!
//! This crate turns the pure rules in `infiltration-rules` into running
//! sessions: it owns the clock, the phase state machine, per-session state,
//! and the async registry external collaborators call.
//!
//! # Modules
//!
//! - [`clock`] -- Session clock and phase countdown timers.
//! - [`config`] -- Configuration loading from `infiltration-config.yaml` into
//!   strongly-typed structs.
//! - [`manager`] -- [`SessionManager`], the async registry and entry point.
//! - [`phase`] -- [`PhaseScheduler`], the session state machine.
//! - [`reveal`] -- Reveal records for resolved rounds.
//! - [`runner`] -- The tokio ticker that drives session clocks.
//! - [`session`] -- [`Session`], one game's state and operations.
//! - [`view`] -- Per-player filtered projections.
//!
//! [`SessionManager`]: manager::SessionManager
//! [`PhaseScheduler`]: phase::PhaseScheduler
//! [`Session`]: session::Session

pub mod clock;
pub mod config;
pub mod manager;
pub mod phase;
pub mod reveal;
pub mod runner;
pub mod session;
pub mod view;

pub use config::{ConfigError, GameConfig};
pub use manager::SessionManager;
pub use runner::{ClockControl, ClockExit, run_session_clock, spawn_session_clock};
pub use session::Session;
