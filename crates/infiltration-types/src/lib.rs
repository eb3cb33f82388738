//! Shared type definitions for the Infiltration session engine.
//!
//! This crate is the single source of truth for all types used across the
//! workspace. Types defined here flow downstream to `TypeScript` via `ts-rs`
//! for the presentation layer.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers and the monotonic [`RoundId`]
//! - [`enums`] -- Roles, capabilities, phases, zones, and result enums
//! - [`structs`] -- Authoritative server-side records (players, log entries, results)
//! - [`view`] -- Per-player filtered projections returned by snapshots

pub mod enums;
pub mod ids;
pub mod structs;
pub mod view;

// Re-export all public types at crate root for convenience.
pub use enums::{
    AbortReason, ActionKind, Capability, Phase, Role, SabotageKind, Severity, Side, TiePolicy,
    WinReason, Zone,
};
pub use ids::{EntryId, PlayerId, RoundId, SessionId, TaskId};
pub use structs::{
    ActionLogEntry, Actor, EliminationResult, EntryPayload, GameResult, Outcome, Player,
    PlayerResult, RevealRecord, SessionResult, SuspicionFlag, SuspicionReason, Task,
    TaskProgress, Vote,
};
pub use view::{
    PlayerView, SelfView, SessionView, TaskView, VisibleDetail, VisibleEntry, VotingView,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs writes bindings for every #[ts(export)] type it is asked to
        // export. Files land in `bindings/` relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::SessionId::export_all();
        let _ = crate::ids::PlayerId::export_all();
        let _ = crate::ids::TaskId::export_all();
        let _ = crate::ids::EntryId::export_all();
        let _ = crate::ids::RoundId::export_all();

        // Enums
        let _ = crate::enums::Side::export_all();
        let _ = crate::enums::Capability::export_all();
        let _ = crate::enums::Role::export_all();
        let _ = crate::enums::Phase::export_all();
        let _ = crate::enums::ActionKind::export_all();
        let _ = crate::enums::Zone::export_all();
        let _ = crate::enums::SabotageKind::export_all();
        let _ = crate::enums::Severity::export_all();
        let _ = crate::enums::TiePolicy::export_all();
        let _ = crate::enums::WinReason::export_all();
        let _ = crate::enums::AbortReason::export_all();

        // Structs
        let _ = crate::structs::Player::export_all();
        let _ = crate::structs::Task::export_all();
        let _ = crate::structs::TaskProgress::export_all();
        let _ = crate::structs::Actor::export_all();
        let _ = crate::structs::EntryPayload::export_all();
        let _ = crate::structs::ActionLogEntry::export_all();
        let _ = crate::structs::Vote::export_all();
        let _ = crate::structs::EliminationResult::export_all();
        let _ = crate::structs::RevealRecord::export_all();
        let _ = crate::structs::SuspicionReason::export_all();
        let _ = crate::structs::SuspicionFlag::export_all();
        let _ = crate::structs::GameResult::export_all();
        let _ = crate::structs::Outcome::export_all();
        let _ = crate::structs::PlayerResult::export_all();
        let _ = crate::structs::SessionResult::export_all();

        // Views
        let _ = crate::view::SelfView::export_all();
        let _ = crate::view::PlayerView::export_all();
        let _ = crate::view::VisibleDetail::export_all();
        let _ = crate::view::VisibleEntry::export_all();
        let _ = crate::view::TaskView::export_all();
        let _ = crate::view::VotingView::export_all();
        let _ = crate::view::SessionView::export_all();
    }
}
