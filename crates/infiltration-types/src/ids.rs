//! Type-safe identifier wrappers.
//!
//! Every entity in a session has a strongly-typed ID to prevent accidental
//! mixing of identifiers at compile time. Entity IDs use UUID v7
//! (time-ordered). Voting rounds are numbered instead, because round order
//! is part of the game rules and must be monotonic per session.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a game session.
    SessionId
}

define_id! {
    /// Stable identifier for a player, supplied by the identity source.
    PlayerId
}

define_id! {
    /// Unique identifier for a task on a session's task board.
    TaskId
}

define_id! {
    /// Unique identifier for an action log entry.
    EntryId
}

/// Sequential number of a voting round within one session.
///
/// Round 1 is the first voting round. Rounds only ever move forward.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct RoundId(pub u32);

impl RoundId {
    /// The first voting round of a session.
    pub const FIRST: Self = Self(1);

    /// Return the round after this one, or `None` on overflow.
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(n) => Some(Self(n)),
            None => None,
        }
    }

    /// Return the raw round number.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for RoundId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "round {}", self.0)
    }
}
