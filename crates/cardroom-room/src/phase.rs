//! The round state machine.

use serde::{Deserialize, Serialize};

/// The round phase of a room replica.
///
/// ```text
///          claim             commit
/// Lobby ─────────→ Starting ────────→ RoundActive
///   ↑                 │                    │
///   └──── abort ──────┘                    │
///   └─────────────── all moved ────────────┘
/// ```
///
/// - **Lobby**: players join, leave, and toggle ready.
/// - **Starting**: everyone was ready and one trigger has claimed the
///   round start; the prompt is being fetched. Ready toggles are refused.
/// - **RoundActive**: the prompt is out, players act and vote.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
pub enum RoundPhase {
    #[default]
    Lobby,
    Starting,
    RoundActive,
}

impl RoundPhase {
    /// Returns `true` once the round has been claimed or is running.
    ///
    /// This is the replica's `started` flag as far as ready toggles are
    /// concerned.
    pub fn is_started(self) -> bool {
        !matches!(self, Self::Lobby)
    }

    /// Returns `true` if moving to `target` is a valid edge.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Lobby, Self::Starting)
                | (Self::Starting, Self::RoundActive)
                | (Self::Starting, Self::Lobby)
                | (Self::RoundActive, Self::Lobby)
        )
    }
}

impl std::fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::Starting => write!(f, "Starting"),
            Self::RoundActive => write!(f, "RoundActive"),
        }
    }
}
