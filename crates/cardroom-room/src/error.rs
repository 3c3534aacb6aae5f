//! Error types for the room layer.

use cardroom_protocol::{GameCode, SessionId};
use cardroom_transport::ConnectionId;

use crate::RoundPhase;

/// Errors that can occur during registry and round operations.
///
/// None of these are fatal: handlers log them and return without
/// broadcasting.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The connection is not (or no longer) registered.
    #[error("connection {0} is not registered")]
    ConnectionNotFound(ConnectionId),

    /// No replica for the game code holds this session.
    #[error("session {0} not found in room {1}")]
    UserNotFound(SessionId, GameCode),

    /// The operation is only valid in the lobby.
    #[error("room {0} has a round in progress")]
    RoundInProgress(GameCode),

    /// A phase change that the state machine doesn't allow.
    #[error("room {code}: cannot move from {from} to {to}")]
    InvalidTransition {
        code: GameCode,
        from: RoundPhase,
        to: RoundPhase,
    },
}
