//! Unified error type for the Cardroom server.

use cardroom_collaborator::CollaboratorError;
use cardroom_protocol::ProtocolError;
use cardroom_room::RoomError;
use cardroom_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// Only bind failure is fatal to the server. Everything else surfaces
/// here so callers outside the engine (the binary, tests) can use `?`.
#[derive(Debug, thiserror::Error)]
pub enum CardroomError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame that couldn't be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A registry lookup or round transition failed.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A call to the collaborator service failed.
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}
