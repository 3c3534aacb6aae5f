//! Room state for Cardroom.
//!
//! Rooms are not stored centrally. Each connection holds a
//! [`RoomReplica`] per game code it has seen, and room-wide facts are
//! computed by scanning every replica that shares a game code.
//!
//! # Key types
//!
//! - [`Registry`]: connection → replicas table, aggregate counts, and the
//!   round transitions
//! - [`RoomReplica`] / [`User`]: one connection's view of a room
//! - [`RoundPhase`]: `Lobby → Starting → RoundActive → Lobby`
//! - [`RoomTally`]: members, ready, moved, voted, in-game counts

mod error;
mod phase;
mod registry;
mod replica;
mod round;

pub use error::RoomError;
pub use phase::RoundPhase;
pub use registry::{Registry, RoomTally, UserLocation};
pub use replica::{RoomReplica, User};
pub use round::Mark;
