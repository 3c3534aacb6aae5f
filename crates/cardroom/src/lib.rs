//! # Cardroom
//!
//! Real-time room synchronization for small multiplayer party games.
//!
//! Players hold a duplex connection open, join a room by game code, and
//! move through rounds together: ready up, get a prompt, act, vote. The
//! server keeps a replica of each room per connection, answers room-wide
//! questions by scanning every replica under one lock, and fans each event
//! out to the room concurrently.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cardroom::prelude::*;
//!
//! # async fn run() -> Result<(), CardroomError> {
//! let server = CardroomServer::builder().bind("127.0.0.1:8765").build().await?;
//! server.run().await
//! # }
//! ```

mod broadcast;
mod config;
mod engine;
mod error;
mod handler;
mod logger;
mod round;
mod router;
mod server;

pub use broadcast::{Delivery, fan_out, send_to_one};
pub use config::{DEFAULT_BIND_ADDR, ServerConfig};
pub use engine::SyncEngine;
pub use error::CardroomError;
pub use handler::{handle_connection, handle_incoming};
pub use logger::setup_logger;
pub use server::{CardroomServer, CardroomServerBuilder};

/// Common imports for running or embedding a Cardroom server.
pub mod prelude {
    pub use crate::{
        CardroomError, CardroomServer, CardroomServerBuilder, Delivery,
        ServerConfig, SyncEngine,
    };
    pub use cardroom_collaborator::{
        Collaborator, CollaboratorConfig, CollaboratorError, HttpCollaborator,
    };
    pub use cardroom_protocol::{
        Action, BincodeCodec, ChatMessage, Choose, Codec, Disconnect,
        GameCode, GameInfo, Message, MessageKind, SessionId, Start, Status,
        UpdateInfo, UserInfo, UserRef,
    };
    pub use cardroom_room::{Registry, RoomTally, RoundPhase};
    pub use cardroom_transport::{Connection, ConnectionId, TransportError};
}
