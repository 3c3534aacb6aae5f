//! Wire protocol for Cardroom.
//!
//! This crate defines the language that clients and the room server speak:
//!
//! - **Types** ([`SessionId`], [`GameCode`], [`UserRef`] and one struct per
//!   payload): what travels inside a frame.
//! - **Messages** ([`Envelope`], [`MessageKind`], [`Message`]): the tagged
//!   frame and the closed set of kinds it can carry.
//! - **Codec** ([`Codec`] trait, [`BincodeCodec`]): how those are turned
//!   into compact bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong while decoding.
//!
//! The protocol layer knows nothing about connections or rooms.
//!
//! ```text
//! Transport (frames) → Protocol (Message) → Room replicas
//! ```

mod codec;
mod error;
mod message;
mod types;

pub use codec::{BincodeCodec, Codec, MAX_FRAME_SIZE};
pub use error::ProtocolError;
pub use message::{Envelope, Message, MessageKind};
pub use types::{
    Action, ChatMessage, Choose, Disconnect, GameCode, GameInfo, SessionId,
    Start, Status, UpdateInfo, UserInfo, UserRef,
};
