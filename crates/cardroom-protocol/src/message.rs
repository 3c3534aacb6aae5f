//! The envelope and the closed set of message kinds.
//!
//! A frame on the wire is one [`Envelope`]: a numeric tag plus an opaque
//! payload blob. The blob is decoded only after the tag has been matched
//! to a [`MessageKind`], which gives [`Message`], a sum type over every
//! kind the room protocol knows.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ tag: 3 (Status)              │
//! │ ┌──────────────────────────┐ │
//! │ │ data: Status { .. }      │ │  ← encoded with the same codec
//! │ └──────────────────────────┘ │
//! └──────────────────────────────┘
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    Action, ChatMessage, Choose, Codec, Disconnect, GameCode, GameInfo,
    ProtocolError, Start, Status, UpdateInfo, UserInfo,
};

/// The top-level frame. The tag stays a raw integer so frames from newer
/// clients still parse as envelopes and can be reported as unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub tag: u32,
    pub data: Vec<u8>,
}

/// Every message kind, with its wire tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MessageKind {
    UserInfo = 1,
    Action = 2,
    Status = 3,
    Choose = 4,
    GameInfo = 5,
    Disconnect = 6,
    ChatMessage = 7,
    Start = 8,
    DeleteCards = 9,
    UpdateInfo = 10,
}

impl MessageKind {
    /// Returns the wire tag.
    pub fn tag(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for MessageKind {
    type Error = ProtocolError;

    fn try_from(tag: u32) -> Result<Self, Self::Error> {
        Ok(match tag {
            1 => Self::UserInfo,
            2 => Self::Action,
            3 => Self::Status,
            4 => Self::Choose,
            5 => Self::GameInfo,
            6 => Self::Disconnect,
            7 => Self::ChatMessage,
            8 => Self::Start,
            9 => Self::DeleteCards,
            10 => Self::UpdateInfo,
            other => return Err(ProtocolError::UnknownTag(other)),
        })
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A fully decoded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    UserInfo(UserInfo),
    Action(Action),
    Status(Status),
    Choose(Choose),
    GameInfo(GameInfo),
    Disconnect(Disconnect),
    ChatMessage(ChatMessage),
    Start(Start),
    /// Tag only; the payload blob is empty.
    DeleteCards,
    UpdateInfo(UpdateInfo),
}

impl Message {
    /// Returns the kind (and therefore the wire tag) of this message.
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::UserInfo(_) => MessageKind::UserInfo,
            Self::Action(_) => MessageKind::Action,
            Self::Status(_) => MessageKind::Status,
            Self::Choose(_) => MessageKind::Choose,
            Self::GameInfo(_) => MessageKind::GameInfo,
            Self::Disconnect(_) => MessageKind::Disconnect,
            Self::ChatMessage(_) => MessageKind::ChatMessage,
            Self::Start(_) => MessageKind::Start,
            Self::DeleteCards => MessageKind::DeleteCards,
            Self::UpdateInfo(_) => MessageKind::UpdateInfo,
        }
    }

    /// The room this message is scoped to.
    pub fn game_code(&self) -> Option<&GameCode> {
        match self {
            Self::UserInfo(m) => Some(&m.user.game_code),
            Self::Action(m) => Some(&m.user.game_code),
            Self::Status(m) => Some(&m.user.game_code),
            Self::Choose(m) => Some(&m.user.game_code),
            Self::GameInfo(m) => Some(&m.user.game_code),
            Self::Disconnect(m) => Some(&m.user.game_code),
            Self::ChatMessage(m) => Some(&m.user.game_code),
            Self::Start(m) => Some(&m.game_code),
            Self::UpdateInfo(m) => Some(&m.user.game_code),
            Self::DeleteCards => None,
        }
    }

    /// Wraps the payload in an envelope.
    pub fn to_envelope<C: Codec>(
        &self,
        codec: &C,
    ) -> Result<Envelope, ProtocolError> {
        let data = match self {
            Self::UserInfo(m) => codec.encode(m)?,
            Self::Action(m) => codec.encode(m)?,
            Self::Status(m) => codec.encode(m)?,
            Self::Choose(m) => codec.encode(m)?,
            Self::GameInfo(m) => codec.encode(m)?,
            Self::Disconnect(m) => codec.encode(m)?,
            Self::ChatMessage(m) => codec.encode(m)?,
            Self::Start(m) => codec.encode(m)?,
            Self::DeleteCards => Vec::new(),
            Self::UpdateInfo(m) => codec.encode(m)?,
        };
        Ok(Envelope {
            tag: self.kind().tag(),
            data,
        })
    }

    /// Decodes the payload of an already-decoded envelope.
    ///
    /// # Errors
    /// `UnknownTag` if the tag names no kind, `Decode` if the blob doesn't
    /// match the kind's payload.
    pub fn from_envelope<C: Codec>(
        codec: &C,
        envelope: &Envelope,
    ) -> Result<Self, ProtocolError> {
        let data = envelope.data.as_slice();
        Ok(match MessageKind::try_from(envelope.tag)? {
            MessageKind::UserInfo => Self::UserInfo(codec.decode(data)?),
            MessageKind::Action => Self::Action(codec.decode(data)?),
            MessageKind::Status => Self::Status(codec.decode(data)?),
            MessageKind::Choose => Self::Choose(codec.decode(data)?),
            MessageKind::GameInfo => Self::GameInfo(codec.decode(data)?),
            MessageKind::Disconnect => Self::Disconnect(codec.decode(data)?),
            MessageKind::ChatMessage => {
                Self::ChatMessage(codec.decode(data)?)
            }
            MessageKind::Start => Self::Start(codec.decode(data)?),
            MessageKind::DeleteCards => {
                if !data.is_empty() {
                    return Err(ProtocolError::InvalidMessage(
                        "DeleteCards carries no payload".into(),
                    ));
                }
                Self::DeleteCards
            }
            MessageKind::UpdateInfo => Self::UpdateInfo(codec.decode(data)?),
        })
    }

    /// Encodes envelope and payload into one frame.
    pub fn encode<C: Codec>(&self, codec: &C) -> Result<Vec<u8>, ProtocolError> {
        codec.encode(&self.to_envelope(codec)?)
    }

    /// Decodes one frame into a message.
    pub fn decode<C: Codec>(codec: &C, frame: &[u8]) -> Result<Self, ProtocolError> {
        let envelope: Envelope = codec.decode(frame)?;
        Self::from_envelope(codec, &envelope)
    }
}
