//! Identity types and payload structures for Cardroom's wire format.
//!
//! Every struct here travels inside an [`Envelope`](crate::Envelope)'s
//! `data` blob. Payloads that concern a player carry a [`UserRef`], the
//! `(login, session id, game code)` triple that identifies who is acting
//! and in which room.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Opaque per-user identity token issued by the persistence service.
///
/// This is the join key for every protocol payload. The server never
/// interprets it beyond equality.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Borrows the raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Human-shareable room identifier. Every broadcast is scoped to one.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GameCode(pub String);

impl GameCode {
    /// Borrows the raw code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for GameCode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for GameCode {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for GameCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who is acting, and in which room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub login: String,
    pub session_id: SessionId,
    pub game_code: GameCode,
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Join (`connected = true`) or leave (`connected = false`) a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub user: UserRef,
    pub connected: bool,
}

/// A player's turn action for the current round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub user: UserRef,
}

/// Ready toggle. Inbound the `status` is advisory; the server flips its own
/// flag and rebroadcasts the resulting value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub user: UserRef,
    pub status: bool,
}

/// A vote for a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choose {
    pub user: UserRef,
    pub chosen_id: String,
}

/// Point-to-point state handoff, delivered only to `destination_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInfo {
    pub user: UserRef,
    pub destination_id: SessionId,
}

/// Explicit exit from the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disconnect {
    pub user: UserRef,
}

/// Room chat line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub user: UserRef,
    pub text: String,
}

/// Server → clients: a round begins with this prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Start {
    pub game_code: GameCode,
    pub start: bool,
    pub text: String,
}

/// Server → clients: membership changed for `user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateInfo {
    pub user: UserRef,
}
