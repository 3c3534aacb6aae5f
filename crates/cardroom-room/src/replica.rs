//! Room replicas: a connection-local view of one room.
//!
//! A replica is not authoritative. Several connections can each hold one
//! for the same game code, and room-wide questions ("is everyone ready?")
//! are answered by scanning all of them (see
//! [`Registry::tally`](crate::Registry::tally)). Replicas converge because
//! every membership event is applied locally and then rebroadcast to the
//! room, where each receiver applies it to its own copy.

use cardroom_protocol::{GameCode, SessionId, UserInfo, UserRef};

use crate::{RoomError, RoundPhase};

/// One player as seen by a replica, with their per-round flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub login: String,
    pub session_id: SessionId,
    /// Ready for the next round.
    pub ready: bool,
    /// Has acted this round.
    pub turn: bool,
    /// Has voted this round.
    pub voted: bool,
    /// Part of the round currently in play.
    pub in_game: bool,
}

impl User {
    /// A fresh lobby user with every flag cleared.
    pub fn new(login: impl Into<String>, session_id: SessionId) -> Self {
        Self {
            login: login.into(),
            session_id,
            ready: false,
            turn: false,
            voted: false,
            in_game: false,
        }
    }

    /// Builds the wire reference for this user in `game_code`.
    pub fn to_ref(&self, game_code: &GameCode) -> UserRef {
        UserRef {
            login: self.login.clone(),
            session_id: self.session_id.clone(),
            game_code: game_code.clone(),
        }
    }
}

/// A connection-local mirror of a room's roster and round phase.
#[derive(Debug, Clone)]
pub struct RoomReplica {
    game_code: GameCode,
    phase: RoundPhase,
    users: Vec<User>,
}

impl RoomReplica {
    /// An empty lobby replica.
    pub fn new(game_code: GameCode) -> Self {
        Self {
            game_code,
            phase: RoundPhase::Lobby,
            users: Vec::new(),
        }
    }

    pub fn game_code(&self) -> &GameCode {
        &self.game_code
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// The replica's `started` flag.
    pub fn is_started(&self) -> bool {
        self.phase.is_started()
    }

    /// Users in join order.
    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub(crate) fn users_mut(&mut self) -> impl Iterator<Item = &mut User> {
        self.users.iter_mut()
    }

    pub fn user(&self, session_id: &SessionId) -> Option<&User> {
        self.users.iter().find(|u| &u.session_id == session_id)
    }

    pub fn user_mut(&mut self, session_id: &SessionId) -> Option<&mut User> {
        self.users.iter_mut().find(|u| &u.session_id == session_id)
    }

    /// Appends `user` unless the session is already present, in which case
    /// only the login is refreshed. Returns `true` if the roster grew.
    pub fn add_user(&mut self, user: User) -> bool {
        if let Some(existing) = self.user_mut(&user.session_id) {
            existing.login = user.login;
            return false;
        }
        self.users.push(user);
        true
    }

    /// Removes the user with this session id, keeping the order of the rest.
    pub fn remove_user(&mut self, session_id: &SessionId) -> Option<User> {
        let idx = self
            .users
            .iter()
            .position(|u| &u.session_id == session_id)?;
        Some(self.users.remove(idx))
    }

    /// Applies a join/leave event. Events for another room are ignored.
    ///
    /// Returns `true` if the roster changed.
    pub fn apply(&mut self, event: &UserInfo) -> bool {
        if event.user.game_code != self.game_code {
            return false;
        }
        if event.connected {
            self.add_user(User::new(
                event.user.login.clone(),
                event.user.session_id.clone(),
            ))
        } else {
            self.remove_user(&event.user.session_id).is_some()
        }
    }

    /// Moves to `target`, rejecting edges the state machine doesn't have.
    pub fn set_phase(&mut self, target: RoundPhase) -> Result<(), RoomError> {
        if !self.phase.can_transition_to(target) {
            return Err(RoomError::InvalidTransition {
                code: self.game_code.clone(),
                from: self.phase,
                to: target,
            });
        }
        self.phase = target;
        Ok(())
    }

    /// Session ids in join order.
    pub fn session_ids(&self) -> impl Iterator<Item = &SessionId> {
        self.users.iter().map(|u| &u.session_id)
    }
}
