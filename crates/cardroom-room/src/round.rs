//! Round transitions over the registry.
//!
//! Each method here is one step of the per-room state machine and is meant
//! to run inside a single critical section of the registry lock. The
//! two-phase round start (`claim` before the prompt fetch, `commit` or
//! `abort` after) lets the lock be released for the network call without a
//! second trigger starting the same round.

use cardroom_protocol::{GameCode, SessionId, UserRef};
use cardroom_transport::Connection;

use crate::{Registry, RoomError, RoundPhase};

/// Result of marking a once-per-round flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    /// The flag was clear and is now set.
    Recorded,
    /// The flag was already set; nothing changed.
    AlreadySet,
}

impl<C: Connection> Registry<C> {
    /// Flips the user's ready flag and returns the new value.
    ///
    /// # Errors
    /// - [`RoomError::UserNotFound`] if no replica of `code` holds the session.
    /// - [`RoomError::RoundInProgress`] outside the lobby.
    pub fn toggle_ready(
        &mut self,
        code: &GameCode,
        session_id: &SessionId,
    ) -> Result<bool, RoomError> {
        let replica = self
            .replicas_for(code)
            .map(|(_, r)| r)
            .find(|r| r.user(session_id).is_some())
            .ok_or_else(|| {
                RoomError::UserNotFound(session_id.clone(), code.clone())
            })?;
        if replica.is_started() {
            return Err(RoomError::RoundInProgress(code.clone()));
        }
        let ready = !replica.user(session_id).is_some_and(|u| u.ready);
        self.for_each_user(code, session_id, |user| user.ready = ready);
        Ok(ready)
    }

    /// Records the user's action for this round. Idempotent per round.
    pub fn record_turn(
        &mut self,
        code: &GameCode,
        session_id: &SessionId,
    ) -> Result<Mark, RoomError> {
        self.mark(code, session_id, |u| &mut u.turn)
    }

    /// Records the user's vote for this round. Idempotent per round.
    pub fn record_vote(
        &mut self,
        code: &GameCode,
        session_id: &SessionId,
    ) -> Result<Mark, RoomError> {
        self.mark(code, session_id, |u| &mut u.voted)
    }

    fn mark<F>(
        &mut self,
        code: &GameCode,
        session_id: &SessionId,
        flag: F,
    ) -> Result<Mark, RoomError>
    where
        F: Fn(&mut crate::User) -> &mut bool,
    {
        let mut copies = 0;
        let mut already = false;
        self.for_each_user(code, session_id, |user| {
            copies += 1;
            already |= *flag(user);
        });
        if copies == 0 {
            return Err(RoomError::UserNotFound(
                session_id.clone(),
                code.clone(),
            ));
        }
        if already {
            return Ok(Mark::AlreadySet);
        }
        self.for_each_user(code, session_id, |user| *flag(user) = true);
        Ok(Mark::Recorded)
    }

    /// Runs `f` on every copy of the session held by a replica of `code`.
    fn for_each_user<F>(
        &mut self,
        code: &GameCode,
        session_id: &SessionId,
        mut f: F,
    ) where
        F: FnMut(&mut crate::User),
    {
        self.for_each_replica(code, |_, replica| {
            if let Some(user) = replica.user_mut(session_id) {
                f(user);
            }
        });
    }

    /// Claims the round start if every member is ready and the room is in
    /// the lobby. Moves every replica of `code` to `Starting`.
    ///
    /// Returns `false` (and changes nothing) if the room isn't all-ready or
    /// another trigger already claimed it.
    pub fn claim_round_start(&mut self, code: &GameCode) -> bool {
        let tally = self.tally(code);
        if !tally.all_ready() || self.room_phase(code) != RoundPhase::Lobby {
            return false;
        }
        self.move_room(code, RoundPhase::Lobby, RoundPhase::Starting);
        tracing::debug!(
            game_code = %code,
            members = tally.members,
            "round start claimed"
        );
        true
    }

    /// Returns a claimed room to the lobby with ready flags intact, so the
    /// next qualifying event can try again.
    pub fn abort_round_start(&mut self, code: &GameCode) {
        self.move_room(code, RoundPhase::Starting, RoundPhase::Lobby);
    }

    /// Finishes a claimed round start in one step: every member joins the
    /// round, ready and turn flags reset, phase becomes `RoundActive`.
    ///
    /// Returns the members, or an empty list if the room wasn't claimed.
    pub fn commit_round_start(&mut self, code: &GameCode) -> Vec<UserRef> {
        if self.room_phase(code) != RoundPhase::Starting {
            return Vec::new();
        }
        self.move_room(code, RoundPhase::Starting, RoundPhase::RoundActive);
        self.for_each_replica(code, |_, replica| {
            for user in replica.users_mut() {
                user.in_game = true;
                user.ready = false;
                user.turn = false;
            }
        });
        self.roster(code)
    }

    /// Ends the round if every in-round member has acted: clears turn,
    /// vote and in-game flags and returns the room to the lobby.
    ///
    /// Returns `true` if the round ended.
    pub fn finish_round_if_all_moved(&mut self, code: &GameCode) -> bool {
        if self.room_phase(code) != RoundPhase::RoundActive
            || !self.tally(code).all_moved()
        {
            return false;
        }
        self.move_room(code, RoundPhase::RoundActive, RoundPhase::Lobby);
        self.for_each_replica(code, |_, replica| {
            for user in replica.users_mut() {
                user.turn = false;
                user.voted = false;
                user.in_game = false;
            }
        });
        true
    }

    fn move_room(&mut self, code: &GameCode, from: RoundPhase, to: RoundPhase) {
        self.for_each_replica(code, |conn_id, replica| {
            if replica.phase() != from {
                return;
            }
            if let Err(e) = replica.set_phase(to) {
                tracing::warn!(
                    %conn_id,
                    error = %e,
                    "replica phase change rejected"
                );
            }
        });
    }
}
