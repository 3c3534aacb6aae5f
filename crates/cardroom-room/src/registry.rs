//! The connection registry: every live connection and the replicas it holds.
//!
//! # Concurrency note
//!
//! `Registry` is a plain data structure with no interior locking. The
//! server keeps exactly one behind a single `tokio::sync::Mutex`; every
//! replica mutation and every aggregate count happens while that lock is
//! held, and the lock is always released before any network I/O.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use cardroom_protocol::{GameCode, SessionId, UserRef};
use cardroom_transport::{Connection, ConnectionId};

use crate::{RoomError, RoomReplica, RoundPhase, User};

struct Entry<C> {
    conn: Arc<C>,
    replicas: Vec<RoomReplica>,
}

/// Where a session was found: the owning connection, its replica, and the
/// user record itself.
pub struct UserLocation<'a, C> {
    pub connection: &'a Arc<C>,
    pub replica: &'a RoomReplica,
    pub user: &'a User,
}

/// Room-wide counts, summed over every replica with one game code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoomTally {
    /// Replicas holding the game code.
    pub replicas: usize,
    pub members: usize,
    pub ready: usize,
    /// Members that are in the current round and have acted.
    pub moved: usize,
    pub voted: usize,
    pub in_game: usize,
}

impl RoomTally {
    /// Every member is ready, and there is at least one member.
    pub fn all_ready(&self) -> bool {
        self.members > 0 && self.ready == self.members
    }

    /// Every in-round member has acted, and the round has members.
    pub fn all_moved(&self) -> bool {
        self.in_game > 0 && self.moved == self.in_game
    }
}

/// Process-wide table mapping each live connection to its room replicas.
pub struct Registry<C> {
    connections: BTreeMap<ConnectionId, Entry<C>>,
}

impl<C: Connection> Registry<C> {
    pub fn new() -> Self {
        Self {
            connections: BTreeMap::new(),
        }
    }

    /// Registers a connection with no replicas. Re-registering the same id
    /// swaps the handle and keeps the replicas.
    pub fn register(&mut self, conn: Arc<C>) -> ConnectionId {
        let id = conn.id();
        match self.connections.get_mut(&id) {
            Some(entry) => entry.conn = conn,
            None => {
                self.connections.insert(
                    id,
                    Entry {
                        conn,
                        replicas: Vec::new(),
                    },
                );
            }
        }
        tracing::debug!(conn_id = %id, "connection registered");
        id
    }

    /// Drops a connection together with all of its replicas.
    pub fn unregister(&mut self, id: ConnectionId) -> Option<Vec<RoomReplica>> {
        let entry = self.connections.remove(&id)?;
        tracing::debug!(
            conn_id = %id,
            replicas = entry.replicas.len(),
            "connection unregistered"
        );
        Some(entry.replicas)
    }

    pub fn is_registered(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// All replicas a connection holds, in creation order.
    pub fn replicas(&self, id: ConnectionId) -> Option<&[RoomReplica]> {
        self.connections.get(&id).map(|e| e.replicas.as_slice())
    }

    pub fn replica(
        &self,
        id: ConnectionId,
        code: &GameCode,
    ) -> Option<&RoomReplica> {
        self.replicas(id)?.iter().find(|r| r.game_code() == code)
    }

    /// Returns the connection's replica for `code`, creating it if needed.
    ///
    /// A new replica copies the round phase already shared by the room's
    /// other replicas, so a late joiner never sees a stale lobby.
    pub fn replica_or_insert(
        &mut self,
        id: ConnectionId,
        code: &GameCode,
    ) -> Result<&mut RoomReplica, RoomError> {
        let phase = self.room_phase(code);
        let entry = self
            .connections
            .get_mut(&id)
            .ok_or(RoomError::ConnectionNotFound(id))?;

        let idx = match entry.replicas.iter().position(|r| r.game_code() == code)
        {
            Some(idx) => idx,
            None => {
                let mut replica = RoomReplica::new(code.clone());
                if phase != RoundPhase::Lobby {
                    replica.set_phase(RoundPhase::Starting)?;
                    if phase == RoundPhase::RoundActive {
                        replica.set_phase(RoundPhase::RoundActive)?;
                    }
                }
                tracing::debug!(
                    conn_id = %id,
                    game_code = %code,
                    %phase,
                    "replica created"
                );
                entry.replicas.push(replica);
                entry.replicas.len() - 1
            }
        };
        Ok(&mut entry.replicas[idx])
    }

    /// Every replica for `code`, paired with its owning connection.
    pub fn replicas_for<'a>(
        &'a self,
        code: &'a GameCode,
    ) -> impl Iterator<Item = (ConnectionId, &'a RoomReplica)> + 'a {
        self.connections.iter().flat_map(move |(id, entry)| {
            entry
                .replicas
                .iter()
                .filter(move |r| r.game_code() == code)
                .map(move |r| (*id, r))
        })
    }

    /// Runs `f` on every replica for `code`.
    pub fn for_each_replica<F>(&mut self, code: &GameCode, mut f: F)
    where
        F: FnMut(ConnectionId, &mut RoomReplica),
    {
        for (id, entry) in self.connections.iter_mut() {
            for replica in entry.replicas.iter_mut() {
                if replica.game_code() == code {
                    f(*id, replica);
                }
            }
        }
    }

    /// The phase the room's replicas share, or `Lobby` if none exist.
    pub fn room_phase(&self, code: &GameCode) -> RoundPhase {
        self.replicas_for(code)
            .map(|(_, r)| r.phase())
            .next()
            .unwrap_or_default()
    }

    /// Finds a session in any replica of any room.
    pub fn find_user(&self, session_id: &SessionId) -> Option<UserLocation<'_, C>> {
        self.connections.values().find_map(|entry| {
            entry.replicas.iter().find_map(|replica| {
                replica.user(session_id).map(|user| UserLocation {
                    connection: &entry.conn,
                    replica,
                    user,
                })
            })
        })
    }

    /// Removes a session from every replica that holds it. Returns how many
    /// entries were removed.
    pub fn remove_user(&mut self, session_id: &SessionId) -> usize {
        let mut removed = 0;
        for entry in self.connections.values_mut() {
            for replica in entry.replicas.iter_mut() {
                if replica.remove_user(session_id).is_some() {
                    removed += 1;
                }
            }
        }
        removed
    }

    /// Snapshots the connections that hold a replica for `code`.
    ///
    /// The returned handles outlive the lock, so the caller can write to
    /// them after releasing it.
    pub fn targets(
        &self,
        code: &GameCode,
        exclude: Option<ConnectionId>,
    ) -> Vec<Arc<C>> {
        self.connections
            .iter()
            .filter(|(id, _)| Some(**id) != exclude)
            .filter(|(_, e)| e.replicas.iter().any(|r| r.game_code() == code))
            .map(|(_, e)| Arc::clone(&e.conn))
            .collect()
    }

    /// Counts members and round flags across every replica for `code`.
    pub fn tally(&self, code: &GameCode) -> RoomTally {
        let mut tally = RoomTally::default();
        for (_, replica) in self.replicas_for(code) {
            tally.replicas += 1;
            for user in replica.users() {
                tally.members += 1;
                tally.ready += usize::from(user.ready);
                tally.moved += usize::from(user.in_game && user.turn);
                tally.voted += usize::from(user.voted);
                tally.in_game += usize::from(user.in_game);
            }
        }
        tally
    }

    /// Every member of the room once, in connection then join order.
    /// Copies of a session held by other replicas are skipped.
    pub fn roster(&self, code: &GameCode) -> Vec<UserRef> {
        let mut seen = BTreeSet::new();
        self.replicas_for(code)
            .flat_map(|(_, r)| r.users())
            .filter(|u| seen.insert(u.session_id.clone()))
            .map(|u| u.to_ref(code))
            .collect()
    }
}

impl<C: Connection> Default for Registry<C> {
    fn default() -> Self {
        Self::new()
    }
}
