//! Engine tests driven through `dispatch` with in-memory connections and a
//! scripted collaborator. No sockets, no HTTP.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use cardroom::prelude::*;
use cardroom::handle_connection;
use tokio::sync::{Mutex, mpsc};

const PROMPT: &str = "Name something you'd never say on a first date";

// =========================================================================
// Mock connection
// =========================================================================

/// Records every frame sent to it. Inbound frames come from a channel.
struct MockConn {
    id: ConnectionId,
    sent: StdMutex<Vec<Vec<u8>>>,
    failing: AtomicBool,
    inbox: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
}

impl MockConn {
    fn with_inbox(id: u64) -> (Arc<Self>, mpsc::UnboundedSender<Vec<u8>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = Arc::new(Self {
            id: ConnectionId::new(id),
            sent: StdMutex::new(Vec::new()),
            failing: AtomicBool::new(false),
            inbox: Mutex::new(rx),
        });
        (conn, tx)
    }

    fn new(id: u64) -> Arc<Self> {
        Self::with_inbox(id).0
    }

    fn break_pipe(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    fn received(&self) -> Vec<Message> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|f| Message::decode(&BincodeCodec, f).expect("valid frame"))
            .collect()
    }

    fn kinds(&self) -> Vec<MessageKind> {
        self.received().iter().map(Message::kind).collect()
    }

    fn count(&self, kind: MessageKind) -> usize {
        self.kinds().into_iter().filter(|k| *k == kind).count()
    }

    fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

impl Connection for MockConn {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectionClosed("peer went away".into()));
        }
        self.sent.lock().unwrap().push(data.to_vec());
        Ok(())
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        Ok(self.inbox.lock().await.recv().await)
    }

    async fn close(&self) -> Result<(), TransportError> {
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

// =========================================================================
// Mock collaborator
// =========================================================================

#[derive(Default)]
struct MockCollaborator {
    /// Upcoming prompt fetches that fail before one succeeds.
    prompt_failures: AtomicUsize,
    fetch_delay: Duration,
    fail_notifications: bool,
    fetches: AtomicUsize,
    calls: StdMutex<Vec<String>>,
}

impl MockCollaborator {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(
        &self,
        path: &'static str,
        session_id: &SessionId,
    ) -> Result<(), CollaboratorError> {
        self.calls.lock().unwrap().push(format!("{path}:{session_id}"));
        if self.fail_notifications {
            return Err(CollaboratorError::Status { path, status: 500 });
        }
        Ok(())
    }
}

impl Collaborator for MockCollaborator {
    async fn fetch_prompt_text(&self) -> Result<String, CollaboratorError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if !self.fetch_delay.is_zero() {
            tokio::time::sleep(self.fetch_delay).await;
        }
        let failing = self
            .prompt_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(CollaboratorError::Timeout { path: "/text" });
        }
        Ok(PROMPT.to_string())
    }

    async fn notify_disconnect(
        &self,
        session_id: &SessionId,
    ) -> Result<(), CollaboratorError> {
        self.record("/disconnect", session_id)
    }

    async fn delete_user(&self, session_id: &SessionId) -> Result<(), CollaboratorError> {
        self.record("/exit", session_id)
    }
}

// =========================================================================
// Harness: one connection per player, all in room "ROOM"
// =========================================================================

fn code() -> GameCode {
    GameCode::from("ROOM")
}

fn user(i: usize) -> UserRef {
    UserRef {
        login: format!("player{i}"),
        session_id: SessionId::from(format!("u{i}")),
        game_code: code(),
    }
}

fn frame(message: &Message) -> Vec<u8> {
    message.encode(&BincodeCodec).unwrap()
}

fn join(i: usize) -> Message {
    Message::UserInfo(UserInfo {
        user: user(i),
        connected: true,
    })
}

fn ready(i: usize) -> Message {
    Message::Status(Status {
        user: user(i),
        status: true,
    })
}

fn act(i: usize) -> Message {
    Message::Action(Action { user: user(i) })
}

fn vote(i: usize, card: &str) -> Message {
    Message::Choose(Choose {
        user: user(i),
        chosen_id: card.to_string(),
    })
}

fn exit(i: usize) -> Message {
    Message::Disconnect(Disconnect { user: user(i) })
}

struct Room {
    engine: Arc<SyncEngine<MockConn, MockCollaborator>>,
    conns: Vec<Arc<MockConn>>,
}

impl Room {
    /// `n` players, player `i` joined through connection `i`. Sent frames
    /// from the joins are cleared.
    async fn new(n: usize, collaborator: MockCollaborator) -> Self {
        let mut room = Self {
            engine: Arc::new(SyncEngine::new(collaborator)),
            conns: Vec::new(),
        };
        for i in 0..n {
            room.add_player(i).await;
        }
        room.clear();
        room
    }

    async fn add_player(&mut self, i: usize) {
        let conn = MockConn::new(i as u64 + 1);
        self.engine.connect(Arc::clone(&conn)).await;
        self.conns.push(conn);
        self.send(i, join(i)).await;
    }

    /// Every client replays every player's join, so each connection's
    /// replica lists the whole room. Sent frames are cleared.
    async fn converge(&self) {
        for i in 0..self.conns.len() {
            for j in 0..self.conns.len() {
                self.send(i, join(j)).await;
            }
        }
        self.clear();
    }

    async fn send(&self, i: usize, message: Message) {
        self.engine.dispatch(self.conns[i].id(), &frame(&message)).await;
    }

    async fn ready_all(&self) {
        for i in 0..self.conns.len() {
            self.send(i, ready(i)).await;
        }
    }

    async fn start_round(&self) {
        self.ready_all().await;
        assert_eq!(self.phase().await, RoundPhase::RoundActive);
        self.clear();
    }

    fn clear(&self) {
        for conn in &self.conns {
            conn.clear();
        }
    }

    /// How many connections received exactly `n` messages of `kind`.
    fn all_received(&self, kind: MessageKind, n: usize) -> bool {
        self.conns.iter().all(|c| c.count(kind) == n)
    }

    async fn tally(&self) -> RoomTally {
        self.engine.registry().lock().await.tally(&code())
    }

    async fn phase(&self) -> RoundPhase {
        self.engine.registry().lock().await.room_phase(&code())
    }

    fn collaborator(&self) -> &MockCollaborator {
        self.engine.collaborator()
    }
}

// =========================================================================
// Membership
// =========================================================================

#[tokio::test]
async fn test_join_rebroadcasts_user_info_then_update() {
    let mut room = Room::new(0, MockCollaborator::default()).await;
    room.add_player(0).await;
    room.add_player(1).await;

    use MessageKind::{UpdateInfo, UserInfo};
    assert_eq!(room.conns[0].kinds(), [UserInfo, UpdateInfo, UserInfo, UpdateInfo]);
    assert_eq!(room.conns[1].kinds(), [UserInfo, UpdateInfo]);
    assert_eq!(room.tally().await.members, 2);
}

#[tokio::test]
async fn test_replayed_joins_converge_every_replica() {
    let room = Room::new(3, MockCollaborator::default()).await;

    // Each client replays every join it knows about, in its own order.
    let orders: [[usize; 3]; 3] = [[0, 1, 2], [2, 1, 0], [1, 2, 0]];
    for (i, order) in orders.iter().enumerate() {
        for &j in order {
            room.send(i, join(j)).await;
        }
    }

    let registry = room.engine.registry().lock().await;
    let rosters: Vec<BTreeSet<SessionId>> = room
        .conns
        .iter()
        .map(|c| {
            registry
                .replica(c.id(), &code())
                .unwrap()
                .session_ids()
                .cloned()
                .collect()
        })
        .collect();
    let expected: BTreeSet<_> = (0..3).map(|i| user(i).session_id).collect();
    assert!(rosters.iter().all(|r| *r == expected));
}

#[tokio::test]
async fn test_leave_removes_user_and_deletes_record() {
    let room = Room::new(3, MockCollaborator::default()).await;
    room.send(
        1,
        Message::UserInfo(UserInfo {
            user: user(1),
            connected: false,
        }),
    )
    .await;

    assert_eq!(room.tally().await.members, 2);
    assert_eq!(room.collaborator().calls(), ["/exit:u1"]);
    assert!(room.all_received(MessageKind::UserInfo, 1));
    assert!(room.all_received(MessageKind::UpdateInfo, 1));
}

#[tokio::test]
async fn test_implicit_close_drops_replicas_without_collaborator_calls() {
    let room = Room::new(2, MockCollaborator::default()).await;
    room.engine.disconnect(room.conns[1].id()).await;

    assert_eq!(room.tally().await.members, 1);
    assert!(room.collaborator().calls().is_empty());
    assert!(!room.engine.registry().lock().await.is_registered(room.conns[1].id()));
}

// =========================================================================
// Ready / round start
// =========================================================================

#[tokio::test]
async fn test_ready_toggle_rebroadcasts_server_flag() {
    let room = Room::new(2, MockCollaborator::default()).await;
    room.send(0, ready(0)).await;
    room.send(0, ready(0)).await;

    let statuses: Vec<bool> = room.conns[1]
        .received()
        .into_iter()
        .filter_map(|m| match m {
            Message::Status(s) => Some(s.status),
            _ => None,
        })
        .collect();
    assert_eq!(statuses, [true, false]);
    assert_eq!(room.tally().await.ready, 0);
}

#[tokio::test]
async fn test_all_ready_starts_exactly_one_round() {
    let room = Room::new(3, MockCollaborator::default()).await;
    room.ready_all().await;

    assert!(room.all_received(MessageKind::Start, 1));
    assert_eq!(room.collaborator().fetches.load(Ordering::SeqCst), 1);
    assert_eq!(room.phase().await, RoundPhase::RoundActive);

    let tally = room.tally().await;
    assert_eq!((tally.ready, tally.moved, tally.in_game), (0, 0, 3));
    let registry = room.engine.registry().lock().await;
    for (_, replica) in registry.replicas_for(&code()) {
        assert!(replica.is_started());
        assert!(replica.users().iter().all(|u| !u.ready && !u.turn));
    }
}

#[tokio::test]
async fn test_start_carries_prompt_and_is_followed_by_ready_resets() {
    let room = Room::new(2, MockCollaborator::default()).await;
    room.ready_all().await;

    let received = room.conns[0].received();
    let start_at = received
        .iter()
        .position(|m| matches!(m, Message::Start(_)))
        .expect("start was broadcast");
    match &received[start_at] {
        Message::Start(start) => {
            assert!(start.start);
            assert_eq!(start.text, PROMPT);
            assert_eq!(start.game_code, code());
        }
        other => panic!("expected Start, got {other:?}"),
    }

    let resets: BTreeSet<SessionId> = received[start_at + 1..]
        .iter()
        .filter_map(|m| match m {
            Message::Status(s) if !s.status => Some(s.user.session_id.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(resets, BTreeSet::from([user(0).session_id, user(1).session_id]));
}

#[tokio::test]
async fn test_ready_toggle_ignored_during_round() {
    let room = Room::new(2, MockCollaborator::default()).await;
    room.start_round().await;

    room.send(0, ready(0)).await;
    assert!(room.all_received(MessageKind::Status, 0));
    assert_eq!(room.tally().await.ready, 0);
}

#[tokio::test]
async fn test_unknown_session_is_dropped_without_broadcast() {
    let room = Room::new(2, MockCollaborator::default()).await;
    let mut stranger = user(7);
    stranger.session_id = SessionId::from("nobody");
    room.send(
        0,
        Message::Status(Status {
            user: stranger.clone(),
            status: true,
        }),
    )
    .await;
    room.send(0, Message::Action(Action { user: stranger })).await;

    assert!(room.conns.iter().all(|c| c.received().is_empty()));
}

#[tokio::test]
async fn test_prompt_failure_aborts_then_retries() {
    let collaborator = MockCollaborator {
        prompt_failures: AtomicUsize::new(1),
        ..Default::default()
    };
    let room = Room::new(2, collaborator).await;
    room.ready_all().await;

    assert!(room.all_received(MessageKind::Start, 0));
    assert_eq!(room.phase().await, RoundPhase::Lobby);
    assert!(room.tally().await.all_ready(), "ready flags survive the abort");

    // Next qualifying event: player 1 toggles off and on again.
    room.send(1, ready(1)).await;
    room.send(1, ready(1)).await;
    assert!(room.all_received(MessageKind::Start, 1));
    assert_eq!(room.collaborator().fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_ready_starts_round_once() {
    let collaborator = MockCollaborator {
        fetch_delay: Duration::from_millis(50),
        ..Default::default()
    };
    let room = Arc::new(Room::new(6, collaborator).await);

    let tasks: Vec<_> = (0..6)
        .map(|i| {
            let room = Arc::clone(&room);
            tokio::spawn(async move { room.send(i, ready(i)).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    assert!(room.all_received(MessageKind::Start, 1));
    assert_eq!(room.collaborator().fetches.load(Ordering::SeqCst), 1);
    assert_eq!(room.tally().await.in_game, 6);
}

#[tokio::test]
async fn test_late_joiner_inherits_round_and_cannot_ready() {
    let mut room = Room::new(2, MockCollaborator::default()).await;
    room.start_round().await;
    room.add_player(2).await;

    let phase = {
        let registry = room.engine.registry().lock().await;
        registry.replica(room.conns[2].id(), &code()).unwrap().phase()
    };
    assert_eq!(phase, RoundPhase::RoundActive);

    room.clear();
    room.send(2, ready(2)).await;
    assert!(room.all_received(MessageKind::Status, 0));
    assert_eq!(room.tally().await.in_game, 2);
}

// =========================================================================
// Turns / votes
// =========================================================================

#[tokio::test]
async fn test_second_action_in_round_is_a_noop() {
    let room = Room::new(2, MockCollaborator::default()).await;
    room.start_round().await;

    room.send(0, act(0)).await;
    room.send(0, act(0)).await;

    assert!(room.all_received(MessageKind::Action, 1));
    let registry = room.engine.registry().lock().await;
    assert!(registry.find_user(&user(0).session_id).unwrap().user.turn);
}

#[tokio::test]
async fn test_all_moved_clears_round_once() {
    let room = Room::new(3, MockCollaborator::default()).await;
    room.start_round().await;

    room.send(0, act(0)).await;
    room.send(1, act(1)).await;
    assert!(room.all_received(MessageKind::DeleteCards, 0));
    room.send(2, act(2)).await;

    assert!(room.all_received(MessageKind::DeleteCards, 1));
    assert_eq!(room.phase().await, RoundPhase::Lobby);
    let tally = room.tally().await;
    assert_eq!((tally.moved, tally.voted, tally.in_game), (0, 0, 0));

    // DeleteCards follows the last action.
    assert_eq!(room.conns[0].kinds().last(), Some(&MessageKind::DeleteCards));
}

#[tokio::test]
async fn test_duplicate_vote_is_suppressed_other_votes_delivered() {
    let room = Room::new(2, MockCollaborator::default()).await;
    room.start_round().await;

    room.send(0, vote(0, "card-a")).await;
    room.send(0, vote(0, "card-b")).await;
    room.send(1, vote(1, "card-a")).await;

    let chosen: Vec<(SessionId, String)> = room.conns[1]
        .received()
        .into_iter()
        .filter_map(|m| match m {
            Message::Choose(c) => Some((c.user.session_id, c.chosen_id)),
            _ => None,
        })
        .collect();
    assert_eq!(
        chosen,
        [
            (user(0).session_id, "card-a".to_string()),
            (user(1).session_id, "card-a".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_all_voted_does_not_advance_round() {
    let room = Room::new(2, MockCollaborator::default()).await;
    room.start_round().await;
    room.send(0, vote(0, "x")).await;
    room.send(1, vote(1, "y")).await;

    assert_eq!(room.phase().await, RoundPhase::RoundActive);
    assert!(room.all_received(MessageKind::DeleteCards, 0));
}

// =========================================================================
// Disconnect
// =========================================================================

#[tokio::test]
async fn test_disconnect_notifies_then_deletes_then_broadcasts_leave() {
    let room = Room::new(3, MockCollaborator::default()).await;
    room.send(1, exit(1)).await;

    assert_eq!(room.collaborator().calls(), ["/disconnect:u1", "/exit:u1"]);
    assert_eq!(room.tally().await.members, 2);
    for conn in &room.conns {
        let leaves: Vec<_> = conn
            .received()
            .into_iter()
            .filter_map(|m| match m {
                Message::UserInfo(info) => Some(info),
                _ => None,
            })
            .collect();
        assert_eq!(leaves.len(), 1);
        assert!(!leaves[0].connected);
        assert_eq!(leaves[0].user, user(1));
    }
}

#[tokio::test]
async fn test_disconnect_cleanup_survives_collaborator_failure() {
    let collaborator = MockCollaborator {
        fail_notifications: true,
        ..Default::default()
    };
    let room = Room::new(2, collaborator).await;
    room.send(0, exit(0)).await;

    assert_eq!(room.tally().await.members, 1);
    assert!(room.all_received(MessageKind::UserInfo, 1));
}

#[tokio::test]
async fn test_disconnect_of_last_laggard_ends_round() {
    let room = Room::new(3, MockCollaborator::default()).await;
    room.start_round().await;
    room.send(0, act(0)).await;
    room.send(1, act(1)).await;

    room.send(2, exit(2)).await;

    assert!(room.all_received(MessageKind::DeleteCards, 1));
    assert_eq!(room.phase().await, RoundPhase::Lobby);
}

#[tokio::test]
async fn test_disconnect_of_last_unready_player_starts_round() {
    let room = Room::new(3, MockCollaborator::default()).await;
    room.send(0, ready(0)).await;
    room.send(1, ready(1)).await;
    assert!(room.all_received(MessageKind::Start, 0));

    room.send(2, exit(2)).await;

    assert!(room.all_received(MessageKind::Start, 1));
    assert_eq!(room.tally().await.in_game, 2);
}

// =========================================================================
// Converged rooms: every replica lists every player
// =========================================================================

fn leave(i: usize) -> Message {
    Message::UserInfo(UserInfo {
        user: user(i),
        connected: false,
    })
}

#[tokio::test]
async fn test_converged_room_starts_when_everyone_ready() {
    let room = Room::new(2, MockCollaborator::default()).await;
    room.converge().await;
    assert_eq!(room.tally().await.members, 4);

    room.ready_all().await;

    assert_eq!(room.phase().await, RoundPhase::RoundActive);
    assert!(room.all_received(MessageKind::Start, 1));
    let resets: Vec<SessionId> = room.conns[0]
        .received()
        .into_iter()
        .filter_map(|m| match m {
            Message::Status(s) if !s.status => Some(s.user.session_id),
            _ => None,
        })
        .collect();
    assert_eq!(resets, [user(0).session_id, user(1).session_id]);
}

#[tokio::test]
async fn test_converged_room_clears_round_when_everyone_acted() {
    let room = Room::new(3, MockCollaborator::default()).await;
    room.converge().await;
    room.start_round().await;

    room.send(0, act(0)).await;
    room.send(0, act(0)).await;
    room.send(1, act(1)).await;
    assert!(room.all_received(MessageKind::DeleteCards, 0));
    room.send(2, act(2)).await;

    assert!(room.all_received(MessageKind::Action, 3));
    assert!(room.all_received(MessageKind::DeleteCards, 1));
    assert_eq!(room.phase().await, RoundPhase::Lobby);
}

#[tokio::test]
async fn test_leave_purges_every_replica_so_the_rest_can_start() {
    let room = Room::new(3, MockCollaborator::default()).await;
    room.converge().await;

    room.send(2, leave(2)).await;

    assert_eq!(room.collaborator().calls(), ["/exit:u2"]);
    {
        let registry = room.engine.registry().lock().await;
        assert!(registry.find_user(&user(2).session_id).is_none());
    }
    room.send(0, ready(0)).await;
    room.send(1, ready(1)).await;
    assert_eq!(room.phase().await, RoundPhase::RoundActive);
    assert!(room.all_received(MessageKind::Start, 1));
}

#[tokio::test]
async fn test_leave_keeps_other_copies_when_record_delete_fails() {
    let collaborator = MockCollaborator {
        fail_notifications: true,
        ..Default::default()
    };
    let room = Room::new(2, collaborator).await;
    room.converge().await;

    room.send(1, leave(1)).await;

    assert_eq!(room.tally().await.members, 3);
    let registry = room.engine.registry().lock().await;
    let found = registry.find_user(&user(1).session_id).expect("still listed");
    assert_eq!(found.connection.id(), room.conns[0].id());
}

// =========================================================================
// Routing, unicast, chat, delivery
// =========================================================================

#[tokio::test]
async fn test_game_info_goes_only_to_destination() {
    let room = Room::new(3, MockCollaborator::default()).await;
    let info = GameInfo {
        user: user(0),
        destination_id: user(2).session_id,
    };
    room.send(0, Message::GameInfo(info.clone())).await;

    assert!(room.conns[0].received().is_empty());
    assert!(room.conns[1].received().is_empty());
    assert_eq!(room.conns[2].received(), [Message::GameInfo(info)]);
}

#[tokio::test]
async fn test_game_info_to_unknown_destination_is_dropped() {
    let room = Room::new(2, MockCollaborator::default()).await;
    room.send(
        0,
        Message::GameInfo(GameInfo {
            user: user(0),
            destination_id: SessionId::from("ghost"),
        }),
    )
    .await;
    assert!(room.conns.iter().all(|c| c.received().is_empty()));
}

#[tokio::test]
async fn test_chat_reaches_everyone_even_mid_round() {
    let room = Room::new(3, MockCollaborator::default()).await;
    room.start_round().await;

    let chat = ChatMessage {
        user: user(1),
        text: "gg".into(),
    };
    room.send(1, Message::ChatMessage(chat.clone())).await;

    for conn in &room.conns {
        assert_eq!(conn.received(), [Message::ChatMessage(chat.clone())]);
    }
}

#[tokio::test]
async fn test_broken_peer_does_not_block_the_room() {
    let room = Room::new(3, MockCollaborator::default()).await;
    room.conns[1].break_pipe();

    let delivery = room
        .engine
        .broadcast_to_game(&code(), &frame(&Message::DeleteCards), None)
        .await;
    assert_eq!(delivery.delivered, 2);
    assert_eq!(delivery.failed, [room.conns[1].id()]);

    room.send(
        0,
        Message::ChatMessage(ChatMessage {
            user: user(0),
            text: "still here?".into(),
        }),
    )
    .await;
    assert_eq!(room.conns[0].count(MessageKind::ChatMessage), 1);
    assert_eq!(room.conns[2].count(MessageKind::ChatMessage), 1);
}

#[tokio::test]
async fn test_broadcast_can_exclude_a_connection() {
    let room = Room::new(2, MockCollaborator::default()).await;
    let delivery = room
        .engine
        .broadcast_to_game(
            &code(),
            &frame(&Message::DeleteCards),
            Some(room.conns[0].id()),
        )
        .await;
    assert_eq!(delivery.delivered, 1);
    assert!(room.conns[0].received().is_empty());
}

#[tokio::test]
async fn test_malformed_and_server_only_frames_are_ignored() {
    let room = Room::new(2, MockCollaborator::default()).await;
    let conn_id = room.conns[0].id();

    room.engine.dispatch(conn_id, &[]).await;
    room.engine.dispatch(conn_id, &[0xff, 0xff, 0xff]).await;
    room.send(
        0,
        Message::Start(Start {
            game_code: code(),
            start: true,
            text: "forged".into(),
        }),
    )
    .await;
    room.send(0, Message::DeleteCards).await;
    assert!(room.conns.iter().all(|c| c.received().is_empty()));
    assert_eq!(room.phase().await, RoundPhase::Lobby);

    // The connection is still usable afterwards.
    room.send(0, ready(0)).await;
    assert_eq!(room.conns[1].count(MessageKind::Status), 1);
}

#[tokio::test]
async fn test_handle_connection_dispatches_until_close() {
    let engine = Arc::new(SyncEngine::new(MockCollaborator::default()));
    let (conn, inbox) = MockConn::with_inbox(42);
    let task = tokio::spawn(handle_connection(Arc::clone(&conn), Arc::clone(&engine)));

    inbox.send(frame(&join(0))).unwrap();
    inbox.send(b"not a frame".to_vec()).unwrap();
    inbox
        .send(frame(&Message::ChatMessage(ChatMessage {
            user: user(0),
            text: "hi".into(),
        })))
        .unwrap();
    drop(inbox);
    task.await.unwrap();

    use MessageKind::{ChatMessage as Chat, UpdateInfo, UserInfo};
    assert_eq!(conn.kinds(), [UserInfo, UpdateInfo, Chat]);
    assert!(!engine.registry().lock().await.is_registered(conn.id()));
    assert!(engine.collaborator().calls().is_empty());
}
