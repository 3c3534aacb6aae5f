//! Inbound message routing and the per-kind handlers.
//!
//! Every handler follows the same shape: mutate replicas in one short
//! critical section, drop the lock, then talk to the network. Lookup
//! failures end the handler early with nothing broadcast.

use std::sync::Arc;

use cardroom_collaborator::Collaborator;
use cardroom_protocol::{
    Action, ChatMessage, Choose, Disconnect, GameInfo, Message, Status,
    UpdateInfo, UserInfo,
};
use cardroom_room::Mark;
use cardroom_transport::{Connection, ConnectionId};

use crate::SyncEngine;
use crate::broadcast;

impl<C: Connection, P: Collaborator> SyncEngine<C, P> {
    /// Decodes one inbound frame and runs the handler for its kind.
    ///
    /// Undecodable frames and unknown tags are logged and dropped; the
    /// connection stays open. Decoding happens before any lock is taken.
    pub async fn dispatch(&self, conn_id: ConnectionId, frame: &[u8]) {
        let message = match Message::decode(self.codec(), frame) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(
                    %conn_id,
                    bytes = frame.len(),
                    error = %e,
                    "dropping undecodable frame"
                );
                return;
            }
        };
        let kind = message.kind();
        tracing::debug!(%conn_id, %kind, "dispatching");

        match message {
            Message::UserInfo(info) => self.on_user_info(conn_id, info).await,
            Message::Action(action) => self.on_action(action).await,
            Message::Status(status) => self.on_status(status).await,
            Message::Choose(choose) => self.on_choose(choose).await,
            Message::GameInfo(info) => self.on_game_info(info).await,
            Message::Disconnect(disconnect) => {
                self.on_disconnect(disconnect).await
            }
            Message::ChatMessage(chat) => self.on_chat(chat).await,
            Message::Start(_)
            | Message::DeleteCards
            | Message::UpdateInfo(_) => {
                tracing::debug!(%conn_id, %kind, "ignoring server-only message");
            }
        }
    }

    /// Join or leave: applied to the sender's replica, then rebroadcast
    /// followed by an update notice. A leave whose record the collaborator
    /// deleted is also dropped from every other replica.
    async fn on_user_info(&self, conn_id: ConnectionId, info: UserInfo) {
        let code = info.user.game_code.clone();
        let changed = {
            let mut registry = self.registry().lock().await;
            match registry.replica_or_insert(conn_id, &code) {
                Ok(replica) => replica.apply(&info),
                Err(e) => {
                    tracing::warn!(
                        %conn_id,
                        error = %e,
                        "user info from unregistered connection"
                    );
                    return;
                }
            }
        };
        tracing::info!(
            %conn_id,
            game_code = %code,
            session_id = %info.user.session_id,
            connected = info.connected,
            changed,
            "membership event"
        );

        if !info.connected {
            let session_id = &info.user.session_id;
            match self.collaborator().delete_user(session_id).await {
                Ok(()) => {
                    let removed =
                        self.registry().lock().await.remove_user(session_id);
                    tracing::debug!(%session_id, removed, "left user purged");
                }
                Err(e) => tracing::warn!(
                    %session_id,
                    error = %e,
                    "failed to delete user record"
                ),
            }
        }

        let update = Message::UpdateInfo(UpdateInfo {
            user: info.user.clone(),
        });
        self.broadcast_message(&code, &Message::UserInfo(info)).await;
        self.broadcast_message(&code, &update).await;
    }

    /// Ready toggle. The rebroadcast carries the server's flag, not the
    /// client's. May start a round.
    async fn on_status(&self, status: Status) {
        let code = status.user.game_code.clone();
        let toggled = self
            .registry()
            .lock()
            .await
            .toggle_ready(&code, &status.user.session_id);
        let ready = match toggled {
            Ok(ready) => ready,
            Err(e) => {
                tracing::debug!(
                    session_id = %status.user.session_id,
                    error = %e,
                    "ready toggle ignored"
                );
                return;
            }
        };

        let echo = Message::Status(Status {
            user: status.user,
            status: ready,
        });
        self.broadcast_message(&code, &echo).await;
        self.try_start_round(&code).await;
    }

    /// Turn action, once per round. May end the round.
    async fn on_action(&self, action: Action) {
        let code = action.user.game_code.clone();
        let recorded = self
            .registry()
            .lock()
            .await
            .record_turn(&code, &action.user.session_id);
        match recorded {
            Ok(Mark::Recorded) => {}
            Ok(Mark::AlreadySet) => {
                tracing::debug!(
                    session_id = %action.user.session_id,
                    "user already acted this round"
                );
                return;
            }
            Err(e) => {
                tracing::debug!(error = %e, "action ignored");
                return;
            }
        }

        self.broadcast_message(&code, &Message::Action(action)).await;
        self.try_finish_round(&code).await;
    }

    /// Card vote, once per user per round. There is no "all voted" step.
    async fn on_choose(&self, choose: Choose) {
        let code = choose.user.game_code.clone();
        let recorded = self
            .registry()
            .lock()
            .await
            .record_vote(&code, &choose.user.session_id);
        match recorded {
            Ok(Mark::Recorded) => {
                self.broadcast_message(&code, &Message::Choose(choose)).await;
            }
            Ok(Mark::AlreadySet) => {
                tracing::debug!(
                    session_id = %choose.user.session_id,
                    "user already voted"
                );
            }
            Err(e) => tracing::debug!(error = %e, "vote ignored"),
        }
    }

    /// Point-to-point: forwarded only to the connection owning the
    /// destination session.
    async fn on_game_info(&self, info: GameInfo) {
        let target = {
            let registry = self.registry().lock().await;
            registry
                .find_user(&info.destination_id)
                .map(|found| Arc::clone(found.connection))
        };
        let Some(conn) = target else {
            tracing::debug!(
                destination_id = %info.destination_id,
                "game info destination not found"
            );
            return;
        };

        match Message::GameInfo(info).encode(self.codec()) {
            Ok(frame) => {
                if broadcast::send_to_one(conn.as_ref(), &frame).await.is_ok() {
                    tracing::debug!(conn_id = %conn.id(), "game info forwarded");
                }
            }
            Err(e) => tracing::error!(error = %e, "failed to encode game info"),
        }
    }

    /// Explicit exit: local cleanup first, then collaborator, then the
    /// synthetic leave, then both aggregate checks.
    async fn on_disconnect(&self, disconnect: Disconnect) {
        let user = disconnect.user;
        let removed =
            self.registry().lock().await.remove_user(&user.session_id);
        tracing::info!(
            game_code = %user.game_code,
            session_id = %user.session_id,
            removed,
            "user disconnected"
        );

        let session_id = &user.session_id;
        if let Err(e) = self.collaborator().notify_disconnect(session_id).await {
            tracing::warn!(
                %session_id,
                error = %e,
                "failed to propagate disconnect"
            );
        }
        if let Err(e) = self.collaborator().delete_user(session_id).await {
            tracing::warn!(
                %session_id,
                error = %e,
                "failed to delete user record"
            );
        }

        let code = user.game_code.clone();
        let leave = Message::UserInfo(UserInfo {
            user,
            connected: false,
        });
        self.broadcast_message(&code, &leave).await;

        self.try_finish_round(&code).await;
        self.try_start_round(&code).await;
    }

    /// Chat is never gated by round state.
    async fn on_chat(&self, chat: ChatMessage) {
        let code = chat.user.game_code.clone();
        self.broadcast_message(&code, &Message::ChatMessage(chat)).await;
    }
}
