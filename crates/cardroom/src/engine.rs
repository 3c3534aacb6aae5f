//! The room synchronization engine: shared state for every connection task.

use std::sync::Arc;

use cardroom_collaborator::Collaborator;
use cardroom_protocol::{BincodeCodec, GameCode, Message};
use cardroom_room::Registry;
use cardroom_transport::{Connection, ConnectionId};
use tokio::sync::Mutex;

use crate::broadcast::{self, Delivery};

/// Shared engine state, wrapped in `Arc` and handed to each connection task.
///
/// All replica state lives in one [`Registry`] behind one lock. Handlers
/// hold that lock only for registry reads, mutations and aggregate counts;
/// it is always released before a socket write or a collaborator call.
pub struct SyncEngine<C: Connection, P: Collaborator> {
    registry: Mutex<Registry<C>>,
    collaborator: P,
    codec: BincodeCodec,
}

impl<C: Connection, P: Collaborator> SyncEngine<C, P> {
    pub fn new(collaborator: P) -> Self {
        Self {
            registry: Mutex::new(Registry::new()),
            collaborator,
            codec: BincodeCodec,
        }
    }

    /// The registry lock. Exposed for inspection; handlers go through
    /// [`dispatch`](Self::dispatch).
    pub fn registry(&self) -> &Mutex<Registry<C>> {
        &self.registry
    }

    pub fn collaborator(&self) -> &P {
        &self.collaborator
    }

    pub(crate) fn codec(&self) -> &BincodeCodec {
        &self.codec
    }

    /// Registers a freshly accepted connection.
    pub async fn connect(&self, conn: Arc<C>) -> ConnectionId {
        self.registry.lock().await.register(conn)
    }

    /// Forgets a closed connection and every replica it held.
    ///
    /// Makes no collaborator calls: an implicit close isn't an exit.
    pub async fn disconnect(&self, conn_id: ConnectionId) {
        let dropped = self.registry.lock().await.unregister(conn_id);
        if let Some(replicas) = dropped {
            tracing::info!(
                %conn_id,
                replicas = replicas.len(),
                "connection closed"
            );
        }
    }

    /// Sends `frame` to every connection holding a replica for `code`.
    ///
    /// Targets are snapshotted under the lock; the writes happen after it
    /// is released and run concurrently.
    pub async fn broadcast_to_game(
        &self,
        code: &GameCode,
        frame: &[u8],
        exclude: Option<ConnectionId>,
    ) -> Delivery {
        let targets = self.registry.lock().await.targets(code, exclude);
        let delivery = broadcast::fan_out(&targets, frame).await;
        tracing::debug!(
            game_code = %code,
            delivered = delivery.delivered,
            failed = delivery.failed.len(),
            "broadcast"
        );
        delivery
    }

    /// Encodes `message` and broadcasts it to the whole room.
    pub(crate) async fn broadcast_message(
        &self,
        code: &GameCode,
        message: &Message,
    ) -> Delivery {
        match message.encode(&self.codec) {
            Ok(frame) => self.broadcast_to_game(code, &frame, None).await,
            Err(e) => {
                tracing::error!(
                    game_code = %code,
                    kind = %message.kind(),
                    error = %e,
                    "failed to encode broadcast"
                );
                Delivery::default()
            }
        }
    }
}
