//! Per-connection read loop.
//!
//! Each accepted socket gets its own Tokio task running
//! [`handle_incoming`]. The flow is:
//!   1. Finish the transport handshake (bounded by the transport's timeout)
//!   2. Register the connection with the engine
//!   3. Loop: receive a frame → dispatch it
//!   4. On clean close or read error, unregister (drops its replicas)

use std::sync::Arc;

use cardroom_collaborator::Collaborator;
use cardroom_transport::{Connection, Handshake};

use crate::SyncEngine;

/// Upgrades an accepted socket, then serves it until it closes.
///
/// A peer that fails or stalls the handshake is dropped without ever
/// being registered.
pub async fn handle_incoming<I, C, P>(
    incoming: I,
    engine: Arc<SyncEngine<C, P>>,
) where
    I: Handshake<Connection = C>,
    C: Connection,
    P: Collaborator,
{
    let conn_id = incoming.id();
    match incoming.complete().await {
        Ok(conn) => handle_connection(Arc::new(conn), engine).await,
        Err(e) => tracing::warn!(%conn_id, error = %e, "handshake failed"),
    }
}

/// Handles a single upgraded connection until it closes.
///
/// Frames are dispatched in arrival order. There is no read timeout: an
/// idle peer stays registered until its socket reports an error or closes.
pub async fn handle_connection<C, P>(
    conn: Arc<C>,
    engine: Arc<SyncEngine<C, P>>,
) where
    C: Connection,
    P: Collaborator,
{
    let conn_id = engine.connect(Arc::clone(&conn)).await;
    tracing::info!(%conn_id, "connection opened");

    loop {
        match conn.recv().await {
            Ok(Some(frame)) => engine.dispatch(conn_id, &frame).await,
            Ok(None) => {
                tracing::debug!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        }
    }

    engine.disconnect(conn_id).await;
}
