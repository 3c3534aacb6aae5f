//! Concurrent fan-out of encoded frames.
//!
//! Callers snapshot their targets under the registry lock and release it
//! before calling in here; nothing in this module touches the registry.

use std::sync::Arc;

use cardroom_transport::{Connection, ConnectionId};
use futures_util::future::join_all;

/// Outcome of one broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Targets the frame was written to.
    pub delivered: usize,
    /// Targets whose write failed, in target order.
    pub failed: Vec<ConnectionId>,
}

impl Delivery {
    /// Total write attempts.
    pub fn attempted(&self) -> usize {
        self.delivered + self.failed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Writes `frame` to every target at once and waits for all writes.
///
/// A failed write is logged and recorded in the [`Delivery`]. It never
/// stops delivery to the other targets.
pub async fn fan_out<C: Connection>(targets: &[Arc<C>], frame: &[u8]) -> Delivery {
    let sends = targets.iter().map(|conn| async move {
        let result = conn.send(frame).await;
        (conn.id(), result)
    });

    let mut delivery = Delivery::default();
    for (conn_id, result) in join_all(sends).await {
        match result {
            Ok(()) => delivery.delivered += 1,
            Err(e) => {
                tracing::warn!(%conn_id, error = %e, "broadcast delivery failed");
                delivery.failed.push(conn_id);
            }
        }
    }
    delivery
}

/// Writes `frame` to a single connection.
pub async fn send_to_one<C: Connection>(
    conn: &C,
    frame: &[u8],
) -> Result<(), C::Error> {
    let result = conn.send(frame).await;
    match &result {
        Ok(()) => {
            tracing::debug!(conn_id = %conn.id(), bytes = frame.len(), "frame sent")
        }
        Err(e) => tracing::warn!(conn_id = %conn.id(), error = %e, "send failed"),
    }
    result
}
