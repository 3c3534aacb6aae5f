//! Transport abstraction layer for Cardroom.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract over
//! the duplex byte channel each player holds open. One frame on the wire is
//! one logical message; there is no batching.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{
    DEFAULT_HANDSHAKE_TIMEOUT, PendingWebSocket, WebSocketConnection,
    WebSocketTransport,
};

use std::fmt;
use std::future::Future;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
///
/// Accepting only takes the raw socket off the listener. Any protocol
/// handshake happens later in [`Handshake::complete`], so a slow peer
/// never holds up the accept loop.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// A socket that has been accepted but not yet upgraded.
    type Incoming: Handshake<
            Connection = Self::Connection,
            Error = Self::Error,
        >;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming socket.
    fn accept(
        &mut self,
    ) -> impl Future<Output = Result<Self::Incoming, Self::Error>> + Send;
}

/// The second half of accepting a connection.
pub trait Handshake: Send + 'static {
    /// The connection produced once the handshake succeeds.
    type Connection: Connection;
    /// The error type for a failed handshake.
    type Error: std::error::Error + Send + Sync;

    /// The id the connection will carry once upgraded.
    fn id(&self) -> ConnectionId;

    /// Runs the handshake and yields the ready connection.
    fn complete(
        self,
    ) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send;
}

/// A single connection that can send and receive frames.
///
/// Sending and receiving must be usable at the same time: one task sits in
/// [`recv`](Self::recv) while broadcast fan-out calls
/// [`send`](Self::send) from other tasks.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Sends one frame to the remote peer.
    fn send(
        &self,
        data: &[u8],
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Receives the next frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    fn recv(
        &self,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, Self::Error>> + Send;

    /// Closes the connection.
    fn close(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
