//! Error types for the protocol layer.
//!
//! Every variant here means "drop this frame, keep the connection open".
//! The router logs them and moves on to the next frame.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(#[source] bincode::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: truncated frames, length prefixes beyond the decode
    /// limit, trailing garbage, or a payload that doesn't match its tag.
    #[error("decode failed: {0}")]
    Decode(#[source] bincode::Error),

    /// The envelope decoded but its tag names no known message kind.
    #[error("unknown message tag: {0}")]
    UnknownTag(u32),

    /// The message is invalid at the protocol level.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
