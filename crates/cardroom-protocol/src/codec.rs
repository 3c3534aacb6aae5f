//! Codec trait and the compact binary implementation.
//!
//! A codec converts between Rust types and raw bytes. The router and the
//! broadcast path only see the [`Codec`] trait, so the concrete format can
//! change without touching message handling.

use bincode::Options;
use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Upper bound on a single decoded frame, in bytes.
///
/// Length prefixes inside a frame are checked against this before any
/// allocation happens, so a hostile prefix fails instead of exhausting
/// memory.
pub const MAX_FRAME_SIZE: u64 = 64 * 1024;

/// A codec that can encode Rust types to bytes and decode bytes back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// Must never panic on malformed input.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, oversized, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// BincodeCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses `bincode` with varint integers.
///
/// Decoding is bounded by [`MAX_FRAME_SIZE`] and rejects trailing bytes, so
/// a frame must be exactly one value.
///
/// ## Example
///
/// ```rust
/// use cardroom_protocol::{BincodeCodec, Codec, GameCode, Message, Start};
///
/// let codec = BincodeCodec;
/// let msg = Message::Start(Start {
///     game_code: GameCode::from("ABCD"),
///     start: true,
///     text: "Describe your Monday".into(),
/// });
///
/// let bytes = msg.encode(&codec).unwrap();
/// assert_eq!(Message::decode(&codec, &bytes).unwrap(), msg);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl BincodeCodec {
    fn options() -> impl Options {
        bincode::DefaultOptions::new()
            .with_limit(MAX_FRAME_SIZE)
            .reject_trailing_bytes()
    }
}

impl Codec for BincodeCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        Self::options().serialize(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        Self::options()
            .deserialize(data)
            .map_err(ProtocolError::Decode)
    }
}
