//! Error types for the protocol layer.
//!
//! Each gcforge crate owns its own error enum. A `ProtocolError` always
//! means "these bytes did not match the shape we expected", never a
//! networking or session problem.

/// Errors that can occur while encoding or decoding protocol data.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust value).
    ///
    /// Common causes: truncated coordinator payloads, a bridge speaking a
    /// different frame version, or a field of the wrong type.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A coordinator message arrived with a type we did not ask to decode.
    #[error("unexpected coordinator message type {actual} (expected {expected})")]
    UnexpectedMessageType {
        /// The message type the caller wanted.
        expected: u32,
        /// The message type that was actually present.
        actual: u32,
    },

    /// The data decoded but violates a protocol rule.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
