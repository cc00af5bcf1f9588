//! Codec trait and implementations for coordinator payloads and bridge frames.
//!
//! Two things in gcforge need turning into bytes: the bodies of
//! game-coordinator messages (see [`crate::gc`]) and the event/command
//! frames exchanged with a protocol bridge. Neither the session nor the
//! transport cares HOW that happens; they hold something implementing
//! [`Codec`] and call it.
//!
//! [`JsonCodec`] is the only implementation today. The bridge is the
//! component that re-encodes bodies into the platform's real wire format,
//! so a human-readable codec on our side costs nothing and makes bridge
//! traffic easy to inspect.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust values to bytes and decode bytes back.
///
/// ## Trait bounds
///
/// - `Send + Sync` → a session task and a transport task may both hold
///   the same codec.
/// - `'static` → the codec owns everything it needs; it is stored inside
///   long-lived session state.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value cannot be represented
    /// in this format.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use gcforge_protocol::{Codec, JsonCodec, ClientEvent, EResult};
///
/// let codec = JsonCodec;
/// let event = ClientEvent::Connected { result: EResult::Ok };
///
/// let bytes = codec.encode(&event).unwrap();
/// let decoded: ClientEvent = codec.decode(&bytes).unwrap();
/// assert_eq!(event, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::gc::ReportResponse;

    #[test]
    fn test_json_codec_decode_garbage_returns_decode_error() {
        let result: Result<ReportResponse, _> = JsonCodec.decode(b"not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_json_codec_decode_wrong_shape_returns_decode_error() {
        // A JSON array is valid JSON but not a ReportResponse object.
        let result: Result<ReportResponse, _> = JsonCodec.decode(b"[1,2,3]");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
