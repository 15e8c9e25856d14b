//! Codec trait and implementations for serializing/deserializing messages.
//!
//! The rest of the server only needs "something that implements
//! [`Codec`]". Today that is [`JsonCodec`], because browsers speak JSON
//! and the messages stay readable in DevTools.

use serde::{Serialize, de::DeserializeOwned};

use crate::{ClientMessage, ProtocolError};

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task on the Tokio thread pool.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;

    /// Decodes one inbound client command.
    ///
    /// Codecs that can tell an unknown `type` apart from a malformed
    /// payload should override this and return
    /// [`ProtocolError::UnknownType`] for the former.
    fn decode_command(&self, data: &[u8]) -> Result<ClientMessage, ProtocolError> {
        self.decode(data)
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// This is behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use bingohall_protocol::{ClientMessage, Codec, JsonCodec, ProtocolError};
///
/// let codec = JsonCodec;
///
/// let cmd = codec.decode_command(br#"{"type":"hostCallNext"}"#).unwrap();
/// assert_eq!(cmd, ClientMessage::HostCallNext);
///
/// let err = codec.decode_command(br#"{"type":"hostDance"}"#).unwrap_err();
/// assert!(matches!(err, ProtocolError::UnknownType(_)));
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }

    fn decode_command(&self, data: &[u8]) -> Result<ClientMessage, ProtocolError> {
        // Parse once into a Value so the discriminant can be checked before
        // the payload. Otherwise serde reports both cases the same way.
        let value: serde_json::Value =
            serde_json::from_slice(data).map_err(ProtocolError::Decode)?;

        let kind = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| ProtocolError::InvalidMessage("missing string field `type`".into()))?;

        if !ClientMessage::TYPES.contains(&kind) {
            return Err(ProtocolError::UnknownType(kind.to_string()));
        }

        serde_json::from_value(value).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{PlayerId, ServerMessage};

    #[test]
    fn test_decode_command_accepts_known_type() {
        let cmd = JsonCodec
            .decode_command(br#"{"type":"selectCards","cardIds":["a","b"]}"#)
            .unwrap();
        assert_eq!(
            cmd,
            ClientMessage::SelectCards {
                card_ids: vec!["a".into(), "b".into()]
            }
        );
    }

    #[test]
    fn test_decode_command_unknown_type() {
        let err = JsonCodec.decode_command(br#"{"type":"hostDance"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownType(ref t) if t == "hostDance"));
    }

    #[test]
    fn test_decode_command_malformed_json() {
        let err = JsonCodec.decode_command(b"{not json").unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
        assert_eq!(err.client_message(), "Invalid message format");
    }

    #[test]
    fn test_decode_command_missing_type() {
        let err = JsonCodec.decode_command(br#"{"playerName":"Ana"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidMessage(_)));

        let err = JsonCodec.decode_command(b"[1,2,3]").unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidMessage(_)));
    }

    #[test]
    fn test_decode_command_known_type_bad_payload() {
        let err = JsonCodec
            .decode_command(br#"{"type":"markCell","cardId":"c","row":"x","col":0}"#)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
    }

    #[test]
    fn test_encode_server_message() {
        let bytes = JsonCodec
            .encode(&ServerMessage::PlayerLeft {
                player_id: PlayerId(9),
            })
            .unwrap();
        assert_eq!(bytes, br#"{"type":"playerLeft","playerId":9}"#);
    }
}
