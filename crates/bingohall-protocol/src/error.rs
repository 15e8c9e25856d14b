//! Error types for the protocol layer.
//!
//! Each crate in Bingohall defines its own error enum. A `ProtocolError`
//! always means the bytes on the wire were the problem, never the game
//! rules or the network.

/// Errors that can occur while encoding or decoding messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, a missing field, or a
    /// payload of the wrong shape.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// Well-formed message whose `type` is not a known command.
    #[error("unknown message type: {0}")]
    UnknownType(String),

    /// The message is invalid at the protocol level, e.g. it is not a
    /// JSON object or has no `type` field.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

impl ProtocolError {
    /// The text sent back to the client in an `error` notification.
    ///
    /// Internal details (serde's position info, the offending type name)
    /// stay in the logs.
    pub fn client_message(&self) -> &'static str {
        match self {
            Self::UnknownType(_) => "Unknown message type",
            _ => "Invalid message format",
        }
    }
}
