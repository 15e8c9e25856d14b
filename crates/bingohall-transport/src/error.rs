//! Errors from the transport layer.

use std::io;

/// What went wrong on the wire.
///
/// WebSocket protocol errors are folded into `io::Error`, so every variant
/// has the same source type whichever backend produced it.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The TCP listener could not bind or accept.
    #[error("listener failed: {0}")]
    Listen(#[source] io::Error),

    /// A client connected but the WebSocket upgrade did not complete.
    #[error("websocket upgrade failed: {0}")]
    Upgrade(#[source] io::Error),

    #[error("send failed: {0}")]
    Send(#[source] io::Error),

    #[error("receive failed: {0}")]
    Receive(#[source] io::Error),
}
