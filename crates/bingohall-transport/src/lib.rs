//! Network edge of Bingohall.
//!
//! The server is written against two small traits: a [`Transport`] hands
//! out [`Connection`]s, and a connection moves whole frames in both
//! directions. The only backend today is WebSocket.
//!
//! Clients choose a room through the URL they open
//! (`ws://host/party/<room>`), so every connection keeps the request path
//! it was upgraded on; see [`Connection::path`].
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket backend via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;

/// Process-wide connection number, used to tie log lines together.
///
/// Not the same thing as a player id: rooms number their own connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Source of new connections.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Waits for the next client and completes its upgrade.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// One client socket.
///
/// Reading and writing are independent: a writer task may `send` while
/// the read loop is parked in `recv`.
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    /// Writes one frame. Valid UTF-8 goes out as a text frame, anything
    /// else as binary.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Next data frame, or `Ok(None)` once the peer has closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Starts the closing handshake.
    async fn close(&self) -> Result<(), Self::Error>;

    fn id(&self) -> ConnectionId;

    /// Request path of the upgrade, e.g. `/party/friday`.
    fn path(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_display() {
        assert_eq!(ConnectionId(7).to_string(), "conn-7");
    }
}
