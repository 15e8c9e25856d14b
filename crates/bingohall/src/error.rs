//! Unified error type for the server.

use bingohall_protocol::ProtocolError;
use bingohall_room::RoomError;
use bingohall_transport::TransportError;

/// Top-level error that wraps every crate-specific error.
///
/// `?` converts sub-crate errors automatically through the `#[from]`
/// impls.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Bind, accept, send or receive failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An outbound message could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The room actor went away.
    #[error(transparent)]
    Room(#[from] RoomError),
}
