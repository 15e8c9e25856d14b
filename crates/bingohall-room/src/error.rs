//! Error types for the room layer.

use bingohall_protocol::RoomId;

/// Why a client command was refused.
///
/// The `Display` text is sent verbatim to the sender in an `error`
/// notification. None of these change the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// A non-host sent a host-only command.
    #[error("Not authorized")]
    Unauthorized,

    #[error("Game already started")]
    AlreadyStarted,

    #[error("Game not in progress")]
    NotInProgress,

    /// Cards can only be regenerated in the lobby or during a timeout.
    #[error("Cannot regenerate cards now")]
    CannotRegenerate,

    #[error("No players ready")]
    NoPlayersReady,

    /// `requireAllPlayersReady` is on and someone holding cards is not ready.
    #[error("Not all players are ready")]
    PlayersNotReady,

    /// Every number has been called.
    #[error("No more numbers")]
    Exhausted,

    #[error("Cannot kick yourself")]
    CannotKickSelf,

    #[error("Player not found")]
    PlayerNotFound,

    #[error("Message cannot be empty")]
    EmptyChatMessage,
}

/// Errors talking to a room actor.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The room's command channel is closed; the actor has stopped.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}
