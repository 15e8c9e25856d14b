//! Inbound commands and outbound notifications.
//!
//! Both directions are closed tagged unions: every JSON object carries a
//! `type` discriminant in camelCase, and payload fields are camelCase too.
//! Adding a command means adding a variant here, and the room coordinator
//! will not compile until it handles it.

use serde::{Deserialize, Serialize};

use crate::{
    Card, CardId, ChatMessage, GameState, MarkGrid, NumberCall, Pattern, PersistentId,
    Player, PlayerId, QuickReaction, Winner,
};

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// A command sent by a client connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    JoinRoom {
        player_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        persistent_id: Option<PersistentId>,
    },
    SelectCards {
        card_ids: Vec<CardId>,
    },
    RegenerateCards {
        #[serde(default)]
        preserve_selected: bool,
    },
    MarkCell {
        card_id: CardId,
        row: usize,
        col: usize,
    },
    ClaimBingo {
        card_id: CardId,
        marked_grid: MarkGrid,
    },
    ToggleAutoMark {
        enabled: bool,
    },
    ToggleHighlightCalledNumbers {
        enabled: bool,
    },
    PlayerReady,
    PlayerUnready,

    HostStartGame,
    HostCallNext,
    HostPause,
    HostResume,
    /// Returns the room to the lobby. Players keep their selected cards
    /// unless `preserveCardSelections` is sent as `false`.
    HostReset {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        preserve_card_selections: Option<bool>,
    },
    HostSetPattern {
        pattern: Pattern,
    },
    HostSetSpeed {
        interval_ms: u64,
    },
    HostToggleAutoCall {
        enabled: bool,
    },
    HostToggleAllowHighlight {
        enabled: bool,
    },
    HostCreateTimeout {
        duration_seconds: u64,
    },
    HostEndTimeout,
    HostKickPlayer {
        player_id: PlayerId,
    },

    SendChatMessage {
        content: String,
    },
    SendReaction {
        reaction: QuickReaction,
    },
}

impl ClientMessage {
    /// Every `type` discriminant a client may send.
    ///
    /// The codec checks against this list before decoding the payload, so
    /// an unknown command is reported differently from a malformed one.
    pub const TYPES: &'static [&'static str] = &[
        "joinRoom",
        "selectCards",
        "regenerateCards",
        "markCell",
        "claimBingo",
        "toggleAutoMark",
        "toggleHighlightCalledNumbers",
        "playerReady",
        "playerUnready",
        "hostStartGame",
        "hostCallNext",
        "hostPause",
        "hostResume",
        "hostReset",
        "hostSetPattern",
        "hostSetSpeed",
        "hostToggleAutoCall",
        "hostToggleAllowHighlight",
        "hostCreateTimeout",
        "hostEndTimeout",
        "hostKickPlayer",
        "sendChatMessage",
        "sendReaction",
    ];

    /// The wire discriminant of this command, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::JoinRoom { .. } => "joinRoom",
            Self::SelectCards { .. } => "selectCards",
            Self::RegenerateCards { .. } => "regenerateCards",
            Self::MarkCell { .. } => "markCell",
            Self::ClaimBingo { .. } => "claimBingo",
            Self::ToggleAutoMark { .. } => "toggleAutoMark",
            Self::ToggleHighlightCalledNumbers { .. } => "toggleHighlightCalledNumbers",
            Self::PlayerReady => "playerReady",
            Self::PlayerUnready => "playerUnready",
            Self::HostStartGame => "hostStartGame",
            Self::HostCallNext => "hostCallNext",
            Self::HostPause => "hostPause",
            Self::HostResume => "hostResume",
            Self::HostReset { .. } => "hostReset",
            Self::HostSetPattern { .. } => "hostSetPattern",
            Self::HostSetSpeed { .. } => "hostSetSpeed",
            Self::HostToggleAutoCall { .. } => "hostToggleAutoCall",
            Self::HostToggleAllowHighlight { .. } => "hostToggleAllowHighlight",
            Self::HostCreateTimeout { .. } => "hostCreateTimeout",
            Self::HostEndTimeout => "hostEndTimeout",
            Self::HostKickPlayer { .. } => "hostKickPlayer",
            Self::SendChatMessage { .. } => "sendChatMessage",
            Self::SendReaction { .. } => "sendReaction",
        }
    }

    /// `true` for commands only the room's host may issue.
    pub fn is_host_only(&self) -> bool {
        self.kind().starts_with("host")
    }
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// A notification pushed to one or more connections.
///
/// Snapshots are boxed: `GameState` is large and most variants are not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// First message on every connection.
    Init {
        player_id: PlayerId,
        is_host: bool,
        state: Box<GameState>,
    },
    CardPool {
        cards: Vec<Card>,
    },
    GameState {
        state: Box<GameState>,
    },
    NumberCalled {
        call: NumberCall,
        state: Box<GameState>,
    },
    PlayerJoined {
        player: Box<Player>,
    },
    PlayerLeft {
        player_id: PlayerId,
    },
    PlayerUpdated {
        player: Box<Player>,
    },
    BingoValidated {
        winner: Winner,
    },
    /// Broadcast so spectators see failed attempts too.
    BingoInvalid {
        player_id: PlayerId,
        reason: String,
    },
    GameStarted {
        state: Box<GameState>,
    },
    GamePaused,
    GameResumed {
        state: Box<GameState>,
    },
    GameReset {
        state: Box<GameState>,
    },
    TimeoutStarted {
        end_time: u64,
    },
    TimeoutEnded,
    PatternChanged {
        pattern: Pattern,
        changed_by: String,
    },
    /// Sent just before the server closes a kicked connection.
    Kicked,
    Error {
        message: String,
    },
    ChatMessage {
        message: ChatMessage,
    },
    ChatHistory {
        messages: Vec<ChatMessage>,
    },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// A full snapshot broadcast.
    pub fn game_state(state: &GameState) -> Self {
        Self::GameState {
            state: Box::new(state.clone()),
        }
    }
}
