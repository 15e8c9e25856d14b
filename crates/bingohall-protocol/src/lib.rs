//! Wire protocol for Bingohall.
//!
//! This crate defines the "language" that bingo clients and the room
//! server speak, plus the session data model those messages carry:
//!
//! - **Identities** ([`PlayerId`], [`RoomId`], [`CardId`], [`PersistentId`])
//!   and delivery targets ([`Recipient`]).
//! - **Model** ([`GameState`], [`Player`], [`Card`], [`Pattern`], ...):
//!   the session snapshot that gets replicated to every participant.
//! - **Messages** ([`ClientMessage`], [`ServerMessage`]): the closed
//!   tagged unions of inbound commands and outbound notifications.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong while decoding.
//!
//! # Architecture
//!
//! The protocol layer doesn't know about connections, rooms, or rules;
//! it only knows the shapes of things and how to serialize them.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientMessage) → Room (Coordinator → Engine)
//! ```

mod codec;
mod error;
mod message;
mod model;
mod patterns;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use message::{ClientMessage, ServerMessage};
pub use model::{
    CARD_POOL_SIZE, Card, Cell, ChatKind, ChatMessage, Column,
    DEFAULT_CALL_INTERVAL_MS, GRID_SIZE, GameSettings, GameState, Grid,
    MAX_CALL_INTERVAL_MS, MAX_CHAT_MESSAGES, MAX_SELECTED_CARDS,
    MIN_CALL_INTERVAL_MS, MarkGrid, NumberCall, Phase, Player, PlayerStats,
    QuickReaction, SettingsPatch, TOTAL_NUMBERS, Winner,
};
pub use patterns::{Pattern, PatternKind, PatternType, preset, presets};
pub use types::{CardId, PersistentId, PlayerId, Recipient, RoomId};
