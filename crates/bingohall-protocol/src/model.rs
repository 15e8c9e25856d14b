//! The session data model replicated to every participant.
//!
//! Everything here is plain data: the rules that change it live in
//! `bingohall-engine`. Field names follow the browser client's camelCase
//! convention on the wire.

use std::collections::HashMap;
use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{CardId, Pattern, PersistentId, PlayerId, RoomId};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Cards are 5×5.
pub const GRID_SIZE: usize = 5;

/// Numbers run 1..=75.
pub const TOTAL_NUMBERS: u8 = 75;

/// Every player is offered a pool of this many cards.
pub const CARD_POOL_SIZE: usize = 8;

/// A player may play at most this many cards at once.
pub const MAX_SELECTED_CARDS: usize = 4;

/// Fastest allowed auto-call pace.
pub const MIN_CALL_INTERVAL_MS: u64 = 2_000;

/// Slowest allowed auto-call pace.
pub const MAX_CALL_INTERVAL_MS: u64 = 10_000;

/// Auto-call pace for a fresh room.
pub const DEFAULT_CALL_INTERVAL_MS: u64 = 5_000;

/// The chat log keeps only the most recent messages.
pub const MAX_CHAT_MESSAGES: usize = 100;

// ---------------------------------------------------------------------------
// Cells, columns, and cards
// ---------------------------------------------------------------------------

/// The value printed in one card cell.
///
/// On the wire a cell is either a bare number or the string `"FREE"`,
/// so serde is implemented by hand instead of derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Number(u8),
    Free,
}

impl Cell {
    /// The number in this cell, or `None` for the free space.
    pub fn number(self) -> Option<u8> {
        match self {
            Self::Number(n) => Some(n),
            Self::Free => None,
        }
    }

    pub fn is_free(self) -> bool {
        matches!(self, Self::Free)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Free => f.write_str("FREE"),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Number(n) => serializer.serialize_u8(*n),
            Self::Free => serializer.serialize_str("FREE"),
        }
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CellVisitor;

        impl Visitor<'_> for CellVisitor {
            type Value = Cell;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a number between 1 and 75 or the string \"FREE\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Cell, E> {
                match u8::try_from(v) {
                    Ok(n) if (1..=TOTAL_NUMBERS).contains(&n) => Ok(Cell::Number(n)),
                    _ => Err(E::invalid_value(de::Unexpected::Unsigned(v), &self)),
                }
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Cell, E> {
                u64::try_from(v)
                    .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
                    .and_then(|v| self.visit_u64(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Cell, E> {
                if v == "FREE" {
                    Ok(Cell::Free)
                } else {
                    Err(E::invalid_value(de::Unexpected::Str(v), &self))
                }
            }
        }

        deserializer.deserialize_any(CellVisitor)
    }
}

/// A card's printed grid, row-major: `grid[row][col]`.
pub type Grid = [[Cell; GRID_SIZE]; GRID_SIZE];

/// Which cells a player has daubed, row-major like [`Grid`].
pub type MarkGrid = [[bool; GRID_SIZE]; GRID_SIZE];

/// The five lettered columns of a 75-ball card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    B,
    I,
    N,
    G,
    O,
}

impl Column {
    /// All columns, left to right.
    pub const ALL: [Column; GRID_SIZE] =
        [Column::B, Column::I, Column::N, Column::G, Column::O];

    /// The column a called number belongs to.
    pub fn for_number(number: u8) -> Self {
        match number {
            0..=15 => Self::B,
            16..=30 => Self::I,
            31..=45 => Self::N,
            46..=60 => Self::G,
            _ => Self::O,
        }
    }

    /// The inclusive number range printed in this column.
    pub fn range(self) -> std::ops::RangeInclusive<u8> {
        let start = self.index() as u8 * 15 + 1;
        start..=start + 14
    }

    /// Zero-based position of this column on the card.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Formats a call the way a caller announces it, e.g. `B-7`.
    pub fn announce(number: u8) -> String {
        format!("{}-{number}", Self::for_number(number))
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Self::B => "B",
            Self::I => "I",
            Self::N => "N",
            Self::G => "G",
            Self::O => "O",
        };
        f.write_str(letter)
    }
}

/// One bingo card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub grid: Grid,
}

impl Card {
    /// The value at `(row, col)`, or `None` when out of bounds.
    pub fn cell(&self, row: usize, col: usize) -> Option<Cell> {
        self.grid.get(row).and_then(|r| r.get(col)).copied()
    }
}

// ---------------------------------------------------------------------------
// Calls, winners, chat, stats
// ---------------------------------------------------------------------------

/// A single number call in the session's call history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberCall {
    pub number: u8,
    pub column: Column,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

/// A validated bingo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Winner {
    pub player_id: PlayerId,
    pub player_name: String,
    pub card_id: CardId,
    /// 1-based finishing place, assigned in arrival order.
    pub place: u32,
    pub timestamp: u64,
    /// The cells that satisfied the pattern for this particular claim.
    pub winning_pattern: MarkGrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChatKind {
    Text,
    Reaction,
}

/// Canned reactions a player can fire with one tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickReaction {
    GoodLuck,
    SoClose,
    OneMore,
    Nice,
    Wow,
    Haha,
    Nervous,
    LetsGo,
}

impl QuickReaction {
    /// The wire key, which is also stored as the chat message content.
    pub fn key(self) -> &'static str {
        match self {
            Self::GoodLuck => "good_luck",
            Self::SoClose => "so_close",
            Self::OneMore => "one_more",
            Self::Nice => "nice",
            Self::Wow => "wow",
            Self::Haha => "haha",
            Self::Nervous => "nervous",
            Self::LetsGo => "lets_go",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub player_id: PlayerId,
    pub player_name: String,
    #[serde(rename = "type")]
    pub kind: ChatKind,
    /// Message text, or the reaction key for reactions.
    pub content: String,
    pub timestamp: u64,
}

/// Counters that follow a person across reconnects, keyed by
/// [`PersistentId`] rather than by connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub persistent_id: PersistentId,
    pub player_name: String,
    pub wins: u32,
    pub games_played: u32,
    pub connected: bool,
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Host-controlled session settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    pub auto_call: bool,
    /// Milliseconds between automatic calls, kept within
    /// [`MIN_CALL_INTERVAL_MS`]..=[`MAX_CALL_INTERVAL_MS`].
    pub call_interval: u64,
    pub allow_multiple_winners: bool,
    pub max_winners: u32,
    pub require_all_players_ready: bool,
    pub allow_highlight_called_numbers: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            auto_call: false,
            call_interval: DEFAULT_CALL_INTERVAL_MS,
            allow_multiple_winners: true,
            max_winners: 3,
            require_all_players_ready: false,
            allow_highlight_called_numbers: true,
        }
    }
}

impl GameSettings {
    /// Clamps a requested auto-call interval into the allowed range.
    pub fn clamp_interval(interval_ms: u64) -> u64 {
        interval_ms.clamp(MIN_CALL_INTERVAL_MS, MAX_CALL_INTERVAL_MS)
    }
}

/// A partial update to [`GameSettings`]; `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub auto_call: Option<bool>,
    pub call_interval: Option<u64>,
    pub allow_multiple_winners: Option<bool>,
    pub max_winners: Option<u32>,
    pub require_all_players_ready: Option<bool>,
    pub allow_highlight_called_numbers: Option<bool>,
}

// ---------------------------------------------------------------------------
// Players and the session
// ---------------------------------------------------------------------------

/// Session-wide phase.
///
/// ```text
/// lobby ──→ playing ⇄ paused
///             ⇅  └──→ finished
///           timeout
/// (any) ──reset──→ lobby
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    #[default]
    Lobby,
    Playing,
    Paused,
    Timeout,
    Finished,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lobby => "lobby",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Timeout => "timeout",
            Self::Finished => "finished",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// The connection currently attached to this player.
    pub id: PlayerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent_id: Option<PersistentId>,
    pub name: String,
    pub is_host: bool,
    pub connected: bool,
    /// The offered pool (size [`CARD_POOL_SIZE`]).
    pub cards: Vec<Card>,
    /// Cards being played, a subset of `cards`.
    pub selected_card_ids: Vec<CardId>,
    /// One mark grid per selected card.
    pub marked_cells: HashMap<CardId, MarkGrid>,
    pub auto_mark: bool,
    pub ready_to_play: bool,
    pub highlight_called_numbers: bool,
}

impl Player {
    pub fn card(&self, card_id: &CardId) -> Option<&Card> {
        self.cards.iter().find(|c| &c.id == card_id)
    }

    pub fn is_selected(&self, card_id: &CardId) -> bool {
        self.selected_card_ids.contains(card_id)
    }

    pub fn has_selection(&self) -> bool {
        !self.selected_card_ids.is_empty()
    }
}

/// The full authoritative state of one room's session.
///
/// `Default` yields an empty placeholder without a draw order; real
/// sessions are built by the engine's `create_initial_state`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub room_id: RoomId,
    pub phase: Phase,
    pub host_id: Option<PlayerId>,
    pub players: HashMap<PlayerId, Player>,

    /// Numbers called so far, in call order.
    pub called_numbers: Vec<u8>,
    /// The rest of the draw order, consumed from the front.
    pub remaining_numbers: Vec<u8>,
    pub current_number: Option<u8>,
    pub call_history: Vec<NumberCall>,

    pub settings: GameSettings,
    pub current_pattern: Pattern,

    /// Winners in placement order.
    pub winners: Vec<Winner>,

    pub last_call_time: u64,
    pub timeout_end_time: Option<u64>,

    pub chat_messages: Vec<ChatMessage>,
    pub player_stats: HashMap<PersistentId, PlayerStats>,
}

impl GameState {
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn is_host(&self, id: PlayerId) -> bool {
        self.host_id == Some(id)
    }

    /// `true` once every number in the draw order has been called.
    pub fn is_exhausted(&self) -> bool {
        self.remaining_numbers.is_empty()
    }

    pub fn last_call(&self) -> Option<&NumberCall> {
        self.call_history.last()
    }

    pub fn has_won(&self, id: PlayerId) -> bool {
        self.winners.iter().any(|w| w.player_id == id)
    }
}
