//! Identity types and delivery targets.
//!
//! Every identity on the wire is a "newtype wrapper" around a primitive.
//! The wrappers keep a `CardId` from being passed where a `PlayerId` is
//! expected, and `#[serde(transparent)]` keeps the JSON shape flat:
//! `PlayerId(42)` is just `42`, `CardId("k3x")` is just `"k3x"`.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The identity of one live connection inside a room.
///
/// A player entity is keyed by the id of the connection that created it.
/// When the same person reconnects they arrive under a *new* `PlayerId`
/// and are re-linked through their [`PersistentId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

// Hand-written so the id also parses from a string. JSON object keys are
// always strings, and serde's buffering of tagged enums hands those keys
// over without the numeric coercion serde_json normally applies.
impl<'de> Deserialize<'de> for PlayerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PlayerIdVisitor;

        impl Visitor<'_> for PlayerIdVisitor {
            type Value = PlayerId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a player id as a number or numeric string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<PlayerId, E> {
                Ok(PlayerId(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<PlayerId, E> {
                u64::try_from(v)
                    .map(PlayerId)
                    .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<PlayerId, E> {
                v.parse()
                    .map(PlayerId)
                    .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_any(PlayerIdVisitor)
    }
}

/// The name of a room. Rooms are addressed by name, not by number, so
/// players can share a link like `/rooms/friday-night`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

/// Identifier of a single bingo card inside a player's pool.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CardId(pub String);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CardId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A client-chosen identity that survives reconnects.
///
/// The browser keeps this in local storage and sends it with every
/// `joinRoom`. It is not an authentication token; it only lets the room
/// hand a returning player their cards and marks back.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PersistentId(pub String);

impl fmt::Display for PersistentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PersistentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// ---------------------------------------------------------------------------
// Recipient: who should receive a message?
// ---------------------------------------------------------------------------

/// Specifies who should receive a server message.
///
/// The room coordinator pairs every outbound notification with a
/// `Recipient`; the room actor resolves it against the set of live
/// connections. "All" means every live connection in the room, including
/// connections that have not sent `joinRoom` yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every live connection in the room.
    All,

    /// One specific connection.
    Player(PlayerId),

    /// Everyone except the given connection.
    AllExcept(PlayerId),
}

impl Recipient {
    /// Returns `true` if a message for this recipient should reach `id`.
    pub fn includes(&self, id: PlayerId) -> bool {
        match self {
            Self::All => true,
            Self::Player(target) => *target == id,
            Self::AllExcept(excluded) => *excluded != id,
        }
    }
}
