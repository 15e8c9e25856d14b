//! Room lifecycle for Bingohall.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns one
//! bingo session. All commands for a room, and both of its timers, are
//! funnelled through that task, so the session has a single writer and
//! never needs a lock.
//!
//! # Key types
//!
//! - [`Coordinator`]: applies commands and timer events to a session and
//!   reports what to send to whom
//! - [`RoomManager`]: creates rooms lazily by name, replaces stopped ones
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`RoomConfig`]: channel size, idle grace, timeout bounds

mod config;
mod coordinator;
mod error;
mod manager;
mod room;

pub use config::RoomConfig;
pub use coordinator::{Coordinator, Effect, TimerEvent};
pub use error::{CommandError, RoomError};
pub use manager::RoomManager;
pub use room::{PlayerSender, RoomHandle, RoomInfo, RoomOutbound};
