//! # Bingohall
//!
//! Real-time multiplayer bingo server.
//!
//! Players open a WebSocket on `/party/<room>`; the last path segment
//! names the room. Every room runs as its own actor with a single writer
//! over the session state, so commands, auto-calls and timeouts are
//! applied one at a time and every participant sees the same snapshot.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bingohall::prelude::*;
//!
//! # async fn run() -> Result<(), ServerError> {
//! let server = BingoServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::ServerError;
pub use handler::room_from_path;
pub use server::{BingoServer, BingoServerBuilder};

pub mod prelude {
    pub use crate::{BingoServer, BingoServerBuilder, ServerError};
    pub use bingohall_protocol::{
        ClientMessage, GameSettings, GameState, Pattern, Phase, PlayerId, RoomId,
        ServerMessage,
    };
    pub use bingohall_room::RoomConfig;
}
