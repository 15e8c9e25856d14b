//! Per-connection handler: room lookup, the writer task, and the read loop.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Pick the room from the request path and register with it
//!   2. Spawn a writer that drains the room's outbound channel
//!   3. Loop: receive frames → decode → forward to the room

use std::sync::Arc;
use std::time::Duration;

use bingohall_protocol::{Codec, PlayerId, RoomId, ServerMessage};
use bingohall_room::{PlayerSender, RoomHandle, RoomOutbound};
use bingohall_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::ServerError;
use crate::server::ServerState;

/// A connection that sends no data frame for this long is dropped.
const IDLE_TIMEOUT: Duration = Duration::from_secs(120);

/// Room used when the request path has no segments.
const DEFAULT_ROOM: &str = "lobby";

/// Extracts the room name from a request path: the last non-empty
/// segment, so `/party/friday` and `/friday/` both name `friday`.
pub fn room_from_path(path: &str) -> RoomId {
    let name = path
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .split('/')
        .rfind(|segment| !segment.is_empty())
        .unwrap_or(DEFAULT_ROOM);
    RoomId(name.to_string())
}

/// Reports the disconnect and stops the writer when the handler exits,
/// including on early error returns.
///
/// `Drop` is synchronous, so the disconnect goes out on a spawned task.
struct ConnectionGuard {
    room: RoomHandle,
    player_id: PlayerId,
    writer: JoinHandle<()>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.writer.abort();
        let room = self.room.clone();
        let player_id = self.player_id;
        tokio::spawn(async move {
            // The room may already be gone; nothing left to clean up then.
            let _ = room.disconnect(player_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), ServerError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    let room_id = room_from_path(conn.path());

    let (tx, rx) = mpsc::unbounded_channel();
    let (room, player_id) = {
        let mut rooms = state.rooms.lock().await;
        rooms.connect(&room_id, tx.clone()).await?
    };
    tracing::info!(%conn_id, %room_id, %player_id, "connection attached to room");

    let writer = tokio::spawn(write_loop(Arc::clone(&conn), Arc::clone(&state), rx));
    let _guard = ConnectionGuard {
        room: room.clone(),
        player_id,
        writer,
    };

    loop {
        let data = match tokio::time::timeout(IDLE_TIMEOUT, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::info!(%room_id, %player_id, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%room_id, %player_id, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(%room_id, %player_id, "connection timed out");
                break;
            }
        };

        match state.codec.decode_command(&data) {
            Ok(msg) => room.send_message(player_id, msg).await?,
            Err(e) => {
                tracing::debug!(%room_id, %player_id, error = %e, "failed to decode command");
                reply_error(&tx, e.client_message());
            }
        }
    }

    // _guard drops here → disconnect reaches the room.
    Ok(())
}

/// Encodes and sends everything the room pushes to this connection.
/// Ends when the room closes the channel or asks for a close.
async fn write_loop(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState>,
    mut rx: mpsc::UnboundedReceiver<RoomOutbound>,
) {
    let conn_id = conn.id();

    while let Some(item) = rx.recv().await {
        match item {
            RoomOutbound::Message(msg) => {
                let bytes = match state.codec.encode(&*msg) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::warn!(%conn_id, error = %e, "failed to encode notification");
                        continue;
                    }
                };
                if let Err(e) = conn.send(&bytes).await {
                    tracing::debug!(%conn_id, error = %e, "send failed, stopping writer");
                    break;
                }
            }
            RoomOutbound::Close => {
                tracing::info!(%conn_id, "closing connection on room request");
                if let Err(e) = conn.close().await {
                    tracing::debug!(%conn_id, error = %e, "close failed");
                }
                break;
            }
        }
    }
}

/// Queues an `error` notification behind anything the room already sent.
fn reply_error(tx: &PlayerSender, message: &str) {
    let item = RoomOutbound::Message(Arc::new(ServerMessage::error(message)));
    if tx.send(item).is_err() {
        tracing::warn!("writer gone, dropping error reply");
    }
}
