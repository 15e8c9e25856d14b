//! Room actor: an isolated Tokio task that owns one bingo session.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. Commands, the auto-call ticker, the timeout
//! countdown and the idle timer all wake the same loop, so the
//! [`Coordinator`] only ever sees one event at a time.

use std::collections::HashMap;
use std::sync::Arc;

use bingohall_protocol::{ClientMessage, GameState, Phase, PlayerId, Recipient, RoomId, ServerMessage};
use bingohall_tick::Countdown;
use tokio::sync::{mpsc, oneshot};

use crate::{Coordinator, Effect, RoomConfig, RoomError, TimerEvent};

/// An outbound item from the room actor to a connection's writer.
#[derive(Debug, Clone)]
pub enum RoomOutbound {
    /// A notification to encode and send.
    Message(Arc<ServerMessage>),
    /// Close the connection (the player was kicked).
    Close,
}

/// Channel sender for delivering outbound items to one connection.
pub type PlayerSender = mpsc::UnboundedSender<RoomOutbound>;

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    /// Register a connection. Replies with its id.
    Connect {
        sender: PlayerSender,
        reply: oneshot::Sender<PlayerId>,
    },

    /// A decoded command from a connection.
    Message { sender: PlayerId, msg: ClientMessage },

    /// The connection went away.
    Disconnect { player_id: PlayerId },

    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },

    /// Clone of the current session.
    Snapshot {
        reply: oneshot::Sender<GameState>,
    },

    Shutdown,
}

/// A snapshot of room metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub phase: Phase,
    pub host_id: Option<PlayerId>,
    /// Live connections, joined or not.
    pub connections: usize,
    /// Player entities, including disconnected ones.
    pub players: usize,
}

/// Handle to a running room actor. Used to send commands to it.
///
/// Cheap to clone; the [`RoomManager`](crate::RoomManager) holds one per
/// room and connection handlers hold their own.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// `true` once the actor has stopped (idle teardown or shutdown).
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Registers a connection. Outbound notifications, starting with
    /// `init`, arrive on `sender`.
    pub async fn connect(&self, sender: PlayerSender) -> Result<PlayerId, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Connect {
            sender,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Delivers a command from a connection (fire-and-forget).
    pub async fn send_message(&self, sender: PlayerId, msg: ClientMessage) -> Result<(), RoomError> {
        self.send(RoomCommand::Message { sender, msg }).await
    }

    /// Reports that a connection closed.
    pub async fn disconnect(&self, player_id: PlayerId) -> Result<(), RoomError> {
        self.send(RoomCommand::Disconnect { player_id }).await
    }

    pub async fn get_info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::GetInfo { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// A copy of the current session state.
    pub async fn snapshot(&self) -> Result<GameState, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Snapshot { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::Shutdown).await
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender.send(cmd).await.map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.room_id.clone())
    }
}

/// What woke the actor loop.
enum Wake {
    Command(Option<RoomCommand>),
    Timer(TimerEvent),
    Idle,
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room_id: RoomId,
    config: RoomConfig,
    coordinator: Coordinator,
    /// Per-connection outbound channels.
    senders: HashMap<PlayerId, PlayerSender>,
    /// Armed while the room has no connections.
    idle: Countdown,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop until shutdown, idle teardown, or every handle
    /// is dropped.
    async fn run(mut self) {
        tracing::info!(room_id = %self.room_id, "room actor started");
        self.idle.start(self.config.idle_grace);

        loop {
            let wake = tokio::select! {
                cmd = self.receiver.recv() => Wake::Command(cmd),
                event = self.coordinator.next_timer() => Wake::Timer(event),
                _ = self.idle.expired() => Wake::Idle,
            };

            match wake {
                Wake::Command(Some(RoomCommand::Shutdown)) | Wake::Command(None) => {
                    tracing::info!(room_id = %self.room_id, "room shutting down");
                    break;
                }
                Wake::Command(Some(cmd)) => self.handle_command(cmd),
                Wake::Timer(event) => {
                    let effects = self.coordinator.on_timer(event);
                    self.dispatch(effects);
                }
                Wake::Idle => {
                    tracing::info!(
                        room_id = %self.room_id,
                        grace_secs = self.config.idle_grace.as_secs(),
                        "room idle, shutting down"
                    );
                    break;
                }
            }
        }

        tracing::info!(room_id = %self.room_id, "room actor stopped");
    }

    fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Connect { sender, reply } => {
                let (player_id, effects) = self.coordinator.connect();
                self.senders.insert(player_id, sender);
                if let Some(left) = self.idle.remaining() {
                    tracing::debug!(
                        room_id = %self.room_id,
                        left_ms = left.as_millis() as u64,
                        "idle countdown cancelled"
                    );
                }
                self.idle.cancel();
                tracing::info!(
                    room_id = %self.room_id,
                    %player_id,
                    connections = self.senders.len(),
                    "connection opened"
                );
                let _ = reply.send(player_id);
                self.dispatch(effects);
            }
            RoomCommand::Message { sender, msg } => {
                if !self.senders.contains_key(&sender) {
                    tracing::warn!(
                        room_id = %self.room_id,
                        %sender,
                        "message from closed connection, ignoring"
                    );
                    return;
                }
                let effects = self.coordinator.handle(sender, msg);
                self.dispatch(effects);
            }
            RoomCommand::Disconnect { player_id } => {
                self.senders.remove(&player_id);
                let effects = self.coordinator.disconnect(player_id);
                tracing::info!(
                    room_id = %self.room_id,
                    %player_id,
                    connections = self.senders.len(),
                    "connection closed"
                );
                self.dispatch(effects);
                self.arm_idle_if_empty();
            }
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(self.coordinator.state().clone());
            }
            // Handled by the loop.
            RoomCommand::Shutdown => {}
        }
    }

    /// Carries out the coordinator's effects in order.
    fn dispatch(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Send { to, message } => self.deliver(&to, message),
                Effect::Close(player_id) => {
                    if let Some(sender) = self.senders.remove(&player_id) {
                        let _ = sender.send(RoomOutbound::Close);
                    }
                    self.arm_idle_if_empty();
                }
            }
        }
    }

    fn deliver(&self, to: &Recipient, message: Arc<ServerMessage>) {
        if let Recipient::Player(player_id) = to {
            self.send_to(*player_id, RoomOutbound::Message(message));
            return;
        }
        for player_id in self.senders.keys().filter(|id| to.includes(**id)) {
            self.send_to(*player_id, RoomOutbound::Message(Arc::clone(&message)));
        }
    }

    /// Sends an outbound item to a single connection. Drops it if the
    /// writer is gone; the disconnect command is already on its way.
    fn send_to(&self, player_id: PlayerId, item: RoomOutbound) {
        if let Some(sender) = self.senders.get(&player_id) {
            if sender.send(item).is_err() {
                tracing::warn!(
                    room_id = %self.room_id,
                    %player_id,
                    "outbound channel closed, dropping message"
                );
            }
        }
    }

    fn arm_idle_if_empty(&mut self) {
        if self.senders.is_empty() && !self.idle.is_armed() {
            tracing::debug!(room_id = %self.room_id, "room empty, idle countdown started");
            self.idle.start(self.config.idle_grace);
        }
    }

    fn info(&self) -> RoomInfo {
        let state = self.coordinator.state();
        RoomInfo {
            room_id: self.room_id.clone(),
            phase: state.phase,
            host_id: state.host_id,
            connections: self.senders.len(),
            players: state.players.len(),
        }
    }
}

/// Spawns a new room actor task and returns a handle to communicate with it.
pub(crate) fn spawn_room(room_id: RoomId, config: RoomConfig) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));

    let actor = RoomActor {
        room_id: room_id.clone(),
        coordinator: Coordinator::new(room_id.clone(), config.clone()),
        config,
        senders: HashMap::new(),
        idle: Countdown::new(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
    }
}
