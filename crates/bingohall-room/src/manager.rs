//! Room manager: creates rooms by name and routes connections to them.

use std::collections::HashMap;

use bingohall_protocol::{PlayerId, RoomId};

use crate::room::spawn_room;
use crate::{PlayerSender, RoomConfig, RoomError, RoomHandle, RoomInfo};

/// Tracks every room by name.
///
/// Rooms are created lazily on the first connection and shut themselves
/// down after sitting empty for [`RoomConfig::idle_grace`]. A handle to a
/// stopped room is replaced transparently the next time its name is used.
pub struct RoomManager {
    rooms: HashMap<RoomId, RoomHandle>,
    config: RoomConfig,
}

impl RoomManager {
    pub fn new(config: RoomConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            config,
        }
    }

    /// Returns the live room with this name, spawning one if needed.
    ///
    /// Spawning also sweeps out handles to rooms that have stopped, so the
    /// map only ever holds as many dead entries as went idle since the last
    /// new room.
    pub fn get_or_create(&mut self, room_id: &RoomId) -> RoomHandle {
        if let Some(handle) = self.rooms.get(room_id) {
            if !handle.is_closed() {
                return handle.clone();
            }
            tracing::info!(%room_id, "replacing stopped room");
        }

        let pruned = self.prune();
        if pruned > 0 {
            tracing::debug!(pruned, "dropped handles to stopped rooms");
        }

        let handle = spawn_room(room_id.clone(), self.config.clone());
        self.rooms.insert(room_id.clone(), handle.clone());
        tracing::info!(%room_id, rooms = self.rooms.len(), "room created");
        handle
    }

    /// Connects to a room by name.
    ///
    /// If the room stops between lookup and connect (its idle countdown
    /// fired), a fresh room is spawned and the connect retried once.
    pub async fn connect(
        &mut self,
        room_id: &RoomId,
        sender: PlayerSender,
    ) -> Result<(RoomHandle, PlayerId), RoomError> {
        let handle = self.get_or_create(room_id);
        match handle.connect(sender.clone()).await {
            Ok(player_id) => Ok((handle, player_id)),
            Err(RoomError::Unavailable(_)) => {
                self.rooms.remove(room_id);
                let handle = self.get_or_create(room_id);
                let player_id = handle.connect(sender).await?;
                Ok((handle, player_id))
            }
            Err(e) => Err(e),
        }
    }

    /// Returns info about a specific room.
    pub async fn get_room_info(&self, room_id: &RoomId) -> Result<RoomInfo, RoomError> {
        let handle = self
            .rooms
            .get(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;
        handle.get_info().await
    }

    /// Shuts down a room and forgets it.
    pub async fn destroy_room(&mut self, room_id: &RoomId) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .remove(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;

        let _ = handle.shutdown().await;
        tracing::info!(%room_id, "room destroyed");
        Ok(())
    }

    /// Drops handles to rooms whose actors have stopped. Returns how many
    /// were removed.
    pub fn prune(&mut self) -> usize {
        let before = self.rooms.len();
        self.rooms.retain(|_, handle| !handle.is_closed());
        before - self.rooms.len()
    }

    /// Number of rooms with a running actor.
    pub fn room_count(&self) -> usize {
        self.rooms.values().filter(|h| !h.is_closed()).count()
    }

    /// Names of rooms with a running actor.
    pub fn room_ids(&self) -> Vec<RoomId> {
        self.rooms
            .iter()
            .filter(|(_, h)| !h.is_closed())
            .map(|(id, _)| id.clone())
            .collect()
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}
