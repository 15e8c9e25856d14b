//! Chat log and per-identity player stats.
//!
//! Stats are keyed by [`PersistentId`], not by connection, so they outlive
//! reconnects and game resets. Players who never sent a persistent id
//! simply have no stats.

use bingohall_protocol::{
    ChatKind, ChatMessage, GameState, MAX_CHAT_MESSAGES, PersistentId, PlayerId, PlayerStats,
};
use rand::Rng;

use crate::cards::random_base36;

/// Longest chat message kept, in characters.
pub const MAX_CHAT_LENGTH: usize = 500;

/// Trims a chat message and cuts it to [`MAX_CHAT_LENGTH`] characters.
/// Returns `None` if nothing is left.
pub fn normalize_chat(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_CHAT_LENGTH).collect())
}

/// Appends a chat message, evicting the oldest past [`MAX_CHAT_MESSAGES`].
///
/// Returns the stored message alongside the new state so the caller can
/// broadcast it.
pub fn add_chat_message<R: Rng + ?Sized>(
    mut state: GameState,
    player_id: PlayerId,
    player_name: &str,
    kind: ChatKind,
    content: String,
    now: u64,
    rng: &mut R,
) -> (GameState, ChatMessage) {
    let message = ChatMessage {
        id: format!("msg_{now}_{}", random_base36(rng, 7)),
        player_id,
        player_name: player_name.to_string(),
        kind,
        content,
        timestamp: now,
    };

    state.chat_messages.push(message.clone());
    if state.chat_messages.len() > MAX_CHAT_MESSAGES {
        let excess = state.chat_messages.len() - MAX_CHAT_MESSAGES;
        state.chat_messages.drain(..excess);
    }
    (state, message)
}

/// Creates stats for a new identity or refreshes name and connectivity
/// for a known one. Counters are never touched here.
pub fn update_player_stats(
    mut state: GameState,
    persistent_id: &PersistentId,
    player_name: &str,
    connected: bool,
) -> GameState {
    state
        .player_stats
        .entry(persistent_id.clone())
        .and_modify(|s| {
            s.player_name = player_name.to_string();
            s.connected = connected;
        })
        .or_insert_with(|| PlayerStats {
            persistent_id: persistent_id.clone(),
            player_name: player_name.to_string(),
            wins: 0,
            games_played: 0,
            connected,
        });
    state
}

pub fn set_stats_connection(
    mut state: GameState,
    persistent_id: &PersistentId,
    connected: bool,
) -> GameState {
    if let Some(stats) = state.player_stats.get_mut(persistent_id) {
        stats.connected = connected;
    }
    state
}

/// Counts a game for every identity that has cards in play.
pub fn increment_games_played(mut state: GameState) -> GameState {
    let playing: Vec<PersistentId> = state
        .players
        .values()
        .filter(|p| p.has_selection())
        .filter_map(|p| p.persistent_id.clone())
        .collect();

    for id in playing {
        if let Some(stats) = state.player_stats.get_mut(&id) {
            stats.games_played += 1;
        }
    }
    state
}

pub fn increment_wins(mut state: GameState, persistent_id: &PersistentId) -> GameState {
    if let Some(stats) = state.player_stats.get_mut(persistent_id) {
        stats.wins += 1;
    }
    state
}
