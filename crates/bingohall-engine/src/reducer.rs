//! Pure session transitions.
//!
//! Every reducer takes the current [`GameState`] by value and returns the
//! next one. A reducer whose preconditions don't hold (unknown player,
//! exhausted draw, uncalled number) returns the state unchanged instead of
//! failing; the room coordinator decides whether the sender hears about it.
//!
//! Phase and authorization gating is *not* done here. These functions
//! assume the caller already checked that the command is allowed.

use bingohall_protocol::{
    CARD_POOL_SIZE, CardId, Cell, Column, GRID_SIZE, GameSettings, GameState, MAX_SELECTED_CARDS,
    MarkGrid, NumberCall, Pattern, PersistentId, Phase, Player, PlayerId, RoomId, SettingsPatch,
    Winner,
};
use rand::Rng;

use crate::ClaimRejection;
use crate::cards::{
    empty_mark_grid, generate_card_pool, generate_card_pool_avoiding, generate_shuffled_numbers,
};
use crate::matcher;

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// A fresh lobby with a newly shuffled draw order and default settings.
pub fn create_initial_state<R: Rng + ?Sized>(room_id: RoomId, rng: &mut R) -> GameState {
    GameState {
        room_id,
        remaining_numbers: generate_shuffled_numbers(rng),
        ..GameState::default()
    }
}

/// A connected player with a fresh card pool and nothing selected.
pub fn create_player<R: Rng + ?Sized>(
    id: PlayerId,
    name: impl Into<String>,
    persistent_id: Option<PersistentId>,
    is_host: bool,
    rng: &mut R,
) -> Player {
    Player {
        id,
        persistent_id,
        name: name.into(),
        is_host,
        connected: true,
        cards: generate_card_pool(CARD_POOL_SIZE, rng),
        selected_card_ids: Vec::new(),
        marked_cells: Default::default(),
        auto_mark: false,
        ready_to_play: false,
        highlight_called_numbers: true,
    }
}

// ---------------------------------------------------------------------------
// Player map
// ---------------------------------------------------------------------------

pub fn add_player(mut state: GameState, player: Player) -> GameState {
    state.players.insert(player.id, player);
    state
}

pub fn remove_player(mut state: GameState, id: PlayerId) -> GameState {
    state.players.remove(&id);
    state
}

pub fn update_connection(state: GameState, id: PlayerId, connected: bool) -> GameState {
    with_player(state, id, |p| p.connected = connected)
}

/// Finds a disconnected player entity that carries `persistent_id`.
///
/// Live entities are skipped: two tabs may share one stored id, and only
/// the one that dropped is waiting to be picked up again.
pub fn find_disconnected_by_persistent_id<'a>(
    state: &'a GameState,
    persistent_id: &PersistentId,
) -> Option<&'a Player> {
    state
        .players
        .values()
        .find(|p| !p.connected && p.persistent_id.as_ref() == Some(persistent_id))
}

/// Moves a player entity from `old` to the new connection id `new`.
///
/// Cards, selection, marks and flags carry over unchanged. Host identity
/// and any winner entries follow the player to the new id.
pub fn reconnect_player(mut state: GameState, old: PlayerId, new: PlayerId) -> GameState {
    let Some(mut player) = state.players.remove(&old) else {
        return state;
    };
    player.id = new;
    player.connected = true;
    state.players.insert(new, player);

    if state.host_id == Some(old) {
        state.host_id = Some(new);
    }
    for winner in state.winners.iter_mut().filter(|w| w.player_id == old) {
        winner.player_id = new;
    }
    state
}

/// Sets (or clears) the host and keeps every player's `is_host` in sync.
pub fn set_host(mut state: GameState, host: Option<PlayerId>) -> GameState {
    state.host_id = host;
    for player in state.players.values_mut() {
        player.is_host = Some(player.id) == host;
    }
    state
}

// ---------------------------------------------------------------------------
// Cards and marks
// ---------------------------------------------------------------------------

/// Selects cards to play.
///
/// Ids not in the player's pool are dropped, duplicates are collapsed, and
/// anything past [`MAX_SELECTED_CARDS`] is silently cut. Marks are reset to
/// a fresh grid for exactly the resulting selection.
pub fn select_cards(state: GameState, id: PlayerId, card_ids: &[CardId]) -> GameState {
    with_player(state, id, |player| {
        let mut selected: Vec<CardId> = Vec::with_capacity(MAX_SELECTED_CARDS);
        for card_id in card_ids {
            if selected.len() == MAX_SELECTED_CARDS {
                break;
            }
            if player.card(card_id).is_some() && !selected.contains(card_id) {
                selected.push(card_id.clone());
            }
        }

        player.marked_cells = selected
            .iter()
            .map(|card_id| (card_id.clone(), empty_mark_grid()))
            .collect();
        player.selected_card_ids = selected;
    })
}

/// Replaces a player's card pool.
///
/// With `preserve_selected` and a non-empty selection, the selected cards
/// and their marks stay and only the other slots are refilled, never with a
/// copy of a kept grid. Otherwise
/// the whole pool is replaced and selection, marks and readiness reset.
pub fn regenerate_cards<R: Rng + ?Sized>(
    state: GameState,
    id: PlayerId,
    preserve_selected: bool,
    rng: &mut R,
) -> GameState {
    with_player(state, id, |player| {
        if preserve_selected && player.has_selection() {
            let mut cards: Vec<_> = player
                .cards
                .iter()
                .filter(|c| player.is_selected(&c.id))
                .cloned()
                .collect();
            let refill = CARD_POOL_SIZE.saturating_sub(cards.len());
            let fresh = generate_card_pool_avoiding(refill, &cards, rng);
            cards.extend(fresh);
            player.cards = cards;
        } else {
            clear_cards(player, rng);
        }
    })
}

/// Toggles one cell on one of the player's selected cards.
///
/// Only numbers that have already been called can be toggled. The free
/// center always stays marked, so touching it changes nothing.
pub fn mark_cell(
    mut state: GameState,
    id: PlayerId,
    card_id: &CardId,
    row: usize,
    col: usize,
) -> GameState {
    if row >= GRID_SIZE || col >= GRID_SIZE {
        return state;
    }
    let Some(player) = state.players.get_mut(&id) else {
        return state;
    };
    let Some(Cell::Number(n)) = player.card(card_id).and_then(|c| c.cell(row, col)) else {
        return state;
    };
    if !state.called_numbers.contains(&n) {
        return state;
    }
    if let Some(grid) = player.marked_cells.get_mut(card_id) {
        grid[row][col] = !grid[row][col];
    }
    state
}

/// Marks `number` on every selected card of every auto-marking player.
pub fn auto_mark_number(mut state: GameState, number: u8) -> GameState {
    for player in state.players.values_mut().filter(|p| p.auto_mark) {
        for card_id in &player.selected_card_ids {
            let Some(card) = player.cards.iter().find(|c| &c.id == card_id) else {
                continue;
            };
            let Some(grid) = player.marked_cells.get_mut(card_id) else {
                continue;
            };
            for (r, row) in card.grid.iter().enumerate() {
                for (c, cell) in row.iter().enumerate() {
                    if *cell == Cell::Number(number) {
                        grid[r][c] = true;
                    }
                }
            }
        }
    }
    state
}

pub fn toggle_auto_mark(state: GameState, id: PlayerId, enabled: bool) -> GameState {
    with_player(state, id, |p| p.auto_mark = enabled)
}

/// Turning highlighting on is ignored while the host disallows it.
pub fn toggle_highlight(state: GameState, id: PlayerId, enabled: bool) -> GameState {
    if enabled && !state.settings.allow_highlight_called_numbers {
        return state;
    }
    with_player(state, id, |p| p.highlight_called_numbers = enabled)
}

/// A player can only be ready once they have selected at least one card.
pub fn set_ready(state: GameState, id: PlayerId) -> GameState {
    with_player(state, id, |p| {
        if p.has_selection() {
            p.ready_to_play = true;
        }
    })
}

pub fn set_unready(state: GameState, id: PlayerId) -> GameState {
    with_player(state, id, |p| p.ready_to_play = false)
}

// ---------------------------------------------------------------------------
// Calling and claims
// ---------------------------------------------------------------------------

/// Draws the next number. A no-op once the draw order is exhausted.
pub fn call_next_number(mut state: GameState, now: u64) -> GameState {
    if state.remaining_numbers.is_empty() {
        return state;
    }
    let number = state.remaining_numbers.remove(0);

    state.called_numbers.push(number);
    state.call_history.push(NumberCall {
        number,
        column: Column::for_number(number),
        timestamp: now,
    });
    state.current_number = Some(number);
    state.last_call_time = now;

    auto_mark_number(state, number)
}

/// Runs the claim checks in order and reports the first one that fails.
pub fn validate_claim(
    state: &GameState,
    id: PlayerId,
    card_id: &CardId,
    marked: &MarkGrid,
) -> Result<(), ClaimRejection> {
    let player = state.players.get(&id).ok_or(ClaimRejection::PlayerNotFound)?;
    let card = player.card(card_id).ok_or(ClaimRejection::CardNotFound)?;

    if !player.is_selected(card_id) {
        return Err(ClaimRejection::CardNotSelected);
    }
    if !matcher::validate_marks(card, marked, &state.called_numbers) {
        return Err(ClaimRejection::UncalledMarks);
    }
    if !matcher::matches(marked, &state.current_pattern) {
        return Err(ClaimRejection::PatternIncomplete);
    }
    if state.has_won(id) {
        return Err(ClaimRejection::AlreadyWon);
    }
    if state.winners.len() >= state.settings.max_winners as usize {
        return Err(ClaimRejection::MaxWinnersReached);
    }
    Ok(())
}

/// Records a winner in the next place and finishes the game when no more
/// winners are allowed.
pub fn add_winner(
    mut state: GameState,
    id: PlayerId,
    card_id: &CardId,
    marked: &MarkGrid,
    now: u64,
) -> GameState {
    let Some(player) = state.players.get(&id) else {
        return state;
    };

    let winner = Winner {
        player_id: id,
        player_name: player.name.clone(),
        card_id: card_id.clone(),
        place: state.winners.len() as u32 + 1,
        timestamp: now,
        winning_pattern: matcher::winning_cells(marked, &state.current_pattern),
    };
    state.winners.push(winner);

    let settings = &state.settings;
    if !settings.allow_multiple_winners || state.winners.len() >= settings.max_winners as usize {
        state.phase = Phase::Finished;
    }
    state
}

// ---------------------------------------------------------------------------
// Phase transitions
// ---------------------------------------------------------------------------

pub fn start_game(mut state: GameState, now: u64) -> GameState {
    state.phase = Phase::Playing;
    state.last_call_time = now;
    state
}

pub fn pause_game(mut state: GameState) -> GameState {
    state.phase = Phase::Paused;
    state
}

pub fn resume_game(mut state: GameState, now: u64) -> GameState {
    state.phase = Phase::Playing;
    state.last_call_time = now;
    state
}

/// Returns to the lobby with a new draw order.
///
/// With `preserve_card_selections`, players who had selected cards keep
/// their pool and selection, get fresh marks, and are marked ready. Every
/// other player gets a new pool and starts over.
pub fn reset_game<R: Rng + ?Sized>(
    mut state: GameState,
    preserve_card_selections: bool,
    rng: &mut R,
) -> GameState {
    // Fixed order so a seeded rng reproduces the same pools.
    let mut ids: Vec<PlayerId> = state.players.keys().copied().collect();
    ids.sort_unstable();

    for id in ids {
        let Some(player) = state.players.get_mut(&id) else {
            continue;
        };
        if preserve_card_selections && player.has_selection() {
            player.marked_cells = player
                .selected_card_ids
                .iter()
                .map(|card_id| (card_id.clone(), empty_mark_grid()))
                .collect();
            player.ready_to_play = true;
        } else {
            clear_cards(player, rng);
        }
    }

    state.phase = Phase::Lobby;
    state.called_numbers.clear();
    state.remaining_numbers = generate_shuffled_numbers(rng);
    state.current_number = None;
    state.call_history.clear();
    state.winners.clear();
    state.last_call_time = 0;
    state.timeout_end_time = None;
    state
}

pub fn start_timeout(mut state: GameState, duration_seconds: u64, now: u64) -> GameState {
    state.phase = Phase::Timeout;
    state.timeout_end_time = Some(now.saturating_add(duration_seconds.saturating_mul(1_000)));
    state
}

pub fn end_timeout(mut state: GameState, now: u64) -> GameState {
    state.phase = Phase::Playing;
    state.timeout_end_time = None;
    state.last_call_time = now;
    state
}

// ---------------------------------------------------------------------------
// Settings and pattern
// ---------------------------------------------------------------------------

/// Merges `patch` into the settings. The call interval is clamped.
pub fn update_settings(mut state: GameState, patch: &SettingsPatch) -> GameState {
    let s = &mut state.settings;
    if let Some(v) = patch.auto_call {
        s.auto_call = v;
    }
    if let Some(v) = patch.call_interval {
        s.call_interval = GameSettings::clamp_interval(v);
    }
    if let Some(v) = patch.allow_multiple_winners {
        s.allow_multiple_winners = v;
    }
    if let Some(v) = patch.max_winners {
        s.max_winners = v;
    }
    if let Some(v) = patch.require_all_players_ready {
        s.require_all_players_ready = v;
    }
    if let Some(v) = patch.allow_highlight_called_numbers {
        s.allow_highlight_called_numbers = v;
    }
    state
}

pub fn update_pattern(mut state: GameState, pattern: Pattern) -> GameState {
    state.current_pattern = pattern;
    state
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn with_player(mut state: GameState, id: PlayerId, f: impl FnOnce(&mut Player)) -> GameState {
    if let Some(player) = state.players.get_mut(&id) {
        f(player);
    }
    state
}

fn clear_cards<R: Rng + ?Sized>(player: &mut Player, rng: &mut R) {
    player.cards = generate_card_pool(CARD_POOL_SIZE, rng);
    player.selected_card_ids.clear();
    player.marked_cells.clear();
    player.ready_to_play = false;
}
