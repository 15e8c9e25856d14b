//! The session coordinator for a single room.
//!
//! [`Coordinator`] is the only code that mutates a room's [`GameState`].
//! Every connection event, client command, and timer event goes through
//! one method call that runs to completion, applies the pure reducers
//! from `bingohall-engine`, and returns the [`Effect`]s the room actor
//! should carry out, in order.
//!
//! It also owns the room's two timers, so "at most one auto-call ticker
//! and one countdown per room" holds by construction.

use std::collections::BTreeSet;
use std::mem;
use std::sync::Arc;
use std::time::Duration;

use bingohall_engine::{reducer, social};
use bingohall_protocol::{
    CardId, ChatKind, ClientMessage, Column, GameState, MIN_CALL_INTERVAL_MS, MAX_CALL_INTERVAL_MS,
    MarkGrid, Pattern, PersistentId, Phase, PlayerId, QuickReaction, Recipient, RoomId,
    ServerMessage, SettingsPatch,
};
use bingohall_tick::{CallTicker, Countdown};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, trace, warn};

use crate::{CommandError, RoomConfig};

/// Something the room actor must do on the coordinator's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Deliver a notification. The message is shared, never mutated
    /// after it is handed out.
    Send {
        to: Recipient,
        message: Arc<ServerMessage>,
    },
    /// Force-close a connection (after a kick).
    Close(PlayerId),
}

/// A timer that fired inside [`Coordinator::next_timer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    AutoCall,
    TimeoutElapsed,
}

/// Owns one room's session and applies everything that happens to it.
pub struct Coordinator {
    room_id: RoomId,
    config: RoomConfig,
    state: GameState,
    /// Live connections, joined or not.
    connections: BTreeSet<PlayerId>,
    next_connection: u64,
    rng: StdRng,
    auto_call: CallTicker,
    countdown: Countdown,
    effects: Vec<Effect>,
}

impl Coordinator {
    /// Creates a coordinator for a fresh lobby, seeded from the OS.
    pub fn new(room_id: RoomId, config: RoomConfig) -> Self {
        Self::with_rng(room_id, config, StdRng::from_os_rng())
    }

    /// Creates a coordinator with a caller-supplied RNG.
    pub fn with_rng(room_id: RoomId, config: RoomConfig, mut rng: StdRng) -> Self {
        let mut state = reducer::create_initial_state(room_id.clone(), &mut rng);
        state.settings = config.settings.clone();
        Self {
            room_id,
            config,
            state,
            connections: BTreeSet::new(),
            next_connection: 1,
            rng,
            auto_call: CallTicker::new(
                Duration::from_millis(MIN_CALL_INTERVAL_MS),
                Duration::from_millis(MAX_CALL_INTERVAL_MS),
            ),
            countdown: Countdown::new(),
            effects: Vec::new(),
        }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// The current session. Read-only: all mutation goes through the
    /// event methods.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn is_connected(&self, id: PlayerId) -> bool {
        self.connections.contains(&id)
    }

    pub fn is_auto_calling(&self) -> bool {
        self.auto_call.is_running()
    }

    /// Effective auto-call pace after clamping, or `None` while off.
    pub fn auto_call_interval(&self) -> Option<Duration> {
        self.auto_call.interval()
    }

    pub fn is_timeout_armed(&self) -> bool {
        self.countdown.is_armed()
    }

    // -----------------------------------------------------------------------
    // Connection events
    // -----------------------------------------------------------------------

    /// Registers a new connection and greets it with `init`.
    ///
    /// The first connection while the room has no host becomes the host.
    pub fn connect(&mut self) -> (PlayerId, Vec<Effect>) {
        let id = PlayerId(self.next_connection);
        self.next_connection += 1;
        self.connections.insert(id);

        if self.state.host_id.is_none() {
            self.state = reducer::set_host(self.take(), Some(id));
            info!(room_id = %self.room_id, player_id = %id, "host assigned");
        }

        self.unicast(
            id,
            ServerMessage::Init {
                player_id: id,
                is_host: self.state.is_host(id),
                state: self.snapshot(),
            },
        );
        (id, self.drain())
    }

    /// Handles a closed connection.
    ///
    /// A joined player stays in the session, marked disconnected, so they
    /// can reconnect later. A host who never joined gives up the host slot.
    pub fn disconnect(&mut self, id: PlayerId) -> Vec<Effect> {
        self.connections.remove(&id);

        if let Some(player) = self.state.player(id) {
            let persistent_id = player.persistent_id.clone();
            self.state = reducer::update_connection(self.take(), id, false);
            if let Some(pid) = persistent_id {
                self.state = social::set_stats_connection(self.take(), &pid, false);
            }
            info!(room_id = %self.room_id, player_id = %id, "player disconnected");
            self.broadcast(ServerMessage::PlayerLeft { player_id: id });
        } else if self.state.is_host(id) {
            self.state = reducer::set_host(self.take(), None);
            info!(room_id = %self.room_id, player_id = %id, "host left before joining");
        }
        self.drain()
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Applies one client command. A refused command yields a single
    /// `error` notification to the sender and leaves the session alone.
    pub fn handle(&mut self, sender: PlayerId, msg: ClientMessage) -> Vec<Effect> {
        let kind = msg.kind();
        if let Err(err) = self.dispatch(sender, msg) {
            debug!(
                room_id = %self.room_id,
                %sender,
                command = kind,
                reason = %err,
                "command rejected"
            );
            self.unicast(sender, ServerMessage::error(err.to_string()));
        }
        self.drain()
    }

    fn dispatch(&mut self, sender: PlayerId, msg: ClientMessage) -> Result<(), CommandError> {
        if msg.is_host_only() && !self.state.is_host(sender) {
            return Err(CommandError::Unauthorized);
        }

        match msg {
            ClientMessage::JoinRoom {
                player_name,
                persistent_id,
            } => self.join_room(sender, player_name, persistent_id),
            ClientMessage::SelectCards { card_ids } => {
                self.update_player(sender, |s| reducer::select_cards(s, sender, &card_ids))
            }
            ClientMessage::RegenerateCards { preserve_selected } => {
                self.regenerate_cards(sender, preserve_selected)
            }
            ClientMessage::MarkCell { card_id, row, col } => {
                self.mark_cell(sender, &card_id, row, col)
            }
            ClientMessage::ClaimBingo {
                card_id,
                marked_grid,
            } => self.claim_bingo(sender, &card_id, &marked_grid),
            ClientMessage::ToggleAutoMark { enabled } => {
                self.update_player(sender, |s| reducer::toggle_auto_mark(s, sender, enabled))
            }
            ClientMessage::ToggleHighlightCalledNumbers { enabled } => {
                self.update_player(sender, |s| reducer::toggle_highlight(s, sender, enabled))
            }
            ClientMessage::PlayerReady => {
                self.update_player(sender, |s| reducer::set_ready(s, sender))
            }
            ClientMessage::PlayerUnready => {
                self.update_player(sender, |s| reducer::set_unready(s, sender))
            }

            ClientMessage::HostStartGame => self.start_game(),
            ClientMessage::HostCallNext => self.call_next(),
            ClientMessage::HostPause => {
                self.pause();
                Ok(())
            }
            ClientMessage::HostResume => {
                self.resume();
                Ok(())
            }
            ClientMessage::HostReset {
                preserve_card_selections,
            } => {
                self.reset(preserve_card_selections.unwrap_or(true));
                Ok(())
            }
            ClientMessage::HostSetPattern { pattern } => {
                self.set_pattern(sender, pattern);
                Ok(())
            }
            ClientMessage::HostSetSpeed { interval_ms } => {
                self.set_speed(interval_ms);
                Ok(())
            }
            ClientMessage::HostToggleAutoCall { enabled } => {
                self.toggle_auto_call(enabled);
                Ok(())
            }
            ClientMessage::HostToggleAllowHighlight { enabled } => {
                let patch = SettingsPatch {
                    allow_highlight_called_numbers: Some(enabled),
                    ..SettingsPatch::default()
                };
                self.state = reducer::update_settings(self.take(), &patch);
                self.broadcast_state();
                Ok(())
            }
            ClientMessage::HostCreateTimeout { duration_seconds } => {
                self.create_timeout(duration_seconds);
                Ok(())
            }
            ClientMessage::HostEndTimeout => {
                if self.state.phase == Phase::Timeout {
                    self.end_timeout();
                }
                Ok(())
            }
            ClientMessage::HostKickPlayer { player_id } => self.kick(sender, player_id),

            ClientMessage::SendChatMessage { content } => {
                let content = social::normalize_chat(&content).ok_or(CommandError::EmptyChatMessage)?;
                self.chat(sender, ChatKind::Text, content);
                Ok(())
            }
            ClientMessage::SendReaction { reaction } => {
                self.react(sender, reaction);
                Ok(())
            }
        }
    }

    fn join_room(
        &mut self,
        sender: PlayerId,
        player_name: String,
        persistent_id: Option<PersistentId>,
    ) -> Result<(), CommandError> {
        // A repeated join from a joined connection just resends its view.
        if self.state.player(sender).is_some() {
            self.send_join_view(sender);
            return Ok(());
        }

        let returning = persistent_id
            .as_ref()
            .and_then(|pid| reducer::find_disconnected_by_persistent_id(&self.state, pid))
            .map(|p| p.id);

        match returning {
            Some(old) => {
                self.state = reducer::reconnect_player(self.take(), old, sender);
                let host = self.state.host_id;
                self.state = reducer::set_host(self.take(), host);
                info!(
                    room_id = %self.room_id,
                    player_id = %sender,
                    previous = %old,
                    "player reconnected"
                );
            }
            None => {
                let is_host = self.state.is_host(sender);
                let player = reducer::create_player(
                    sender,
                    player_name,
                    persistent_id,
                    is_host,
                    &mut self.rng,
                );
                self.state = reducer::add_player(self.take(), player);
                info!(
                    room_id = %self.room_id,
                    player_id = %sender,
                    players = self.state.players.len(),
                    "player joined"
                );
            }
        }

        let Some(player) = self.state.player(sender) else {
            warn!(room_id = %self.room_id, player_id = %sender, "joined player missing");
            return Ok(());
        };
        let player = Box::new(player.clone());
        if let Some(pid) = player.persistent_id.as_ref() {
            self.state = social::update_player_stats(self.take(), pid, &player.name, true);
        }

        self.send(Recipient::AllExcept(sender), ServerMessage::PlayerJoined { player });
        self.send_join_view(sender);
        if returning.is_some() {
            // Everyone else still lists the old connection id.
            self.send(Recipient::AllExcept(sender), ServerMessage::game_state(&self.state));
        }
        Ok(())
    }

    /// Card pool, snapshot, and chat log for a player who just joined.
    fn send_join_view(&mut self, id: PlayerId) {
        let cards = self
            .state
            .player(id)
            .map(|p| p.cards.clone())
            .unwrap_or_default();
        self.unicast(id, ServerMessage::CardPool { cards });
        self.unicast(id, ServerMessage::game_state(&self.state));
        self.unicast(
            id,
            ServerMessage::ChatHistory {
                messages: self.state.chat_messages.clone(),
            },
        );
    }

    /// Applies a per-player reducer and broadcasts the player's new view.
    /// Silently ignored for connections that have not joined.
    fn update_player(
        &mut self,
        id: PlayerId,
        f: impl FnOnce(GameState) -> GameState,
    ) -> Result<(), CommandError> {
        if self.state.player(id).is_none() {
            return Ok(());
        }
        self.state = f(self.take());
        self.broadcast_player(id);
        Ok(())
    }

    fn regenerate_cards(&mut self, id: PlayerId, preserve: bool) -> Result<(), CommandError> {
        if !matches!(self.state.phase, Phase::Lobby | Phase::Timeout) {
            return Err(CommandError::CannotRegenerate);
        }
        if self.state.player(id).is_none() {
            return Ok(());
        }

        self.state = reducer::regenerate_cards(self.take(), id, preserve, &mut self.rng);
        if let Some(player) = self.state.player(id) {
            let cards = player.cards.clone();
            self.unicast(id, ServerMessage::CardPool { cards });
        }
        self.broadcast_player(id);
        Ok(())
    }

    fn mark_cell(
        &mut self,
        id: PlayerId,
        card_id: &CardId,
        row: usize,
        col: usize,
    ) -> Result<(), CommandError> {
        if self.state.phase != Phase::Playing {
            return Ok(());
        }
        self.update_player(id, |s| reducer::mark_cell(s, id, card_id, row, col))
    }

    fn claim_bingo(
        &mut self,
        id: PlayerId,
        card_id: &CardId,
        marked: &MarkGrid,
    ) -> Result<(), CommandError> {
        if self.state.phase != Phase::Playing {
            return Err(CommandError::NotInProgress);
        }

        if let Err(rejection) = reducer::validate_claim(&self.state, id, card_id, marked) {
            debug!(
                room_id = %self.room_id,
                player_id = %id,
                reason = %rejection,
                "bingo claim rejected"
            );
            self.broadcast(ServerMessage::BingoInvalid {
                player_id: id,
                reason: rejection.to_string(),
            });
            return Ok(());
        }

        let now = now_ms();
        self.state = reducer::add_winner(self.take(), id, card_id, marked, now);
        let persistent_id = self.state.player(id).and_then(|p| p.persistent_id.clone());
        if let Some(pid) = persistent_id {
            self.state = social::increment_wins(self.take(), &pid);
        }

        if let Some(winner) = self.state.winners.last().cloned() {
            info!(
                room_id = %self.room_id,
                player_id = %id,
                place = winner.place,
                "bingo validated"
            );
            self.broadcast(ServerMessage::BingoValidated { winner });
        }

        if self.state.phase == Phase::Finished {
            self.stop_timers();
            info!(room_id = %self.room_id, winners = self.state.winners.len(), "game finished");
        }
        self.broadcast_state();
        Ok(())
    }

    fn start_game(&mut self) -> Result<(), CommandError> {
        if self.state.phase != Phase::Lobby {
            return Err(CommandError::AlreadyStarted);
        }
        let players = self.state.players.values();
        if !players.clone().any(|p| p.has_selection()) {
            return Err(CommandError::NoPlayersReady);
        }
        if self.state.settings.require_all_players_ready
            && players.clone().any(|p| p.connected && p.has_selection() && !p.ready_to_play)
        {
            return Err(CommandError::PlayersNotReady);
        }

        self.state = reducer::start_game(self.take(), now_ms());
        self.state = social::increment_games_played(self.take());
        info!(
            room_id = %self.room_id,
            players = self.state.players.len(),
            pattern = %self.state.current_pattern.id,
            "game started"
        );
        self.broadcast(ServerMessage::GameStarted {
            state: self.snapshot(),
        });

        if self.state.settings.auto_call {
            self.start_auto_call();
        }
        Ok(())
    }

    fn call_next(&mut self) -> Result<(), CommandError> {
        if self.state.phase != Phase::Playing {
            return Ok(());
        }
        if self.state.is_exhausted() {
            return Err(CommandError::Exhausted);
        }
        self.call_number();
        Ok(())
    }

    fn pause(&mut self) {
        if self.state.phase != Phase::Playing {
            return;
        }
        self.auto_call.stop();
        self.state = reducer::pause_game(self.take());
        info!(room_id = %self.room_id, "game paused");
        self.broadcast(ServerMessage::GamePaused);
        self.broadcast_state();
    }

    fn resume(&mut self) {
        if self.state.phase != Phase::Paused {
            return;
        }
        self.state = reducer::resume_game(self.take(), now_ms());
        info!(room_id = %self.room_id, "game resumed");
        self.broadcast(ServerMessage::GameResumed {
            state: self.snapshot(),
        });
        if self.state.settings.auto_call {
            self.start_auto_call();
        }
    }

    fn reset(&mut self, preserve_card_selections: bool) {
        self.stop_timers();
        self.state = reducer::reset_game(self.take(), preserve_card_selections, &mut self.rng);
        info!(room_id = %self.room_id, preserve_card_selections, "game reset");

        let mut pools: Vec<_> = self
            .state
            .players
            .values()
            .map(|p| (p.id, p.cards.clone()))
            .collect();
        pools.sort_unstable_by_key(|(id, _)| *id);
        for (id, cards) in pools {
            self.unicast(id, ServerMessage::CardPool { cards });
        }
        self.broadcast(ServerMessage::GameReset {
            state: self.snapshot(),
        });
    }

    fn set_pattern(&mut self, sender: PlayerId, pattern: Pattern) {
        let changed_by = self
            .state
            .player(sender)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| sender.to_string());
        info!(room_id = %self.room_id, pattern = %pattern.id, "pattern changed");

        self.state = reducer::update_pattern(self.take(), pattern.clone());
        self.broadcast(ServerMessage::PatternChanged {
            pattern,
            changed_by,
        });
        self.broadcast_state();
    }

    fn set_speed(&mut self, interval_ms: u64) {
        let patch = SettingsPatch {
            call_interval: Some(interval_ms),
            ..SettingsPatch::default()
        };
        self.state = reducer::update_settings(self.take(), &patch);
        debug!(
            room_id = %self.room_id,
            requested_ms = interval_ms,
            interval_ms = self.state.settings.call_interval,
            "call speed changed"
        );
        self.broadcast_state();

        if self.state.settings.auto_call && self.state.phase == Phase::Playing {
            self.start_auto_call();
        }
    }

    fn toggle_auto_call(&mut self, enabled: bool) {
        let patch = SettingsPatch {
            auto_call: Some(enabled),
            ..SettingsPatch::default()
        };
        self.state = reducer::update_settings(self.take(), &patch);
        self.broadcast_state();

        if enabled && self.state.phase == Phase::Playing {
            self.start_auto_call();
        } else {
            self.auto_call.stop();
        }
    }

    fn create_timeout(&mut self, duration_seconds: u64) {
        if self.state.phase != Phase::Playing {
            return;
        }
        let seconds = self.config.clamp_timeout(duration_seconds);

        self.auto_call.stop();
        self.state = reducer::start_timeout(self.take(), seconds, now_ms());
        info!(room_id = %self.room_id, seconds, "timeout started");

        if let Some(end_time) = self.state.timeout_end_time {
            self.broadcast(ServerMessage::TimeoutStarted { end_time });
        }
        self.broadcast_state();
        self.countdown.start(Duration::from_secs(seconds));
    }

    fn end_timeout(&mut self) {
        self.countdown.cancel();
        self.state = reducer::end_timeout(self.take(), now_ms());
        info!(room_id = %self.room_id, "timeout ended");

        self.broadcast(ServerMessage::TimeoutEnded);
        self.broadcast_state();
        if self.state.settings.auto_call {
            self.start_auto_call();
        }
    }

    fn kick(&mut self, sender: PlayerId, target: PlayerId) -> Result<(), CommandError> {
        if target == sender {
            return Err(CommandError::CannotKickSelf);
        }
        let persistent_id = match self.state.player(target) {
            Some(player) => player.persistent_id.clone(),
            None if self.connections.contains(&target) => None,
            None => return Err(CommandError::PlayerNotFound),
        };

        self.unicast(target, ServerMessage::Kicked);
        self.effects.push(Effect::Close(target));
        self.connections.remove(&target);

        if let Some(pid) = persistent_id {
            self.state = social::set_stats_connection(self.take(), &pid, false);
        }
        self.state = reducer::remove_player(self.take(), target);
        info!(room_id = %self.room_id, player_id = %target, "player kicked");

        self.broadcast(ServerMessage::PlayerLeft { player_id: target });
        self.broadcast_state();
        Ok(())
    }

    fn react(&mut self, sender: PlayerId, reaction: QuickReaction) {
        self.chat(sender, ChatKind::Reaction, reaction.key().to_string());
    }

    fn chat(&mut self, sender: PlayerId, kind: ChatKind, content: String) {
        let Some(name) = self.state.player(sender).map(|p| p.name.clone()) else {
            return;
        };
        let (state, message) = social::add_chat_message(
            self.take(),
            sender,
            &name,
            kind,
            content,
            now_ms(),
            &mut self.rng,
        );
        self.state = state;
        self.broadcast(ServerMessage::ChatMessage { message });
    }

    // -----------------------------------------------------------------------
    // Timers
    // -----------------------------------------------------------------------

    /// Waits for whichever room timer fires next. Pends forever while
    /// neither is running. Cancel-safe.
    pub async fn next_timer(&mut self) -> TimerEvent {
        tokio::select! {
            _ = self.auto_call.tick() => TimerEvent::AutoCall,
            _ = self.countdown.expired() => TimerEvent::TimeoutElapsed,
        }
    }

    /// Applies a fired timer.
    pub fn on_timer(&mut self, event: TimerEvent) -> Vec<Effect> {
        match event {
            TimerEvent::AutoCall => self.auto_call_tick(),
            TimerEvent::TimeoutElapsed => {
                if self.state.phase == Phase::Timeout {
                    self.end_timeout();
                }
            }
        }
        self.drain()
    }

    fn auto_call_tick(&mut self) {
        if self.state.phase != Phase::Playing || self.state.is_exhausted() {
            self.auto_call.stop();
            return;
        }
        self.call_number();
        if self.state.is_exhausted() {
            debug!(
                room_id = %self.room_id,
                ticks = self.auto_call.ticks(),
                "draw exhausted, auto-call stopped"
            );
            self.auto_call.stop();
        }
    }

    fn start_auto_call(&mut self) {
        let requested = Duration::from_millis(self.state.settings.call_interval);
        self.auto_call.start(requested);
        if let Some(interval) = self.auto_call.interval() {
            debug!(
                room_id = %self.room_id,
                interval_ms = interval.as_millis() as u64,
                "auto-call running"
            );
        }
    }

    fn stop_timers(&mut self) {
        self.auto_call.stop();
        self.countdown.cancel();
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn call_number(&mut self) {
        self.state = reducer::call_next_number(self.take(), now_ms());
        let Some(call) = self.state.last_call().cloned() else {
            return;
        };
        trace!(
            room_id = %self.room_id,
            number = %Column::announce(call.number),
            remaining = self.state.remaining_numbers.len(),
            "number called"
        );
        self.broadcast(ServerMessage::NumberCalled {
            call,
            state: self.snapshot(),
        });
    }

    /// Moves the session out for a by-value reducer. The caller must put
    /// the next state back before returning.
    fn take(&mut self) -> GameState {
        mem::take(&mut self.state)
    }

    fn snapshot(&self) -> Box<GameState> {
        Box::new(self.state.clone())
    }

    fn send(&mut self, to: Recipient, message: ServerMessage) {
        self.effects.push(Effect::Send {
            to,
            message: Arc::new(message),
        });
    }

    fn unicast(&mut self, id: PlayerId, message: ServerMessage) {
        self.send(Recipient::Player(id), message);
    }

    fn broadcast(&mut self, message: ServerMessage) {
        self.send(Recipient::All, message);
    }

    fn broadcast_state(&mut self) {
        let message = ServerMessage::game_state(&self.state);
        self.broadcast(message);
    }

    fn broadcast_player(&mut self, id: PlayerId) {
        if let Some(player) = self.state.player(id) {
            let player = Box::new(player.clone());
            self.broadcast(ServerMessage::PlayerUpdated { player });
        }
    }

    fn drain(&mut self) -> Vec<Effect> {
        mem::take(&mut self.effects)
    }
}

/// Wall-clock milliseconds since the Unix epoch.
fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}
