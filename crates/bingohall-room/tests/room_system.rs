//! Integration tests for room actors and the room manager.
//!
//! Timer-driven tests run with paused Tokio time, so a 5 s timeout or a
//! 300 s idle grace completes instantly but in the right order.

use std::time::Duration;

use bingohall_protocol::{CardId, ClientMessage, Phase, PlayerId, RoomId, ServerMessage};
use bingohall_room::{PlayerSender, RoomConfig, RoomHandle, RoomManager, RoomOutbound};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::Instant;

// =========================================================================
// Helpers
// =========================================================================

type Inbox = UnboundedReceiver<RoomOutbound>;

fn channel() -> (PlayerSender, Inbox) {
    mpsc::unbounded_channel()
}

fn room(name: &str) -> RoomId {
    RoomId(name.into())
}

async fn next_message(inbox: &mut Inbox) -> ServerMessage {
    match inbox.recv().await {
        Some(RoomOutbound::Message(msg)) => (*msg).clone(),
        other => panic!("expected a message, got {other:?}"),
    }
}

/// Skips messages until one matches.
async fn wait_for(inbox: &mut Inbox, pred: impl Fn(&ServerMessage) -> bool) -> ServerMessage {
    loop {
        let msg = next_message(inbox).await;
        if pred(&msg) {
            return msg;
        }
    }
}

/// Connects, joins as `name`, and returns the id plus the first card.
async fn join(
    mgr: &mut RoomManager,
    room_id: &RoomId,
    name: &str,
) -> (RoomHandle, PlayerId, CardId, Inbox) {
    let (tx, mut inbox) = channel();
    let (handle, id) = mgr.connect(room_id, tx).await.unwrap();
    handle
        .send_message(
            id,
            ClientMessage::JoinRoom {
                player_name: name.into(),
                persistent_id: Some(name.into()),
            },
        )
        .await
        .unwrap();

    let ServerMessage::CardPool { cards } =
        wait_for(&mut inbox, |m| matches!(m, ServerMessage::CardPool { .. })).await
    else {
        unreachable!()
    };
    (handle, id, cards[0].id.clone(), inbox)
}

/// Host joins, selects a card, and applies `setup` before starting.
async fn start_game(
    mgr: &mut RoomManager,
    room_id: &RoomId,
    setup: Vec<ClientMessage>,
) -> (RoomHandle, PlayerId, Inbox) {
    let (handle, host, card_id, inbox) = join(mgr, room_id, "Host").await;
    handle
        .send_message(
            host,
            ClientMessage::SelectCards {
                card_ids: vec![card_id],
            },
        )
        .await
        .unwrap();
    for msg in setup {
        handle.send_message(host, msg).await.unwrap();
    }
    handle
        .send_message(host, ClientMessage::HostStartGame)
        .await
        .unwrap();
    (handle, host, inbox)
}

// =========================================================================
// RoomManager
// =========================================================================

#[tokio::test]
async fn test_get_or_create_reuses_live_room() {
    let mut mgr = RoomManager::default();
    let a = mgr.get_or_create(&room("a"));
    let again = mgr.get_or_create(&room("a"));
    let b = mgr.get_or_create(&room("b"));

    assert_eq!(a.room_id(), again.room_id());
    assert_ne!(a.room_id(), b.room_id());
    assert_eq!(mgr.room_count(), 2);

    let info_a = a.get_info().await.unwrap();
    let info_again = again.get_info().await.unwrap();
    assert_eq!(info_a, info_again);
}

#[tokio::test]
async fn test_get_room_info_unknown_room() {
    let mgr = RoomManager::default();
    assert!(mgr.get_room_info(&room("nowhere")).await.is_err());
}

#[tokio::test]
async fn test_destroy_room() {
    let mut mgr = RoomManager::default();
    let handle = mgr.get_or_create(&room("gone"));
    mgr.destroy_room(&room("gone")).await.unwrap();

    assert_eq!(mgr.room_count(), 0);
    assert!(mgr.destroy_room(&room("gone")).await.is_err());

    let (tx, _inbox) = channel();
    assert!(handle.connect(tx).await.is_err());
}

// =========================================================================
// Connections
// =========================================================================

#[tokio::test]
async fn test_connect_greets_with_init() {
    let mut mgr = RoomManager::default();
    let (tx, mut inbox) = channel();
    let (handle, id) = mgr.connect(&room("init"), tx).await.unwrap();

    let msg = next_message(&mut inbox).await;
    assert!(matches!(
        msg,
        ServerMessage::Init { player_id, is_host: true, .. } if player_id == id
    ));

    let info = handle.get_info().await.unwrap();
    assert_eq!(info.connections, 1);
    assert_eq!(info.players, 0);
    assert_eq!(info.host_id, Some(id));
}

#[tokio::test]
async fn test_chat_reaches_every_connection() {
    let mut mgr = RoomManager::default();
    let id = room("chat");
    let (handle, host, _, mut host_inbox) = join(&mut mgr, &id, "Host").await;
    let (_, _ana, _, mut ana_inbox) = join(&mut mgr, &id, "Ana").await;

    handle
        .send_message(host, ClientMessage::SendChatMessage { content: "hi".into() })
        .await
        .unwrap();

    for inbox in [&mut host_inbox, &mut ana_inbox] {
        let msg = wait_for(inbox, |m| matches!(m, ServerMessage::ChatMessage { .. })).await;
        assert!(matches!(msg, ServerMessage::ChatMessage { message } if message.content == "hi"));
    }
}

#[tokio::test]
async fn test_kick_sends_kicked_then_closes() {
    let mut mgr = RoomManager::default();
    let id = room("kick");
    let (handle, host, _, _host_inbox) = join(&mut mgr, &id, "Host").await;
    let (_, ana, _, mut ana_inbox) = join(&mut mgr, &id, "Ana").await;

    handle
        .send_message(host, ClientMessage::HostKickPlayer { player_id: ana })
        .await
        .unwrap();

    wait_for(&mut ana_inbox, |m| matches!(m, ServerMessage::Kicked)).await;
    assert!(matches!(ana_inbox.recv().await, Some(RoomOutbound::Close)));
    // The room dropped its sender, so the channel ends.
    assert!(ana_inbox.recv().await.is_none());

    let state = handle.snapshot().await.unwrap();
    assert!(!state.players.contains_key(&ana));
}

#[tokio::test]
async fn test_disconnect_and_reconnect_keeps_cards() {
    let mut mgr = RoomManager::default();
    let id = room("rejoin");
    let (handle, _host, _, _host_inbox) = join(&mut mgr, &id, "Host").await;
    let (_, ana, card_id, _ana_inbox) = join(&mut mgr, &id, "Ana").await;
    handle
        .send_message(
            ana,
            ClientMessage::SelectCards {
                card_ids: vec![card_id.clone()],
            },
        )
        .await
        .unwrap();
    handle.disconnect(ana).await.unwrap();

    let before = handle.snapshot().await.unwrap().players[&ana].clone();
    assert!(!before.connected);

    let (_, back, _, _back_inbox) = join(&mut mgr, &id, "Ana").await;
    let state = handle.snapshot().await.unwrap();
    let after = &state.players[&back];
    assert!(after.connected);
    assert_eq!(after.cards, before.cards);
    assert_eq!(after.selected_card_ids, vec![card_id]);
}

// =========================================================================
// Timers
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_auto_call_never_faster_than_floor() {
    let mut mgr = RoomManager::default();
    let id = room("speed");
    let started = Instant::now();
    let (handle, _host, mut inbox) = start_game(
        &mut mgr,
        &id,
        vec![
            ClientMessage::HostToggleAutoCall { enabled: true },
            ClientMessage::HostSetSpeed { interval_ms: 1000 },
        ],
    )
    .await;

    let mut last = started;
    for _ in 0..3 {
        wait_for(&mut inbox, |m| matches!(m, ServerMessage::NumberCalled { .. })).await;
        let now = Instant::now();
        assert!(now - last >= Duration::from_millis(2000));
        last = now;
    }

    let state = handle.snapshot().await.unwrap();
    assert_eq!(state.settings.call_interval, 2000);
    assert!(state.called_numbers.len() >= 3);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_ends_on_its_own() {
    let mut mgr = RoomManager::default();
    let id = room("timeout");
    let (handle, host, mut inbox) = start_game(&mut mgr, &id, vec![]).await;

    handle
        .send_message(host, ClientMessage::HostCreateTimeout { duration_seconds: 5 })
        .await
        .unwrap();
    wait_for(&mut inbox, |m| matches!(m, ServerMessage::TimeoutStarted { .. })).await;
    let began = Instant::now();
    assert_eq!(handle.get_info().await.unwrap().phase, Phase::Timeout);

    wait_for(&mut inbox, |m| matches!(m, ServerMessage::TimeoutEnded)).await;
    assert!(Instant::now() - began >= Duration::from_secs(5));
    assert_eq!(handle.get_info().await.unwrap().phase, Phase::Playing);
}

#[tokio::test(start_paused = true)]
async fn test_empty_room_shuts_down_after_grace() {
    let mut mgr = RoomManager::new(RoomConfig {
        idle_grace: Duration::from_secs(10),
        ..RoomConfig::default()
    });
    let id = room("idle");
    let (handle, player, _, _inbox) = join(&mut mgr, &id, "Ana").await;
    handle.disconnect(player).await.unwrap();

    // Still alive inside the grace window.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(!handle.is_closed());

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert!(handle.is_closed());
    assert_eq!(mgr.room_count(), 0);

    // The name maps to a brand-new room.
    let (tx, mut inbox) = channel();
    let (fresh, first) = mgr.connect(&id, tx).await.unwrap();
    assert!(!fresh.is_closed());
    assert_eq!(first, PlayerId(1));
    assert!(matches!(
        next_message(&mut inbox).await,
        ServerMessage::Init { is_host: true, ref state, .. } if state.players.is_empty()
    ));
    assert_eq!(mgr.prune(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_idle_rooms_are_swept_when_a_new_room_opens() {
    let mut mgr = RoomManager::new(RoomConfig {
        idle_grace: Duration::from_secs(10),
        ..RoomConfig::default()
    });
    let handles: Vec<_> = (0..5)
        .map(|n| mgr.get_or_create(&room(&format!("passing-{n}"))))
        .collect();
    assert_eq!(mgr.room_count(), 5);

    tokio::time::sleep(Duration::from_secs(11)).await;
    assert!(handles.iter().all(RoomHandle::is_closed));
    assert_eq!(mgr.room_count(), 0);

    let fresh = mgr.get_or_create(&room("newcomer"));
    assert!(!fresh.is_closed());
    // Nothing left to sweep: the five stopped rooms went with the spawn.
    assert_eq!(mgr.prune(), 0);
    assert_eq!(mgr.room_ids(), vec![room("newcomer")]);
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_within_grace_keeps_room() {
    let mut mgr = RoomManager::new(RoomConfig {
        idle_grace: Duration::from_secs(10),
        ..RoomConfig::default()
    });
    let id = room("grace");
    let (handle, player, _, _inbox) = join(&mut mgr, &id, "Ana").await;
    handle.disconnect(player).await.unwrap();
    tokio::time::sleep(Duration::from_secs(8)).await;

    let (again, back, _, _inbox2) = join(&mut mgr, &id, "Ana").await;
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert!(!again.is_closed());
    let state = again.snapshot().await.unwrap();
    assert!(state.players[&back].connected);
    assert_eq!(state.players.len(), 1);
}
