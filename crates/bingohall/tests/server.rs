//! Integration tests for the server, handler, and full connection flow.
//!
//! Clients speak raw JSON, the way a browser would.

use std::time::Duration;

use bingohall::BingoServerBuilder;
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port and returns the address.
async fn start_server() -> String {
    let server = BingoServerBuilder::new()
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

async fn connect(addr: &str, room: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/party/{room}"))
        .await
        .expect("should connect");
    ws
}

async fn send_json(ws: &mut ClientWs, value: Value) {
    ws.send(Message::text(value.to_string()))
        .await
        .expect("send");
}

/// Next JSON notification. Panics on close or after 5 s of silence.
async fn recv_json(ws: &mut ClientWs) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for a message")
            .expect("stream ended")
            .expect("recv");
        match msg {
            Message::Text(_) | Message::Binary(_) => {
                return serde_json::from_slice(&msg.into_data()).expect("decode");
            }
            Message::Close(_) => panic!("connection closed"),
            _ => continue,
        }
    }
}

/// Skips notifications until one with this `type` arrives.
async fn wait_for(ws: &mut ClientWs, kind: &str) -> Value {
    loop {
        let msg = recv_json(ws).await;
        if msg["type"] == kind {
            return msg;
        }
    }
}

/// Connects and joins; returns the socket, the player id and the first
/// card id of the pool.
async fn join(addr: &str, room: &str, name: &str) -> (ClientWs, Value, Value) {
    let mut ws = connect(addr, room).await;
    let init = wait_for(&mut ws, "init").await;
    send_json(
        &mut ws,
        json!({"type": "joinRoom", "playerName": name, "persistentId": name}),
    )
    .await;
    let pool = wait_for(&mut ws, "cardPool").await;
    (ws, init["playerId"].clone(), pool["cards"][0]["id"].clone())
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_first_connection_is_host() {
    let addr = start_server().await;
    let mut host = connect(&addr, "hosting").await;
    let init = recv_json(&mut host).await;

    assert_eq!(init["type"], "init");
    assert_eq!(init["isHost"], true);
    assert_eq!(init["state"]["phase"], "lobby");
    assert_eq!(init["state"]["hostId"], init["playerId"]);

    let mut guest = connect(&addr, "hosting").await;
    let init = recv_json(&mut guest).await;
    assert_eq!(init["isHost"], false);
}

#[tokio::test]
async fn test_join_sends_pool_and_announces_player() {
    let addr = start_server().await;
    let (mut host, _, _) = join(&addr, "joining", "Host").await;
    let (_ana, ana_id, card_id) = join(&addr, "joining", "Ana").await;

    assert!(card_id.is_string());
    let joined = wait_for(&mut host, "playerJoined").await;
    assert_eq!(joined["player"]["id"], ana_id);
    assert_eq!(joined["player"]["name"], "Ana");
}

#[tokio::test]
async fn test_rooms_are_isolated() {
    let addr = start_server().await;
    let (mut red, _, _) = join(&addr, "red", "Host").await;
    let (mut blue, _, _) = join(&addr, "blue", "Host").await;

    send_json(&mut red, json!({"type": "sendChatMessage", "content": "red only"})).await;
    let chat = wait_for(&mut red, "chatMessage").await;
    assert_eq!(chat["message"]["content"], "red only");

    send_json(&mut blue, json!({"type": "sendChatMessage", "content": "blue only"})).await;
    let chat = wait_for(&mut blue, "chatMessage").await;
    assert_eq!(chat["message"]["content"], "blue only");
}

#[tokio::test]
async fn test_malformed_json_gets_error() {
    let addr = start_server().await;
    let mut ws = connect(&addr, "garbage").await;
    wait_for(&mut ws, "init").await;

    ws.send(Message::text("{not json".to_string())).await.expect("send");
    let err = wait_for(&mut ws, "error").await;
    assert_eq!(err["message"], "Invalid message format");

    // The connection survives.
    send_json(&mut ws, json!({"type": "hostDance"})).await;
    let err = wait_for(&mut ws, "error").await;
    assert_eq!(err["message"], "Unknown message type");
}

#[tokio::test]
async fn test_non_host_command_is_rejected() {
    let addr = start_server().await;
    let (_host, _, _) = join(&addr, "rules", "Host").await;
    let (mut ana, _, _) = join(&addr, "rules", "Ana").await;

    send_json(&mut ana, json!({"type": "hostStartGame"})).await;
    let err = wait_for(&mut ana, "error").await;
    assert_eq!(err["message"], "Not authorized");
}

#[tokio::test]
async fn test_game_flow_over_the_wire() {
    let addr = start_server().await;
    let (mut host, _, card_id) = join(&addr, "flow", "Host").await;

    send_json(&mut host, json!({"type": "selectCards", "cardIds": [card_id]})).await;
    send_json(&mut host, json!({"type": "hostStartGame"})).await;
    let started = wait_for(&mut host, "gameStarted").await;
    assert_eq!(started["state"]["phase"], "playing");

    send_json(&mut host, json!({"type": "hostCallNext"})).await;
    let called = wait_for(&mut host, "numberCalled").await;
    let number = called["call"]["number"].as_u64().expect("number");
    assert!((1..=75).contains(&number));
    assert_eq!(called["state"]["calledNumbers"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_kick_closes_socket() {
    let addr = start_server().await;
    let (mut host, _, _) = join(&addr, "kicking", "Host").await;
    let (mut ana, ana_id, _) = join(&addr, "kicking", "Ana").await;

    send_json(&mut host, json!({"type": "hostKickPlayer", "playerId": ana_id})).await;
    wait_for(&mut ana, "kicked").await;

    let closed = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match ana.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "kicked socket should close");

    let left = wait_for(&mut host, "playerLeft").await;
    assert_eq!(left["playerId"], ana_id);
}
