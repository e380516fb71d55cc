mod support;

use duck_race::use_cases::RaceState;
use futures_util::{Stream, StreamExt};
use std::time::Duration;
use support::TestServer;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

// Next text message from the socket, parsed as JSON.
async fn next_json<S>(ws: &mut S) -> serde_json::Value
where
    S: Stream<Item = Result<Message, WsError>> + Unpin,
{
    loop {
        let msg = ws.next().await.expect("stream open").expect("websocket message");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).expect("server sends json");
        }
    }
}

async fn next_frame<S>(ws: &mut S) -> serde_json::Value
where
    S: Stream<Item = Result<Message, WsError>> + Unpin,
{
    loop {
        let msg = next_json(ws).await;
        if msg["type"] == "Frame" {
            return msg;
        }
    }
}

#[tokio::test]
async fn test_race_creation() {
    let server = TestServer::start().await;
    let race_id = format!("test-{}", uuid::Uuid::new_v4());

    let res = server
        .create_race(serde_json::json!({ "race_id": race_id, "level": 2, "seed": 42 }))
        .await;
    assert_eq!(res.status(), reqwest::StatusCode::CREATED);

    let body: serde_json::Value = res.json().await.expect("json body");
    assert_eq!(body["race_id"], race_id.as_str());
    assert_eq!(body["level"], 2);
    assert_eq!(body["seed"], 42);
}

#[tokio::test]
async fn test_generated_race_id_defaults_to_level_one() {
    let server = TestServer::start().await;

    let res = server.create_race(serde_json::json!({})).await;
    assert_eq!(res.status(), reqwest::StatusCode::CREATED);

    let body: serde_json::Value = res.json().await.expect("json body");
    assert!(body["race_id"].as_str().is_some_and(|id| id.starts_with("race-")));
    assert_eq!(body["level"], 1);
}

#[tokio::test]
async fn test_unseeded_races_get_distinct_seeds() {
    let server = TestServer::start().await;

    let mut seeds = Vec::new();
    for _ in 0..2 {
        let body: serde_json::Value = server
            .create_race(serde_json::json!({}))
            .await
            .json()
            .await
            .expect("json body");
        seeds.push(body["seed"].as_u64().expect("seed"));
    }
    assert_ne!(seeds[0], seeds[1]);
}

#[tokio::test]
async fn test_duplicate_race_conflicts() {
    let server = TestServer::start().await;
    let payload = serde_json::json!({ "race_id": "twice" });

    assert_eq!(
        server.create_race(payload.clone()).await.status(),
        reqwest::StatusCode::CREATED
    );
    let res = server.create_race(payload).await;
    assert_eq!(res.status(), reqwest::StatusCode::CONFLICT);

    let body: serde_json::Value = res.json().await.expect("json body");
    assert_eq!(body["error"], "race already exists");
}

#[tokio::test]
async fn test_level_zero_is_rejected() {
    let server = TestServer::start().await;
    let res = server.create_race(serde_json::json!({ "level": 0 })).await;
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_race_waits_for_viewer_then_streams_frames() {
    let server = TestServer::start().await;
    let res = server
        .create_race(serde_json::json!({ "race_id": "viewer", "seed": 7 }))
        .await;
    assert_eq!(res.status(), reqwest::StatusCode::CREATED);

    // Nobody is watching yet, so the clock has not started.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let race = server.registry.get_race("viewer").await.expect("race registered");
    assert!(matches!(*race.race_state_tx.borrow(), RaceState::Waiting));
    drop(race);

    let (mut ws, _) = tokio_tungstenite::connect_async(server.ws_url("viewer"))
        .await
        .expect("websocket should connect");

    let identity = next_json(&mut ws).await;
    assert_eq!(identity["type"], "Identity");
    assert_eq!(identity["data"]["race_id"], "viewer");
    assert_eq!(identity["data"]["level"], 1);

    let state = next_json(&mut ws).await;
    assert_eq!(state["type"], "RaceState");
    assert_eq!(state["data"], "Waiting");

    // Running and the first frame travel on separate channels.
    let mut saw_running = false;
    let frame = loop {
        let msg = next_json(&mut ws).await;
        if msg["type"] == "RaceState" {
            assert_eq!(msg["data"], "Running");
            saw_running = true;
        } else if msg["type"] == "Frame" {
            break msg;
        }
    };
    if !saw_running {
        let running = next_json(&mut ws).await;
        assert_eq!(running["data"], "Running");
    }
    assert_eq!(frame["data"]["tick"], 1);
    let commands = frame["data"]["commands"].as_array().expect("commands array");
    assert_eq!(commands[0]["op"], "clear");
    assert!(commands.iter().any(|c| c["op"] == "dashed_line"));
}

#[tokio::test]
async fn test_ended_race_closes_the_socket() {
    let server = TestServer::start().await;
    server
        .create_race(serde_json::json!({ "race_id": "ending", "seed": 3 }))
        .await;

    let (mut ws, _) = tokio_tungstenite::connect_async(server.ws_url("ending"))
        .await
        .expect("websocket should connect");
    next_frame(&mut ws).await;

    assert!(server.registry.remove_race("ending").await);

    let mut final_state = None;
    let close = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    let msg: serde_json::Value = serde_json::from_str(&text).expect("server sends json");
                    if msg["type"] == "RaceState" {
                        final_state = Some(msg["data"].clone());
                    }
                }
                Some(Ok(Message::Close(frame))) => break frame,
                Some(Ok(_)) => {}
                other => panic!("socket ended without a close frame: {other:?}"),
            }
        }
    })
    .await
    .expect("server closes the socket");

    assert_eq!(final_state, Some(serde_json::json!("Stopped")));
    let close = close.expect("close frame");
    assert_eq!(close.code, CloseCode::Normal);
}
