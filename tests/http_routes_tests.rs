use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use mixmo::{
    event::{EventBus, RoomEvent},
    game::{InMemoryGameRepository, LETTER_FREQUENCIES},
    room::InMemoryRoomRepository,
    session::TokenConfig,
    app_router, AppState, ServerConfig,
};

fn test_state() -> AppState {
    AppState::new(
        ServerConfig::default(),
        TokenConfig::with_secret("integration-secret", 1),
        Arc::new(InMemoryRoomRepository::new()),
        Arc::new(InMemoryGameRepository::new()),
        EventBus::new(),
    )
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(value) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Creates a session and returns (token, player_id)
async fn new_player(app: &Router) -> (String, String) {
    let (status, body) = send(app, Method::POST, "/session", None, None).await;
    assert_eq!(status, StatusCode::OK);
    (
        body["token"].as_str().unwrap().to_string(),
        body["player_id"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn test_two_players_start_and_play_over_http() {
    let state = test_state();
    let app = app_router(state.clone());

    let (alice_token, alice_id) = new_player(&app).await;
    let (bob_token, bob_id) = new_player(&app).await;

    let (status, room) = send(&app, Method::POST, "/rooms", Some(&alice_token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    let room_id = room["id"].as_str().unwrap().to_string();
    assert_eq!(room["owner_id"], alice_id);
    assert_eq!(room["state"], "waiting");

    let mut events = state.event_bus.subscribe_to_room(&room_id).await;

    let (status, room) = send(
        &app,
        Method::POST,
        &format!("/rooms/{}/join", room_id),
        Some(&bob_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(room["player_count"], 2);
    assert!(matches!(
        events.recv().await.unwrap(),
        RoomEvent::StateChanged { .. }
    ));

    let (status, view) = send(
        &app,
        Method::POST,
        &format!("/rooms/{}/start", room_id),
        Some(&alice_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["state"], "active");
    assert_eq!(view["rack"].as_array().unwrap().len(), 6);
    assert!(events.recv().await.is_ok());

    let first_seq = view["rack"][0]["seq"].as_u64().unwrap();
    let (status, view) = send(
        &app,
        Method::POST,
        &format!("/rooms/{}/tiles/place", room_id),
        Some(&alice_token),
        Some(json!({ "seq": first_seq, "x": 0, "y": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["board"].as_array().unwrap().len(), 1);
    assert_eq!(view["rack"].as_array().unwrap().len(), 5);

    // Bob sees counts of Alice's tiles, never the tiles themselves
    let (status, bob_view) = send(
        &app,
        Method::GET,
        &format!("/rooms/{}/state", room_id),
        Some(&bob_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bob_view["player_id"], bob_id);
    assert_eq!(bob_view["opponent"]["board_count"], 1);
    assert_eq!(bob_view["opponent"]["rack_count"], 5);

    // Bob cannot play Alice's tile
    let (status, error) = send(
        &app,
        Method::POST,
        &format!("/rooms/{}/tiles/place", room_id),
        Some(&bob_token),
        Some(json!({ "seq": view["rack"][0]["seq"], "x": 1, "y": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["kind"], "not_in_rack");

    let bag_size: usize = LETTER_FREQUENCIES.iter().map(|(_, n)| n).sum();
    let (status, bag) = send(
        &app,
        Method::GET,
        &format!("/rooms/{}/bag", room_id),
        Some(&alice_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bag["remaining"], bag_size - 12);

    let (status, error) = send(
        &app,
        Method::POST,
        &format!("/rooms/{}/mixmo", room_id),
        Some(&alice_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["kind"], "rack_not_empty");

    let (status, events_log) = send(
        &app,
        Method::GET,
        &format!("/rooms/{}/events", room_id),
        Some(&bob_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let kinds: Vec<&str> = events_log
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["start", "place"]);
}

#[tokio::test]
async fn test_third_player_cannot_join() {
    let app = app_router(test_state());
    let (alice_token, _) = new_player(&app).await;
    let (bob_token, _) = new_player(&app).await;
    let (carol_token, _) = new_player(&app).await;

    let (_, room) = send(&app, Method::POST, "/rooms", Some(&alice_token), Some(json!({}))).await;
    let join_uri = format!("/rooms/{}/join", room["id"].as_str().unwrap());

    let (status, _) = send(&app, Method::POST, &join_uri, Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, error) = send(&app, Method::POST, &join_uri, Some(&carol_token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["kind"], "conflict");
}

#[tokio::test]
async fn test_expand_grid_rejects_fixed_rooms_and_bad_directions() {
    let app = app_router(test_state());
    let (alice_token, _) = new_player(&app).await;
    let (bob_token, bob_id) = new_player(&app).await;

    let (_, room) = send(
        &app,
        Method::POST,
        "/rooms",
        Some(&alice_token),
        Some(json!({ "opponent_id": bob_id })),
    )
    .await;
    let room_id = room["id"].as_str().unwrap().to_string();
    assert_eq!(room["player_count"], 2);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/rooms/{}/start", room_id),
        Some(&alice_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, error) = send(
        &app,
        Method::POST,
        &format!("/rooms/{}/expand/left", room_id),
        Some(&bob_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["kind"], "fixed_bounds");

    let (status, error) = send(
        &app,
        Method::POST,
        &format!("/rooms/{}/expand/sideways", room_id),
        Some(&bob_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["kind"], "bad_request");
}

#[tokio::test]
async fn test_game_routes_require_a_token() {
    let app = app_router(test_state());

    let (status, error) = send(&app, Method::GET, "/rooms", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error["kind"], "unauthorized");

    let (status, _) = send(&app, Method::POST, "/rooms/some-room/start", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Word extraction needs no session
    let (status, body) = send(
        &app,
        Method::POST,
        "/words",
        None,
        Some(json!({ "tiles": [
            { "x": 0, "y": 0, "letter": "o" },
            { "x": 1, "y": 0, "letter": "k" }
        ] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["words"][0]["text"], "ok");
}
