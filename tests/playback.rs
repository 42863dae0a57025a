use std::time::Duration;

use axum::{body::to_bytes, http::Request, Router};
use chrono::{TimeZone, Utc};
use routeplay_rs::{
    config::Config,
    engine::Player,
    routes,
    state::AppState,
    types::event::PlaybackEvent,
    types::route::{Route, RoutePoint},
};
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tower::ServiceExt;

fn app_with_state() -> (Router, AppState) {
    let state = AppState::new(Config::default());
    let app = Router::new()
        .merge(routes::route::router())
        .merge(routes::playback::router())
        .with_state(state.clone());
    (app, state)
}

fn route(len: usize) -> Route {
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
    Route::new(
        (0..len)
            .map(|i| RoutePoint {
                latitude: 28.6129 + i as f64 * 0.0005,
                longitude: 77.2295,
                timestamp: start + chrono::Duration::seconds(i as i64 * 5),
            })
            .collect(),
    )
}

fn post(uri: &str, body: Option<Value>) -> Request<axum::body::Body> {
    let builder = Request::builder().uri(uri).method("POST");
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(axum::body::Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(axum::body::Body::empty()).expect("request"),
    }
}

async fn send(app: &Router, request: Request<axum::body::Body>) -> (axum::http::StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    (status, serde_json::from_slice(&body).expect("json"))
}

async fn next_metadata(events: &mut broadcast::Receiver<PlaybackEvent>) -> Option<PlaybackEvent> {
    loop {
        match events.recv().await.expect("event") {
            event @ PlaybackEvent::MetadataUpdated(_) => return Some(event),
            PlaybackEvent::Completed { .. } => return None,
            _ => {}
        }
    }
}

#[tokio::test]
async fn play_without_route_is_conflict() {
    let (app, _) = app_with_state();
    let (status, json) = send(&app, post("/api/playback/play", None)).await;
    assert_eq!(status, axum::http::StatusCode::CONFLICT);
    assert!(json["error"].as_str().expect("error").contains("empty"));
}

#[tokio::test]
async fn controls_drive_the_state_machine() {
    let (app, state) = app_with_state();
    state.player().load(route(4)).await.expect("load");

    let (status, json) = send(&app, post("/api/playback/play", None)).await;
    assert_eq!(status, axum::http::StatusCode::OK);
    assert_eq!(json["phase"], "playing");
    assert_eq!(json["tick_interval_ms"], 2000);

    let (status, json) = send(
        &app,
        post("/api/playback/speed", Some(serde_json::json!({ "multiplier": 4.0 }))),
    )
    .await;
    assert_eq!(status, axum::http::StatusCode::OK);
    assert_eq!(json["tick_interval_ms"], 500);
    assert_eq!(json["is_playing"], true);

    let (_, first) = send(&app, post("/api/playback/pause", None)).await;
    let (_, second) = send(&app, post("/api/playback/pause", None)).await;
    assert_eq!(first, second);
    assert_eq!(second["phase"], "loaded");

    let (_, json) = send(&app, post("/api/playback/reset", None)).await;
    assert_eq!(json["current_index"], 0);
    assert_eq!(json["speed_multiplier"], 4.0);
}

#[tokio::test]
async fn invalid_speed_is_rejected() {
    let (app, _) = app_with_state();
    let (status, _) = send(
        &app,
        post("/api/playback/speed", Some(serde_json::json!({ "multiplier": -2.0 }))),
    )
    .await;
    assert_eq!(status, axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test(start_paused = true)]
async fn timer_plays_route_to_completion() {
    let player = Player::spawn(Duration::from_millis(2000), 64);
    let mut events = player.subscribe();
    player.load(route(3)).await.expect("load");
    let started = Instant::now();
    player.play().await.expect("play");

    let mut seen = Vec::new();
    loop {
        let event = events.recv().await.expect("event");
        let done = matches!(event, PlaybackEvent::Completed { .. });
        seen.push(event.kind());
        if done {
            break;
        }
    }

    // Three points plus the completing tick, two seconds apart.
    assert!(started.elapsed() >= Duration::from_millis(8000));
    assert_eq!(seen.iter().filter(|k| **k == "vehicle_created").count(), 1);
    assert_eq!(seen.iter().filter(|k| **k == "position_updated").count(), 2);
    assert_eq!(seen.iter().filter(|k| **k == "trace_extended").count(), 3);
    assert_eq!(seen.iter().filter(|k| **k == "completed").count(), 1);

    let snapshot = player.snapshot().await;
    assert!(!snapshot.is_playing);
    assert_eq!(snapshot.current_index, 3);
}

#[tokio::test(start_paused = true)]
async fn speed_change_mid_route_keeps_every_point() {
    let route = route(3);
    let expected: Vec<RoutePoint> = route.points().to_vec();
    let player = Player::spawn(Duration::from_millis(2000), 64);
    let mut events = player.subscribe();
    player.load(route).await.expect("load");
    player.play().await.expect("play");

    let mut coords = Vec::new();
    let first = next_metadata(&mut events).await.expect("first point");
    coords.push(first);

    player.set_speed(2.0).await.expect("speed");
    let mark = Instant::now();
    let second = next_metadata(&mut events).await.expect("second point");
    let gap = mark.elapsed();
    assert!(gap >= Duration::from_millis(1000) && gap < Duration::from_millis(2000), "gap {:?}", gap);
    coords.push(second);
    coords.push(next_metadata(&mut events).await.expect("third point"));
    assert!(next_metadata(&mut events).await.is_none());

    for (event, point) in coords.iter().zip(&expected) {
        match event {
            PlaybackEvent::MetadataUpdated(meta) => assert_eq!(meta.coords.lat, point.latitude),
            other => panic!("unexpected {:?}", other),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn pause_stops_further_ticks() {
    let player = Player::spawn(Duration::from_millis(2000), 64);
    let mut events = player.subscribe();
    player.load(route(5)).await.expect("load");
    player.play().await.expect("play");
    next_metadata(&mut events).await.expect("first point");

    player.pause().await;
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(player.snapshot().await.current_index, 1);
    while let Ok(event) = events.try_recv() {
        assert!(!matches!(
            event,
            PlaybackEvent::PositionUpdated { .. } | PlaybackEvent::Completed { .. }
        ));
    }
}
