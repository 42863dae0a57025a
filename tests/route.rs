use axum::{body::to_bytes, http::Request, Router};
use routeplay_rs::{config::Config, routes, state::AppState};
use serde_json::Value;
use tower::ServiceExt;

fn app() -> Router {
    let state = AppState::new(Config::default());
    Router::new()
        .merge(routes::route::router())
        .merge(routes::playback::router())
        .with_state(state)
}

fn sample_route() -> &'static str {
    r#"[
  {"latitude": 17.385044, "longitude": 78.486671, "timestamp": "2024-05-01T10:00:00Z"},
  {"latitude": 17.385512, "longitude": 78.487104, "timestamp": 1714557605000},
  {"latitude": 17.386020, "longitude": 78.487590, "timestamp": "2024-05-01T10:00:10Z"}
]"#
}

fn sample_gpx() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test">
  <trk><name>Test Drive</name><trkseg>
    <trkpt lat="52.5200" lon="13.4050"><ele>34.0</ele><time>2026-01-01T12:00:00Z</time></trkpt>
    <trkpt lat="52.5205" lon="13.4060"><ele>39.0</ele><time>2026-01-01T12:00:10Z</time></trkpt>
  </trkseg></trk>
</gpx>"#
}

fn multipart_body(file_name: &str, file_body: &str, boundary: &str) -> String {
    format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n{file_body}\r\n--{boundary}--\r\n"
    )
}

fn upload_request(file_name: &str, file_body: &str) -> Request<axum::body::Body> {
    let boundary = "X-BOUNDARY-TEST";
    Request::builder()
        .uri("/api/route/upload")
        .method("POST")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(axum::body::Body::from(multipart_body(file_name, file_body, boundary)))
        .expect("request")
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&body).expect("json")
}

#[tokio::test]
async fn upload_json_route_loads_engine() {
    let app = app();
    let response = app
        .clone()
        .oneshot(upload_request("dummy-route.json", sample_route()))
        .await
        .expect("response");

    assert_eq!(response.status(), axum::http::StatusCode::OK);
    let json = json_body(response).await;
    assert!(json.get("route_id").and_then(Value::as_str).is_some());
    assert_eq!(json["source"], "json");
    assert_eq!(json["points"], 3);
    assert_eq!(json["summary"]["duration_seconds"], 10);
    assert_eq!(json["playback"]["phase"], "loaded");
    assert_eq!(json["playback"]["current_index"], 0);

    let route = app
        .oneshot(
            Request::builder()
                .uri("/api/route")
                .method("GET")
                .body(axum::body::Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(route.status(), axum::http::StatusCode::OK);
    let json = json_body(route).await;
    let points = json["points"].as_array().expect("points");
    assert_eq!(points.len(), 3);
    assert_eq!(points[1]["timestamp"], "2024-05-01T10:00:05Z");
}

#[tokio::test]
async fn upload_gpx_route() {
    let response = app()
        .oneshot(upload_request("drive.gpx", sample_gpx()))
        .await
        .expect("response");

    assert_eq!(response.status(), axum::http::StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["source"], "gpx");
    assert_eq!(json["points"], 2);
}

#[tokio::test]
async fn upload_rejects_unsupported_extension() {
    let response = app()
        .oneshot(upload_request("route.txt", "hello"))
        .await
        .expect("response");

    assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_rejects_bad_timestamp() {
    let body = r#"[{"latitude": 1.0, "longitude": 2.0, "timestamp": "not a time"}]"#;
    let response = app()
        .oneshot(upload_request("route.json", body))
        .await
        .expect("response");

    assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    let message = json["error"].as_str().expect("error message");
    assert!(message.contains("not a time"));
}

#[tokio::test]
async fn current_route_is_not_found_before_loading() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/route")
                .method("GET")
                .body(axum::body::Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reload_without_asset_is_bad_request() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/route/reload")
                .method("POST")
                .body(axum::body::Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
}
