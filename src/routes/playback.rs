use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;
use crate::types::event::PlaybackSnapshot;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/playback", get(snapshot))
        .route("/api/playback/play", post(play))
        .route("/api/playback/pause", post(pause))
        .route("/api/playback/reset", post(reset))
        .route("/api/playback/speed", post(set_speed))
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SpeedRequest {
    multiplier: f64,
}

async fn snapshot(State(state): State<AppState>) -> Json<PlaybackSnapshot> {
    Json(state.player().snapshot().await)
}

async fn play(State(state): State<AppState>) -> Result<Json<PlaybackSnapshot>, AppError> {
    Ok(Json(state.player().play().await?))
}

async fn pause(State(state): State<AppState>) -> Json<PlaybackSnapshot> {
    Json(state.player().pause().await)
}

async fn reset(State(state): State<AppState>) -> Json<PlaybackSnapshot> {
    Json(state.player().reset().await)
}

async fn set_speed(
    State(state): State<AppState>,
    Json(request): Json<SpeedRequest>,
) -> Result<Json<PlaybackSnapshot>, AppError> {
    Ok(Json(state.player().set_speed(request.multiplier).await?))
}
