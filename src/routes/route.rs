use axum::extract::Multipart;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::source::{self, parse, Waypoint};
use crate::state::AppState;
use crate::types::event::PlaybackSnapshot;
use crate::types::route::{Bounds, FileFormat, Route, RoutePoint, RouteSummary};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/route", get(current_route))
        .route("/api/route/upload", post(upload))
        .route("/api/route/directions", post(directions))
        .route("/api/route/reload", post(reload))
}

#[derive(Serialize, Deserialize)]
struct LoadResponse {
    route_id: String,
    source: String,
    points: usize,
    bounds: Option<Bounds>,
    summary: RouteSummary,
    playback: PlaybackSnapshot,
}

#[derive(Serialize)]
struct RouteResponse {
    points: Vec<RoutePoint>,
    bounds: Option<Bounds>,
    summary: RouteSummary,
}

#[derive(Deserialize)]
struct DirectionsRequest {
    origin: Waypoint,
    destination: Waypoint,
}

async fn current_route(State(state): State<AppState>) -> Result<Json<RouteResponse>, AppError> {
    let route = state
        .player()
        .route()
        .await
        .filter(|route| !route.is_empty())
        .ok_or_else(|| AppError::NotFound("no route loaded".to_string()))?;

    Ok(Json(RouteResponse {
        bounds: route.bounds(),
        summary: route.summary(),
        points: route.points().to_vec(),
    }))
}

async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<LoadResponse>, AppError> {
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        if field.name() == Some("file") {
            filename = field.file_name().map(|s| s.to_string());
            file_bytes = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read file bytes: {}", e)))?
                    .to_vec(),
            );
        }
    }

    let bytes = file_bytes.ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;
    let filename = filename.ok_or_else(|| AppError::BadRequest("No filename provided".to_string()))?;

    let format = FileFormat::from_filename(&filename)
        .ok_or_else(|| AppError::BadRequest("Unsupported file format".to_string()))?;

    tracing::info!("Parsing {} route file: {}", format.as_str(), filename);

    let route = parse::parse(&bytes, format)?;
    load(&state, route, format.as_str()).await
}

async fn directions(
    State(state): State<AppState>,
    Json(request): Json<DirectionsRequest>,
) -> Result<Json<LoadResponse>, AppError> {
    let route = state
        .directions()
        .fetch(request.origin, request.destination, Utc::now())
        .await?;
    load(&state, route, "directions").await
}

async fn reload(State(state): State<AppState>) -> Result<Json<LoadResponse>, AppError> {
    let path = state
        .config()
        .route_asset
        .clone()
        .ok_or_else(|| AppError::BadRequest("ROUTE_ASSET is not configured".to_string()))?;
    let route = source::load_asset(&path).await?;
    load(&state, route, "asset").await
}

async fn load(state: &AppState, route: Route, source: &str) -> Result<Json<LoadResponse>, AppError> {
    let points = route.len();
    let bounds = route.bounds();
    let summary = route.summary();
    let playback = state.player().load(route).await?;
    let route_id = Uuid::new_v4().to_string();

    tracing::info!(
        "Loaded {} route {} ({} points, {:.2} km)",
        source,
        route_id,
        points,
        summary.distance_km
    );

    Ok(Json(LoadResponse {
        route_id,
        source: source.to_string(),
        points,
        bounds,
        summary,
        playback,
    }))
}
