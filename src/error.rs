use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Invalid route JSON: {0}")]
    InvalidJson(String),
    #[error("Invalid GPX: {0}")]
    InvalidGpx(String),
    #[error("Invalid FIT: {0}")]
    InvalidFit(String),
    #[error("Invalid timestamp {value:?} at point {index}")]
    InvalidTimestamp { index: usize, value: String },
    #[error("Point {0} has no timestamp")]
    MissingTimestamp(usize),
    #[error("No route points found in file")]
    EmptyFile,
    #[error("Failed to fetch route: {0}")]
    Fetch(String),
    #[error("Routing engine found no route: {0}")]
    NoRoute(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlaybackError {
    #[error("Route is empty, playback cannot start")]
    EmptyRoute,
    #[error("Invalid speed multiplier {0}, must be a finite number of at least 0.01")]
    InvalidSpeed(f64),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Playback(#[from] PlaybackError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Source(SourceError::Fetch(_)) => StatusCode::BAD_GATEWAY,
            AppError::Source(SourceError::NoRoute(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Source(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Playback(PlaybackError::EmptyRoute) => StatusCode::CONFLICT,
            AppError::Playback(PlaybackError::InvalidSpeed(_)) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
