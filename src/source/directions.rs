//! Driving directions between two picked points, from an OSRM-compatible
//! routing engine.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SourceError;
use crate::geo::haversine_distance;
use crate::types::route::{Route, RoutePoint};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Waypoint {
    pub lat: f64,
    #[serde(alias = "lng")]
    pub lon: f64,
}

impl Waypoint {
    fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

#[derive(Debug, Clone)]
pub struct DirectionsClient {
    http: reqwest::Client,
    base_url: String,
    profile: String,
    timeout: std::time::Duration,
}

impl DirectionsClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        profile: impl Into<String>,
        timeout: std::time::Duration,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            profile: profile.into(),
            timeout,
        }
    }

    pub fn route_url(&self, origin: Waypoint, destination: Waypoint) -> String {
        format!(
            "{}/route/v1/{}/{},{};{},{}?overview=full&geometries=geojson&annotations=duration",
            self.base_url.trim_end_matches('/'),
            self.profile,
            origin.lon,
            origin.lat,
            destination.lon,
            destination.lat
        )
    }

    /// Fetches a driving route and timestamps it starting at `departure`.
    pub async fn fetch(
        &self,
        origin: Waypoint,
        destination: Waypoint,
        departure: DateTime<Utc>,
    ) -> Result<Route, SourceError> {
        if !origin.is_valid() || !destination.is_valid() {
            return Err(SourceError::NoRoute(
                "waypoints must be valid latitude/longitude pairs".to_string(),
            ));
        }

        let url = self.route_url(origin, destination);
        tracing::info!("Requesting directions: {}", url);

        let response = self
            .http
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| SourceError::Fetch(format!("Routing request failed: {}", err)))?;

        let status = response.status();
        let body: OsrmResponse = response
            .json()
            .await
            .map_err(|err| SourceError::Fetch(format!("Invalid routing response ({}): {}", status, err)))?;

        route_from_osrm(body, departure)
    }
}

#[derive(Debug, Deserialize)]
pub struct OsrmResponse {
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
pub struct OsrmRoute {
    pub geometry: OsrmGeometry,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
pub struct OsrmGeometry {
    /// `[lon, lat]` pairs.
    pub coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
pub struct OsrmLeg {
    #[serde(default)]
    pub annotation: Option<OsrmAnnotation>,
}

#[derive(Debug, Deserialize)]
pub struct OsrmAnnotation {
    #[serde(default)]
    pub duration: Vec<f64>,
}

/// Turns the first OSRM route into timestamped points. Segment times come from
/// the per-segment duration annotation; without it the total duration is split
/// in proportion to segment length.
pub fn route_from_osrm(response: OsrmResponse, departure: DateTime<Utc>) -> Result<Route, SourceError> {
    if response.code != "Ok" {
        return Err(SourceError::NoRoute(
            response.message.unwrap_or(response.code),
        ));
    }

    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| SourceError::NoRoute("response contained no routes".to_string()))?;

    let coordinates = route.geometry.coordinates;
    if coordinates.is_empty() {
        return Err(SourceError::NoRoute("route geometry is empty".to_string()));
    }

    if !route.duration.is_finite() || route.duration < 0.0 {
        return Err(SourceError::NoRoute(format!(
            "invalid route duration {}",
            route.duration
        )));
    }

    let segment_count = coordinates.len() - 1;
    let annotated: Vec<f64> = route
        .legs
        .iter()
        .filter_map(|leg| leg.annotation.as_ref())
        .flat_map(|annotation| annotation.duration.iter().copied())
        .collect();

    let segment_seconds = if annotated.len() == segment_count {
        annotated
    } else {
        proportional_durations(&coordinates, route.duration)
    };

    let mut offset_seconds = 0.0;
    let mut points = Vec::with_capacity(coordinates.len());
    for (idx, [lon, lat]) in coordinates.iter().copied().enumerate() {
        if idx > 0 {
            offset_seconds += segment_seconds[idx - 1].max(0.0);
        }
        points.push(RoutePoint {
            latitude: lat,
            longitude: lon,
            timestamp: offset_timestamp(departure, offset_seconds)?,
        });
    }

    Ok(Route::new(points))
}

fn offset_timestamp(departure: DateTime<Utc>, offset_seconds: f64) -> Result<DateTime<Utc>, SourceError> {
    let offset_ms = (offset_seconds * 1000.0).round();
    // `as i64` saturates, so out-of-range offsets are rejected before the cast.
    if !offset_ms.is_finite() || offset_ms >= i64::MAX as f64 {
        return Err(SourceError::NoRoute("route duration out of range".to_string()));
    }
    ChronoDuration::try_milliseconds(offset_ms as i64)
        .and_then(|offset| departure.checked_add_signed(offset))
        .ok_or_else(|| SourceError::NoRoute("route duration out of range".to_string()))
}

fn proportional_durations(coordinates: &[[f64; 2]], total_seconds: f64) -> Vec<f64> {
    let lengths: Vec<f64> = coordinates
        .windows(2)
        .map(|pair| haversine_distance(pair[0][1], pair[0][0], pair[1][1], pair[1][0]))
        .collect();
    let total_length: f64 = lengths.iter().sum();

    if lengths.is_empty() {
        return lengths;
    }
    if total_length <= f64::EPSILON {
        let share = total_seconds / lengths.len() as f64;
        return vec![share; lengths.len()];
    }

    lengths
        .iter()
        .map(|length| total_seconds * length / total_length)
        .collect()
}
