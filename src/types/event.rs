use serde::{Deserialize, Serialize};

use crate::types::route::{Bounds, RoutePoint, RouteSummary};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Per-tick derived values. Recomputed on every tick, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceMetadata {
    pub coords: Coordinates,
    pub coords_label: String,
    pub elapsed_seconds: u64,
    pub elapsed_label: String,
    /// Rounded to two decimals.
    pub speed_kmh: f64,
    pub speed_label: String,
}

/// Everything a render sink needs to draw playback. Sinks treat these as
/// read-only snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlaybackEvent {
    RouteLoaded {
        points: usize,
        bounds: Option<Bounds>,
        summary: RouteSummary,
    },
    VehicleCreated {
        point: RoutePoint,
    },
    PositionUpdated {
        point: RoutePoint,
    },
    TraceExtended {
        point: RoutePoint,
    },
    MetadataUpdated(TraceMetadata),
    Completed {
        trace_bounds: Option<Bounds>,
    },
    Reset,
}

impl PlaybackEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            PlaybackEvent::RouteLoaded { .. } => "route_loaded",
            PlaybackEvent::VehicleCreated { .. } => "vehicle_created",
            PlaybackEvent::PositionUpdated { .. } => "position_updated",
            PlaybackEvent::TraceExtended { .. } => "trace_extended",
            PlaybackEvent::MetadataUpdated(_) => "metadata_updated",
            PlaybackEvent::Completed { .. } => "completed",
            PlaybackEvent::Reset => "reset",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackPhase {
    Idle,
    Loaded,
    Playing,
    Finished,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    pub phase: PlaybackPhase,
    pub current_index: usize,
    pub total_points: usize,
    pub is_playing: bool,
    pub speed_multiplier: f64,
    pub tick_interval_ms: u64,
}
