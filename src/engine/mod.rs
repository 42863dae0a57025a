//! Route playback engine.
//!
//! Pure state machine over a loaded [`Route`]: `Idle -> Loaded <-> Playing -> Finished`.
//! Time is injected through a [`Timer`] and drawing through a [`RenderSink`], so
//! the engine itself never touches tokio, HTTP or a map widget.

pub mod player;
pub mod sink;
pub mod timer;

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::PlaybackError;
use crate::geo::{distance_km, format_coords, format_elapsed, round_two_decimals};
use crate::types::event::{
    Coordinates, PlaybackEvent, PlaybackPhase, PlaybackSnapshot, TraceMetadata,
};
use crate::types::route::{Bounds, Route, RoutePoint};

pub use player::Player;
pub use sink::{BroadcastSink, RenderSink, TracingSink};
pub use timer::{IntervalTimer, Timer};

pub const BASE_TICK_INTERVAL: Duration = Duration::from_millis(2000);

/// Slowest accepted speed. Keeps the tick interval well inside `u64` millis.
pub const MIN_SPEED_MULTIPLIER: f64 = 0.01;

pub struct PlaybackEngine {
    route: Option<Route>,
    trace: Vec<RoutePoint>,
    current_index: usize,
    is_playing: bool,
    speed_multiplier: f64,
    base_interval: Duration,
    start_timestamp: Option<DateTime<Utc>>,
    timer_epoch: u64,
    timer: Box<dyn Timer>,
    sink: Box<dyn RenderSink>,
}

impl PlaybackEngine {
    pub fn new(base_interval: Duration, timer: Box<dyn Timer>, sink: Box<dyn RenderSink>) -> Self {
        Self {
            route: None,
            trace: Vec::new(),
            current_index: 0,
            is_playing: false,
            speed_multiplier: 1.0,
            base_interval,
            start_timestamp: None,
            timer_epoch: 0,
            timer,
            sink,
        }
    }

    /// Replaces the current route and rewinds playback. An empty route is kept
    /// (so `play` keeps failing) and reported as [`PlaybackError::EmptyRoute`].
    pub fn load(&mut self, route: Route) -> Result<(), PlaybackError> {
        self.cancel_timer();
        self.is_playing = false;
        self.clear_trace();
        self.sink.emit(PlaybackEvent::Reset);

        let is_empty = route.is_empty();
        if !is_empty {
            self.sink.emit(PlaybackEvent::RouteLoaded {
                points: route.len(),
                bounds: route.bounds(),
                summary: route.summary(),
            });
        }
        self.route = Some(route);

        if is_empty {
            tracing::warn!("Loaded an empty route; playback cannot start");
            return Err(PlaybackError::EmptyRoute);
        }
        tracing::info!("Loaded route with {} points", self.route_len());
        Ok(())
    }

    pub fn play(&mut self) -> Result<(), PlaybackError> {
        if self.is_playing {
            return Ok(());
        }
        if self.route_len() == 0 {
            return Err(PlaybackError::EmptyRoute);
        }
        if self.current_index >= self.route_len() {
            self.reset();
        }

        self.start_timer();
        self.is_playing = true;
        tracing::debug!(
            "Playback started at index {} every {}ms",
            self.current_index,
            self.tick_interval_millis()
        );
        Ok(())
    }

    pub fn pause(&mut self) {
        if !self.is_playing {
            return;
        }
        self.cancel_timer();
        self.is_playing = false;
        tracing::debug!("Playback paused at index {}", self.current_index);
    }

    pub fn reset(&mut self) {
        self.cancel_timer();
        self.is_playing = false;
        self.clear_trace();
        self.sink.emit(PlaybackEvent::Reset);
    }

    /// Changes the playback rate. While playing, the timer is restarted at the
    /// new interval; the route index is untouched so no point is skipped or
    /// replayed.
    pub fn set_speed(&mut self, multiplier: f64) -> Result<(), PlaybackError> {
        if !multiplier.is_finite() || multiplier < MIN_SPEED_MULTIPLIER {
            return Err(PlaybackError::InvalidSpeed(multiplier));
        }
        self.speed_multiplier = multiplier;
        if self.is_playing {
            self.start_timer();
        }
        tracing::debug!("Speed set to {}x ({}ms per tick)", multiplier, self.tick_interval_millis());
        Ok(())
    }

    /// Applies a timer firing. Firings scheduled before the latest
    /// schedule/cancel are stale and ignored. Returns whether a tick ran.
    pub fn on_timer(&mut self, epoch: u64) -> bool {
        if !self.is_playing || epoch != self.timer_epoch {
            tracing::trace!(epoch, current = self.timer_epoch, "Dropping stale timer firing");
            return false;
        }
        self.tick();
        true
    }

    /// Advances playback by one route point.
    pub fn tick(&mut self) {
        let points = self.route.as_ref().map(Route::points).unwrap_or(&[]);

        if self.current_index >= points.len() {
            self.cancel_timer();
            self.is_playing = false;
            let trace_bounds = Bounds::from_points(&self.trace);
            tracing::info!("Route simulation complete.");
            self.sink.emit(PlaybackEvent::Completed { trace_bounds });
            return;
        }

        let point = points[self.current_index].clone();
        let previous = self
            .current_index
            .checked_sub(1)
            .and_then(|idx| points.get(idx))
            .cloned();

        let start = match self.start_timestamp {
            Some(start) if !self.trace.is_empty() => {
                self.sink.emit(PlaybackEvent::PositionUpdated {
                    point: point.clone(),
                });
                start
            }
            _ => {
                self.start_timestamp = Some(point.timestamp);
                self.sink.emit(PlaybackEvent::VehicleCreated {
                    point: point.clone(),
                });
                point.timestamp
            }
        };

        self.trace.push(point.clone());
        self.sink.emit(PlaybackEvent::TraceExtended {
            point: point.clone(),
        });

        let metadata = trace_metadata(&point, previous.as_ref(), start);
        self.sink.emit(PlaybackEvent::MetadataUpdated(metadata));

        self.current_index += 1;
    }

    pub fn phase(&self) -> PlaybackPhase {
        match &self.route {
            None => PlaybackPhase::Idle,
            Some(_) if self.is_playing => PlaybackPhase::Playing,
            Some(route) if !route.is_empty() && self.current_index >= route.len() => {
                PlaybackPhase::Finished
            }
            Some(_) => PlaybackPhase::Loaded,
        }
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            phase: self.phase(),
            current_index: self.current_index,
            total_points: self.route_len(),
            is_playing: self.is_playing,
            speed_multiplier: self.speed_multiplier,
            tick_interval_ms: self.tick_interval_millis(),
        }
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn trace(&self) -> &[RoutePoint] {
        &self.trace
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.speed_multiplier
    }

    pub fn tick_interval_millis(&self) -> u64 {
        let millis = self.base_interval.as_millis() as f64 / self.speed_multiplier;
        (millis.round() as u64).max(1)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_millis())
    }

    fn route_len(&self) -> usize {
        self.route.as_ref().map_or(0, Route::len)
    }

    fn clear_trace(&mut self) {
        self.current_index = 0;
        self.trace.clear();
        self.start_timestamp = None;
    }

    fn start_timer(&mut self) {
        self.timer_epoch += 1;
        let period = self.tick_interval();
        self.timer.schedule(period, self.timer_epoch);
    }

    fn cancel_timer(&mut self) {
        self.timer_epoch += 1;
        self.timer.cancel();
    }
}

fn trace_metadata(point: &RoutePoint, previous: Option<&RoutePoint>, start: DateTime<Utc>) -> TraceMetadata {
    let elapsed_seconds = ((point.timestamp - start).num_milliseconds().max(0) / 1000) as u64;

    // Zero or negative time deltas (out-of-order samples) read as standing still.
    let speed_kmh = previous
        .map(|prev| {
            let time_diff_seconds = (point.timestamp - prev.timestamp).num_milliseconds() as f64 / 1000.0;
            if time_diff_seconds > 0.0 {
                distance_km(prev, point) / time_diff_seconds * 3600.0
            } else {
                0.0
            }
        })
        .unwrap_or(0.0);

    TraceMetadata {
        coords: Coordinates {
            lat: point.latitude,
            lon: point.longitude,
        },
        coords_label: format_coords(point.latitude, point.longitude),
        elapsed_seconds,
        elapsed_label: format_elapsed(elapsed_seconds),
        speed_kmh: round_two_decimals(speed_kmh),
        speed_label: format!("{:.2}", speed_kmh),
    }
}
