use tokio::sync::broadcast;

use crate::types::event::PlaybackEvent;

/// Consumer of engine events. Owns all drawing; the engine never renders.
pub trait RenderSink: Send {
    fn emit(&mut self, event: PlaybackEvent);
}

/// Fans events out to every subscribed client.
pub struct BroadcastSink {
    sender: broadcast::Sender<PlaybackEvent>,
}

impl BroadcastSink {
    pub fn new(sender: broadcast::Sender<PlaybackEvent>) -> Self {
        Self { sender }
    }
}

impl RenderSink for BroadcastSink {
    fn emit(&mut self, event: PlaybackEvent) {
        tracing::debug!(kind = event.kind(), "playback event");
        // No subscribers is fine: nobody is watching the map.
        let _ = self.sender.send(event);
    }
}

/// Console sink: writes each event as a log line.
#[derive(Default)]
pub struct TracingSink;

impl RenderSink for TracingSink {
    fn emit(&mut self, event: PlaybackEvent) {
        match &event {
            PlaybackEvent::RouteLoaded {
                points, summary, ..
            } => tracing::info!(
                "Route loaded: {} points, {:.2} km over {}s",
                points,
                summary.distance_km,
                summary.duration_seconds
            ),
            PlaybackEvent::VehicleCreated { point } => {
                tracing::info!("Vehicle placed at {:.6}, {:.6}", point.latitude, point.longitude)
            }
            PlaybackEvent::MetadataUpdated(meta) => tracing::info!(
                "{} | elapsed {} | {} km/h",
                meta.coords_label,
                meta.elapsed_label,
                meta.speed_label
            ),
            PlaybackEvent::Completed { trace_bounds } => {
                tracing::info!("Route simulation complete. Trace bounds: {:?}", trace_bounds)
            }
            PlaybackEvent::Reset => tracing::info!("Playback reset"),
            PlaybackEvent::PositionUpdated { .. } | PlaybackEvent::TraceExtended { .. } => {
                tracing::trace!(kind = event.kind(), "playback event")
            }
        }
    }
}

impl<A: RenderSink, B: RenderSink> RenderSink for (A, B) {
    fn emit(&mut self, event: PlaybackEvent) {
        self.0.emit(event.clone());
        self.1.emit(event);
    }
}
