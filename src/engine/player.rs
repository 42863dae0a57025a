use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, Mutex};

use crate::engine::sink::{BroadcastSink, RenderSink};
use crate::engine::timer::IntervalTimer;
use crate::engine::PlaybackEngine;
use crate::error::PlaybackError;
use crate::types::event::{PlaybackEvent, PlaybackSnapshot};
use crate::types::route::Route;

/// Shared handle to one playback session. Control calls and timer firings are
/// serialized through the engine lock, so a tick always runs to completion.
#[derive(Clone)]
pub struct Player {
    engine: Arc<Mutex<PlaybackEngine>>,
    events: broadcast::Sender<PlaybackEvent>,
}

impl Player {
    /// Builds the engine and spawns its drive loop. Must be called inside a
    /// tokio runtime.
    pub fn spawn(base_interval: Duration, event_buffer: usize) -> Self {
        Self::spawn_with_sink(base_interval, event_buffer, |broadcast| -> Box<dyn RenderSink> {
            Box::new(broadcast)
        })
    }

    /// Like [`Player::spawn`], letting the caller wrap the broadcast sink,
    /// e.g. to also log every event.
    pub fn spawn_with_sink<F>(base_interval: Duration, event_buffer: usize, wrap: F) -> Self
    where
        F: FnOnce(BroadcastSink) -> Box<dyn RenderSink>,
    {
        let (firings_tx, firings_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(event_buffer.max(1));

        let engine = PlaybackEngine::new(
            base_interval,
            Box::new(IntervalTimer::new(firings_tx)),
            wrap(BroadcastSink::new(events.clone())),
        );
        let engine = Arc::new(Mutex::new(engine));

        tokio::spawn(drive(Arc::downgrade(&engine), firings_rx));

        Self { engine, events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    pub async fn load(&self, route: Route) -> Result<PlaybackSnapshot, PlaybackError> {
        let mut engine = self.engine.lock().await;
        engine.load(route)?;
        Ok(engine.snapshot())
    }

    pub async fn play(&self) -> Result<PlaybackSnapshot, PlaybackError> {
        let mut engine = self.engine.lock().await;
        engine.play()?;
        Ok(engine.snapshot())
    }

    pub async fn pause(&self) -> PlaybackSnapshot {
        let mut engine = self.engine.lock().await;
        engine.pause();
        engine.snapshot()
    }

    pub async fn reset(&self) -> PlaybackSnapshot {
        let mut engine = self.engine.lock().await;
        engine.reset();
        engine.snapshot()
    }

    pub async fn set_speed(&self, multiplier: f64) -> Result<PlaybackSnapshot, PlaybackError> {
        let mut engine = self.engine.lock().await;
        engine.set_speed(multiplier)?;
        Ok(engine.snapshot())
    }

    pub async fn snapshot(&self) -> PlaybackSnapshot {
        self.engine.lock().await.snapshot()
    }

    pub async fn route(&self) -> Option<Route> {
        self.engine.lock().await.route().cloned()
    }
}

async fn drive(engine: Weak<Mutex<PlaybackEngine>>, mut firings: mpsc::UnboundedReceiver<u64>) {
    while let Some(epoch) = firings.recv().await {
        let Some(shared) = engine.upgrade() else {
            break;
        };
        shared.lock().await.on_timer(epoch);
    }
    tracing::debug!("Playback drive loop stopped");
}
