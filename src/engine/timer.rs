use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// A single recurring timer. Every firing is reported back to the engine
/// tagged with the epoch it was scheduled under.
pub trait Timer: Send {
    /// Replaces any running schedule with one firing every `period`.
    fn schedule(&mut self, period: Duration, epoch: u64);
    fn cancel(&mut self);
}

/// Tokio-backed timer. Firings are delivered as epochs on an mpsc channel and
/// applied to the engine by the player's drive loop.
pub struct IntervalTimer {
    firings: mpsc::UnboundedSender<u64>,
    task: Option<JoinHandle<()>>,
}

impl IntervalTimer {
    pub fn new(firings: mpsc::UnboundedSender<u64>) -> Self {
        Self {
            firings,
            task: None,
        }
    }
}

impl Timer for IntervalTimer {
    fn schedule(&mut self, period: Duration, epoch: u64) {
        self.cancel();

        let firings = self.firings.clone();
        self.task = Some(tokio::spawn(async move {
            // First firing one full period after scheduling, like setInterval.
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if firings.send(epoch).is_err() {
                    break;
                }
            }
        }));
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for IntervalTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
