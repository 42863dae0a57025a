use std::sync::Arc;

use crate::config::Config;
use crate::engine::Player;
use crate::source::DirectionsClient;

#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    player: Player,
    directions: DirectionsClient,
}

impl AppState {
    /// Spawns the playback engine; call from inside a tokio runtime.
    pub fn new(config: Config) -> Self {
        let player = Player::spawn(config.base_tick_interval, config.event_buffer);
        let directions = DirectionsClient::new(
            reqwest::Client::new(),
            config.osrm_url.clone(),
            config.osrm_profile.clone(),
            config.directions_timeout,
        );
        Self {
            config: Arc::new(config),
            player,
            directions,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn directions(&self) -> &DirectionsClient {
        &self.directions
    }
}
