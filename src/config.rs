use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub max_file_size: usize,
    /// Tick interval at 1x speed.
    pub base_tick_interval: Duration,
    pub event_buffer: usize,
    pub route_asset: Option<PathBuf>,
    pub osrm_url: String,
    pub osrm_profile: String,
    pub directions_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            max_file_size: 25 * 1024 * 1024,
            base_tick_interval: Duration::from_millis(2000),
            event_buffer: 256,
            route_asset: None,
            osrm_url: "https://router.project-osrm.org".to_string(),
            osrm_profile: "driving".to_string(),
            directions_timeout: Duration::from_secs(15),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = env_parse("PORT").unwrap_or(defaults.port);

        let max_file_size = env_parse::<usize>("MAX_FILE_SIZE_MB")
            .and_then(|mb| mb.checked_mul(1024 * 1024))
            .unwrap_or(defaults.max_file_size);

        let base_tick_interval = env_parse::<u64>("BASE_TICK_INTERVAL_MS")
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(defaults.base_tick_interval);

        let event_buffer = env_parse::<usize>("EVENT_BUFFER")
            .filter(|n| *n > 0)
            .unwrap_or(defaults.event_buffer);

        let route_asset = std::env::var("ROUTE_ASSET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let osrm_url = std::env::var("OSRM_URL")
            .ok()
            .map(|s| s.trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.osrm_url);

        let osrm_profile = std::env::var("OSRM_PROFILE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.osrm_profile);

        let directions_timeout = env_parse("DIRECTIONS_TIMEOUT_SECONDS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.directions_timeout);

        Self {
            port,
            max_file_size,
            base_tick_interval,
            event_buffer,
            route_asset,
            osrm_url,
            osrm_profile,
            directions_timeout,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}
