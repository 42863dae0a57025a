//! Headless playback of a route file: `replay <file> [multiplier]`.
//! Every event is written to the log until the route completes.

use std::path::PathBuf;

use routeplay_rs::config::Config;
use routeplay_rs::engine::{Player, RenderSink, TracingSink};
use routeplay_rs::source;
use routeplay_rs::types::event::PlaybackEvent;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "routeplay_rs=info,replay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next().map(PathBuf::from) else {
        eprintln!("usage: replay <route.json|route.gpx|route.fit> [speed multiplier]");
        std::process::exit(2);
    };
    let multiplier = match args.next().map(|s| s.parse::<f64>()) {
        None => 1.0,
        Some(Ok(multiplier)) => multiplier,
        Some(Err(err)) => {
            eprintln!("invalid speed multiplier: {}", err);
            std::process::exit(2);
        }
    };

    let config = Config::from_env();
    let route = match source::load_asset(&path).await {
        Ok(route) => route,
        Err(err) => {
            tracing::error!("{}", err);
            std::process::exit(1);
        }
    };

    let player = Player::spawn_with_sink(config.base_tick_interval, config.event_buffer, |broadcast| {
        Box::new((TracingSink, broadcast)) as Box<dyn RenderSink>
    });
    let mut events = player.subscribe();

    let started = async {
        player.load(route).await?;
        player.set_speed(multiplier).await?;
        player.play().await
    };
    if let Err(err) = started.await {
        tracing::error!("{}", err);
        std::process::exit(1);
    }

    loop {
        match events.recv().await {
            Ok(PlaybackEvent::Completed { .. }) | Err(RecvError::Closed) => break,
            Ok(_) | Err(RecvError::Lagged(_)) => {}
        }
    }
}
