use axum::Router;
use routeplay_rs::{config, routes, source, state};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "routeplay_rs=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::from_env();
    let state = state::AppState::new(config.clone());

    // A broken asset is not fatal: the engine stays idle until a route is
    // uploaded or requested.
    if let Some(path) = &config.route_asset {
        match source::load_asset(path).await {
            Ok(route) => {
                if let Err(err) = state.player().load(route).await {
                    tracing::warn!("Route asset {} not playable: {}", path.display(), err);
                }
            }
            Err(err) => tracing::error!("Failed to load route asset {}: {}", path.display(), err),
        }
    }

    let app = Router::new()
        .merge(routes::health::router())
        .merge(routes::route::router())
        .merge(routes::playback::router())
        .merge(routes::events::router())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(axum::extract::DefaultBodyLimit::max(config.max_file_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("Failed to bind {}: {}", addr, err);
            std::process::exit(1);
        }
    };

    tracing::info!("RoutePlay listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!("Load route: POST http://{}/api/route/upload", addr);
    tracing::info!("Controls: POST http://{}/api/playback/{{play,pause,reset,speed}}", addr);
    tracing::info!("Events: ws://{}/api/playback/events", addr);

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", err);
    }
}
