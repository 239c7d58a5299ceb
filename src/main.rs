use mimalloc::MiMalloc;
use track_quality_rs::{config, routes, state};

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "track_quality_rs=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::from_env();
    let addr = format!("0.0.0.0:{}", config.port);
    let max_body_size = config.max_body_size;
    let state = state::AppState::new(config);

    let app = routes::router()
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(axum::extract::DefaultBodyLimit::max(max_body_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("track-quality-rs listening on {}", addr);
    tracing::info!("Ingest: PUT http://{}/api/activities/:id/streams", addr);
    tracing::info!("Quality: GET http://{}/api/activities/:id/quality", addr);
    tracing::info!("Features: GET http://{}/api/activities/:id/features", addr);

    axum::serve(listener, app).await
}
