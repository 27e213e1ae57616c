use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use rostrum_server::config::ServerConfig;
use rostrum_server::db::pool::{create_pool, run_migrations};
use rostrum_server::db::store::RoomStore;
use rostrum_server::engine::coordinator::Coordinator;
use rostrum_server::engine::reaper;
use rostrum_server::web::app_state::AppState;
use rostrum_server::web::router::build_router;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::load("rostrum.toml");

    // Initialize database
    let pool = create_pool(&config.database.url)
        .await
        .expect("failed to connect to database");

    run_migrations(&pool)
        .await
        .expect("failed to run database migrations");

    let coordinator = Coordinator::new(RoomStore::new(pool), config.room_defaults());

    // Start the heartbeat reaper
    reaper::spawn(
        coordinator.clone(),
        std::time::Duration::from_secs(config.presence.reaper_interval_secs),
        chrono::Duration::seconds(config.presence.heartbeat_timeout_secs),
    );

    let app_state = Arc::new(AppState {
        coordinator,
        public_url: config.server.public_url.clone(),
    });

    let app = build_router(app_state);

    info!("Rostrum server starting - Web: {}", config.server.web_address);

    let listener = tokio::net::TcpListener::bind(&config.server.web_address)
        .await
        .expect("failed to bind web listener");

    axum::serve(listener, app)
        .await
        .expect("server error");
}
