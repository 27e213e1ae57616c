use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};

use super::app_state::AppState;
use super::rest_api;

/// Build the axum router with all HTTP routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    // Restrict CORS to the configured public_url origin (or allow any for localhost dev)
    let public_url = &state.public_url;
    let cors = if public_url.contains("localhost") || public_url.contains("127.0.0.1") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origin = public_url
            .parse::<HeaderValue>()
            .unwrap_or_else(|_| HeaderValue::from_static("https://localhost"));
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .route(
            "/api/rooms",
            axum::routing::get(rest_api::list_rooms).post(rest_api::create_room),
        )
        .route("/api/rooms/{id}", axum::routing::get(rest_api::get_room))
        .route(
            "/api/rooms/{id}/join",
            axum::routing::post(rest_api::join_room),
        )
        .route(
            "/api/rooms/{id}/leave",
            axum::routing::post(rest_api::leave_room),
        )
        .route(
            "/api/rooms/{id}/heartbeat",
            axum::routing::post(rest_api::heartbeat),
        )
        .route(
            "/api/rooms/{id}/messages",
            axum::routing::post(rest_api::post_message),
        )
        .layer(cors)
        .with_state(state)
}
