use crate::engine::coordinator::Coordinator;

/// Shared state for the web server.
pub struct AppState {
    pub coordinator: Coordinator,
    /// Configured public origin, used to scope CORS.
    pub public_url: String,
}
